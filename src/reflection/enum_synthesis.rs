//! Members the engine provides to enums and the enum marker interfaces.
//!
//! They are declared as PHP source and parsed like any other declaration so
//! that they reflect with the same node shapes as user code.

use crate::locator::LocatedSource;
use crate::parser::ast::{ClassMember, FunctionDecl, PropertyDecl, Stmt};
use std::rc::Rc;

pub(crate) struct SyntheticMembers {
    pub source: Rc<LocatedSource>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub properties: Vec<Rc<PropertyDecl>>,
}

/// `cases()` and `$name` for every enum; `from()`, `tryFrom()` and `$value`
/// for backed ones, with `$value` typed as the backing type.
pub(crate) fn for_enum(backing_type: Option<&str>) -> SyntheticMembers {
    let mut body = String::from("    public readonly string $name;\n");
    if let Some(backing_type) = backing_type {
        body.push_str(&format!("    public readonly {backing_type} $value;\n"));
    }
    body.push_str("    public static function cases(): array {}\n");
    if backing_type.is_some() {
        body.push_str("    public static function from(int|string $value): static {}\n");
        body.push_str("    public static function tryFrom(int|string $value): ?static {}\n");
    }
    synthesize(&body)
}

/// Properties that `UnitEnum` and `BackedEnum` themselves expose.
pub(crate) fn for_marker_interface(name: &str) -> Option<SyntheticMembers> {
    if name.eq_ignore_ascii_case("UnitEnum") {
        Some(synthesize("    public readonly string $name;\n"))
    } else if name.eq_ignore_ascii_case("BackedEnum") {
        Some(synthesize("    public readonly int|string $value;\n"))
    } else {
        None
    }
}

fn synthesize(body: &str) -> SyntheticMembers {
    let source = Rc::new(LocatedSource::internal(
        format!("<?php\nfinal class EnumMembers {{\n{body}}}\n"),
        Some("Core".to_string()),
        None,
    ));
    let program = source.program();
    let mut methods = Vec::new();
    let mut properties = Vec::new();
    program.for_each_statement(|stmt| {
        let Stmt::ClassLike(class) = stmt else {
            return;
        };
        for member in &class.members {
            match member {
                ClassMember::Method(method) => methods.push(method.clone()),
                ClassMember::Property(property) => properties.push(property.clone()),
                _ => {}
            }
        }
    });
    SyntheticMembers {
        source,
        methods,
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method_names(members: &SyntheticMembers) -> Vec<String> {
        members
            .methods
            .iter()
            .filter_map(|m| m.name.as_ref().map(|n| n.name.clone()))
            .collect()
    }

    #[test]
    fn test_pure_enum_members() {
        let members = for_enum(None);
        assert_eq!(method_names(&members), vec!["cases"]);
        assert_eq!(members.properties.len(), 1);
        assert_eq!(members.properties[0].entries[0].name.name, "name");
        assert!(members.source.is_internal());
    }

    #[test]
    fn test_backed_enum_members() {
        let members = for_enum(Some("string"));
        assert_eq!(method_names(&members), vec!["cases", "from", "tryFrom"]);
        let names: Vec<_> = members
            .properties
            .iter()
            .map(|p| p.entries[0].name.name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "value"]);
    }

    #[test]
    fn test_marker_interfaces() {
        assert!(for_marker_interface("unitenum").is_some());
        let backed = for_marker_interface("BackedEnum").expect("BackedEnum members");
        assert_eq!(backed.properties[0].entries[0].name.name, "value");
        assert!(for_marker_interface("Countable").is_none());
    }
}
