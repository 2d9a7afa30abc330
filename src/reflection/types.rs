//! Declared types: named, union and intersection.

use super::{ClassHandle, ReflectionClass};
use crate::error::{ReflectionError, Result};
use crate::parser::ast::TypeNode;
use crate::reflector::Reflector;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum ReflectionType {
    Named(ReflectionNamedType),
    Union(ReflectionUnionType),
    Intersection(ReflectionIntersectionType),
}

#[derive(Debug, Clone)]
pub struct ReflectionNamedType {
    name: String,
    builtin: bool,
    allows_null: bool,
    reflector: Reflector,
    owner: Option<ClassHandle>,
}

/// Members are named types or, for DNF types, intersections.
#[derive(Debug, Clone)]
pub struct ReflectionUnionType {
    types: Vec<ReflectionType>,
}

#[derive(Debug, Clone)]
pub struct ReflectionIntersectionType {
    types: Vec<ReflectionNamedType>,
}

impl ReflectionType {
    /// Builds the canonical type for a declared type node.
    ///
    /// `?T` and a forced-nullable `T` become the union `T|null`; a union that
    /// lacks `null` gets it appended when nullability is forced. Intersections
    /// nested inside a union (DNF types) stay intersection members.
    pub fn create_from_node(
        reflector: &Reflector,
        owner: Option<&ClassHandle>,
        node: &TypeNode,
        force_nullable: bool,
    ) -> ReflectionType {
        let named = |name: &crate::parser::ast::Name, builtin: bool| {
            ReflectionNamedType::new(reflector, owner, type_name(name, builtin), builtin, false)
        };
        match node {
            TypeNode::Nullable { inner, .. } => {
                Self::create_from_node(reflector, owner, inner, true)
            }
            TypeNode::Named { name, builtin } => {
                let ty = named(name, *builtin);
                if force_nullable && !ty.is_null() && !ty.is_mixed() {
                    ReflectionType::Union(ReflectionUnionType {
                        types: vec![
                            ReflectionType::Named(ty),
                            ReflectionType::Named(ReflectionNamedType::null(reflector)),
                        ],
                    })
                } else {
                    ReflectionType::Named(ty)
                }
            }
            TypeNode::Intersection { types, .. } => {
                ReflectionType::Intersection(ReflectionIntersectionType {
                    types: flatten_named(types, &named),
                })
            }
            TypeNode::Union { types, .. } => {
                let mut members = union_members(types, &named);
                if force_nullable && !members.iter().any(ReflectionType::is_null) {
                    members.push(ReflectionType::Named(ReflectionNamedType::null(reflector)));
                }
                ReflectionType::Union(ReflectionUnionType { types: members })
            }
        }
    }

    pub fn allows_null(&self) -> bool {
        match self {
            ReflectionType::Named(named) => named.allows_null(),
            ReflectionType::Union(union) => union.allows_null(),
            ReflectionType::Intersection(_) => false,
        }
    }

    pub fn as_named(&self) -> Option<&ReflectionNamedType> {
        match self {
            ReflectionType::Named(named) => Some(named),
            _ => None,
        }
    }

    /// Every named type in this type, in declaration order, including the
    /// members of nested intersections.
    pub fn named_types(&self) -> Vec<&ReflectionNamedType> {
        match self {
            ReflectionType::Named(named) => vec![named],
            ReflectionType::Union(union) => {
                union.types.iter().flat_map(ReflectionType::named_types).collect()
            }
            ReflectionType::Intersection(intersection) => intersection.types.iter().collect(),
        }
    }

    fn is_null(&self) -> bool {
        self.as_named().is_some_and(ReflectionNamedType::is_null)
    }
}

/// Presentation form of a type: a union of exactly one type and `null`
/// becomes that single named type with null allowed, so `?T` and `T|null`
/// read the same. Every other type is returned unchanged.
pub fn collapse_nullable(ty: ReflectionType) -> ReflectionType {
    if let ReflectionType::Union(union) = &ty
        && union.types.len() == 2
        && let Some(null_at) = union.types.iter().position(ReflectionType::is_null)
        && let ReflectionType::Named(single) = &union.types[1 - null_at]
        && !single.is_null()
    {
        let mut single = single.clone();
        single.allows_null = true;
        return ReflectionType::Named(single);
    }
    ty
}

fn type_name(name: &crate::parser::ast::Name, builtin: bool) -> String {
    if builtin || name.is_special() {
        name.lowercase_resolved()
    } else {
        name.resolved.clone()
    }
}

fn flatten_named(
    nodes: &[TypeNode],
    named: &impl Fn(&crate::parser::ast::Name, bool) -> ReflectionNamedType,
) -> Vec<ReflectionNamedType> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            TypeNode::Named { name, builtin } => out.push(named(name, *builtin)),
            TypeNode::Nullable { inner, .. } => {
                out.extend(flatten_named(std::slice::from_ref(inner.as_ref()), named));
            }
            TypeNode::Union { types, .. } | TypeNode::Intersection { types, .. } => {
                out.extend(flatten_named(types, named));
            }
        }
    }
    out
}

/// Members of a union. Nested unions are merged; intersections are kept
/// whole so `(A&B)|C` does not widen to `A|B|C`.
fn union_members(
    nodes: &[TypeNode],
    named: &impl Fn(&crate::parser::ast::Name, bool) -> ReflectionNamedType,
) -> Vec<ReflectionType> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            TypeNode::Named { name, builtin } => {
                out.push(ReflectionType::Named(named(name, *builtin)));
            }
            TypeNode::Nullable { inner, .. } => {
                out.extend(union_members(std::slice::from_ref(inner.as_ref()), named));
            }
            TypeNode::Union { types, .. } => out.extend(union_members(types, named)),
            TypeNode::Intersection { types, .. } => {
                out.push(ReflectionType::Intersection(ReflectionIntersectionType {
                    types: flatten_named(types, named),
                }));
            }
        }
    }
    out
}

impl ReflectionNamedType {
    fn new(
        reflector: &Reflector,
        owner: Option<&ClassHandle>,
        name: String,
        builtin: bool,
        allows_null: bool,
    ) -> Self {
        Self {
            name,
            builtin,
            allows_null,
            reflector: reflector.clone(),
            owner: owner.cloned(),
        }
    }

    fn null(reflector: &Reflector) -> Self {
        Self::new(reflector, None, "null".to_string(), true, false)
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// `static` counts as builtin; `self` and `parent` do not.
    pub fn is_builtin(&self) -> bool {
        self.builtin || self.name == "static"
    }

    pub fn allows_null(&self) -> bool {
        self.allows_null || self.is_null() || self.is_mixed()
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim_start_matches('\\'))
    }

    fn is_null(&self) -> bool {
        self.name.eq_ignore_ascii_case("null")
    }

    fn is_mixed(&self) -> bool {
        self.name.eq_ignore_ascii_case("mixed")
    }

    /// The class this type refers to. `self` and `static` resolve to the
    /// owning class, `parent` to its parent.
    pub fn get_class(&self) -> Result<Rc<ReflectionClass>> {
        let owner = || {
            self.owner.as_ref().ok_or_else(|| {
                ReflectionError::InvalidStructure(format!(
                    "type \"{}\" is used outside of a class",
                    self.name
                ))
            })
        };
        match self.name.as_str() {
            "self" | "static" => owner()?.resolve(&self.reflector),
            "parent" => owner()?
                .resolve(&self.reflector)?
                .get_parent_class()?
                .ok_or_else(|| {
                    ReflectionError::InvalidStructure(
                        "type \"parent\" is used in a class without a parent".to_string(),
                    )
                }),
            _ if self.builtin => Err(ReflectionError::InvalidStructure(format!(
                "builtin type \"{}\" does not refer to a class",
                self.name
            ))),
            _ => self.reflector.reflect_class(&self.name),
        }
    }
}

impl ReflectionUnionType {
    pub fn get_types(&self) -> &[ReflectionType] {
        &self.types
    }

    pub fn allows_null(&self) -> bool {
        self.types.iter().any(ReflectionType::is_null)
    }
}

impl ReflectionIntersectionType {
    pub fn get_types(&self) -> &[ReflectionNamedType] {
        &self.types
    }
}

impl fmt::Display for ReflectionNamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.allows_null && !self.is_null() && !self.is_mixed() {
            write!(f, "?{}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, types: &[ReflectionNamedType], separator: &str) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        f.write_str(&ty.name)?;
    }
    Ok(())
}

impl fmt::Display for ReflectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectionType::Named(named) => named.fmt(f),
            ReflectionType::Union(union) => {
                for (i, member) in union.types.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    if let ReflectionType::Intersection(intersection) = member {
                        f.write_str("(")?;
                        join(f, &intersection.types, "&")?;
                        f.write_str(")")?;
                    } else {
                        member.fmt(f)?;
                    }
                }
                Ok(())
            }
            ReflectionType::Intersection(intersection) => join(f, &intersection.types, "&"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{ClassMember, Stmt};
    use crate::parser::parse;

    fn param_types(signature: &str) -> Vec<TypeNode> {
        let program = parse(format!("<?php class X {{ function f({signature}) {{}} }}").as_bytes());
        let mut types = Vec::new();
        program.for_each_statement(|stmt| {
            if let Stmt::ClassLike(class) = stmt
                && let Some(ClassMember::Method(method)) = class.members.first()
            {
                types.extend(method.params.iter().filter_map(|p| p.ty.clone()));
            }
        });
        types
    }

    #[test]
    fn test_nullable_and_null_union_read_the_same() {
        let reflector = Reflector::for_source("<?php");
        let types = param_types("?Foo $a, Foo|null $b");
        let a = ReflectionType::create_from_node(&reflector, None, &types[0], false);
        let b = ReflectionType::create_from_node(&reflector, None, &types[1], false);
        assert!(matches!(a, ReflectionType::Union(_)));
        assert!(a.allows_null() && b.allows_null());

        let a = collapse_nullable(a);
        let b = collapse_nullable(b);
        let (Some(a), Some(b)) = (a.as_named(), b.as_named()) else {
            panic!("expected collapsed named types");
        };
        assert_eq!(a.get_name(), "Foo");
        assert_eq!(b.get_name(), "Foo");
        assert_eq!(a.to_string(), "?Foo");
    }

    #[test]
    fn test_allows_null_rules() {
        let reflector = Reflector::for_source("<?php");
        let types = param_types("mixed $a, int $b, A&B $c, int|string $d, null $e");
        let built: Vec<_> = types
            .iter()
            .map(|t| ReflectionType::create_from_node(&reflector, None, t, false))
            .collect();
        assert!(built[0].allows_null());
        assert!(!built[1].allows_null());
        assert!(!built[2].allows_null());
        assert!(!built[3].allows_null());
        assert!(built[4].allows_null());
        assert_eq!(built[2].to_string(), "A&B");
        assert_eq!(built[3].to_string(), "int|string");
    }

    #[test]
    fn test_forced_nullability() {
        let reflector = Reflector::for_source("<?php");
        let types = param_types("int|string $a, mixed $b");
        let union = ReflectionType::create_from_node(&reflector, None, &types[0], true);
        assert_eq!(union.to_string(), "int|string|null");
        let mixed = ReflectionType::create_from_node(&reflector, None, &types[1], true);
        assert!(matches!(mixed, ReflectionType::Named(_)));
    }

    #[test]
    fn test_dnf_keeps_intersection_members() {
        let reflector = Reflector::for_source("<?php");
        let types = param_types("(A&B)|null $a, (A&B)|C $b");
        let a = ReflectionType::create_from_node(&reflector, None, &types[0], false);
        let b = ReflectionType::create_from_node(&reflector, None, &types[1], false);

        assert_eq!(a.to_string(), "(A&B)|null");
        assert!(a.allows_null());
        let a = collapse_nullable(a);
        assert!(a.as_named().is_none());
        assert_eq!(a.to_string(), "(A&B)|null");

        assert_eq!(b.to_string(), "(A&B)|C");
        assert!(!b.allows_null());
        let ReflectionType::Union(union) = &b else {
            panic!("expected a union");
        };
        assert!(matches!(union.get_types()[0], ReflectionType::Intersection(_)));
        assert!(matches!(union.get_types()[1], ReflectionType::Named(_)));
        let names: Vec<_> = b.named_types().iter().map(|t| t.get_name()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
