//! Source text for engine-provided symbols.
//!
//! Stubs are ordinary PHP declarations with empty bodies. They are parsed by
//! the same parser as user code and reflected as internal symbols.

use crate::identifier::{Identifier, IdentifierType};
use crate::locator::ast::declarations_of_type;
use crate::parser::parse;
use std::borrow::Cow;
use std::cell::OnceCell;
use std::collections::HashMap;

/// Stub source declaring a requested symbol.
///
/// Bundled stubs borrow their text; providers that read stubs at runtime
/// hand out owned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubData {
    pub stub: Cow<'static, str>,
    pub extension_name: Option<String>,
    pub file_name: Option<String>,
}

pub trait StubProvider {
    fn stub_for(&self, kind: IdentifierType, name: &str) -> Option<StubData>;

    /// Every name of `kind` this provider knows, in declaration order.
    fn names(&self, kind: IdentifierType) -> Vec<String>;
}

struct StubFile {
    extension: &'static str,
    file_name: &'static str,
    source: &'static str,
}

const STUB_FILES: &[StubFile] = &[
    StubFile {
        extension: "Core",
        file_name: "Core.php",
        source: include_str!("php/Core.php"),
    },
    StubFile {
        extension: "standard",
        file_name: "standard.php",
        source: include_str!("php/standard.php"),
    },
    StubFile {
        extension: "SPL",
        file_name: "SPL.php",
        source: include_str!("php/SPL.php"),
    },
    StubFile {
        extension: "json",
        file_name: "json.php",
        source: include_str!("php/json.php"),
    },
];

#[derive(Default)]
struct StubIndex {
    /// (kind, lookup key) -> index into `STUB_FILES`.
    files: HashMap<(IdentifierType, String), usize>,
    names: HashMap<IdentifierType, Vec<String>>,
}

/// Stubs for the handful of extensions bundled with the crate.
#[derive(Default)]
pub struct BuiltinStubProvider {
    index: OnceCell<StubIndex>,
}

impl BuiltinStubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self) -> &StubIndex {
        self.index.get_or_init(|| {
            let mut index = StubIndex::default();
            for (position, file) in STUB_FILES.iter().enumerate() {
                let program = parse(file.source.as_bytes());
                for kind in [
                    IdentifierType::Class,
                    IdentifierType::Function,
                    IdentifierType::Constant,
                ] {
                    for node in declarations_of_type(&program, kind) {
                        let Some(name) = node.declared_name() else {
                            continue;
                        };
                        let key = Identifier::new(&name, kind).lookup_key();
                        if index.files.insert((kind, key), position).is_none() {
                            index.names.entry(kind).or_default().push(name);
                        }
                    }
                }
            }
            tracing::debug!(entries = index.files.len(), "indexed builtin stubs");
            index
        })
    }
}

impl StubProvider for BuiltinStubProvider {
    fn stub_for(&self, kind: IdentifierType, name: &str) -> Option<StubData> {
        let key = Identifier::new(name, kind).lookup_key();
        let file = &STUB_FILES[*self.index().files.get(&(kind, key))?];
        Some(StubData {
            stub: Cow::Borrowed(file.source),
            extension_name: Some(file.extension.to_string()),
            file_name: Some(file.file_name.to_string()),
        })
    }

    fn names(&self, kind: IdentifierType) -> Vec<String> {
        self.index().names.get(&kind).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_lookup_is_case_insensitive_for_classes() {
        let provider = BuiltinStubProvider::new();
        let stub = provider
            .stub_for(IdentifierType::Class, "\\stringable")
            .expect("Stringable stub");
        assert_eq!(stub.extension_name.as_deref(), Some("Core"));
        assert!(matches!(stub.stub, Cow::Borrowed(_)));
        assert!(stub.stub.contains("interface Stringable"));
        assert_eq!(
            provider
                .stub_for(IdentifierType::Class, "JsonSerializable")
                .and_then(|s| s.extension_name),
            Some("json".to_string())
        );
        assert!(provider.stub_for(IdentifierType::Class, "NoSuchClass").is_none());
    }

    #[test]
    fn test_functions_are_indexed() {
        let provider = BuiltinStubProvider::new();
        assert!(provider.stub_for(IdentifierType::Function, "STRLEN").is_some());
        assert!(provider.names(IdentifierType::Function).contains(&"count".to_string()));
        assert!(provider.names(IdentifierType::Class).contains(&"BackedEnum".to_string()));
    }
}
