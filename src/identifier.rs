use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IdentifierType {
    Class,
    Function,
    Constant,
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentifierType::Class => "Class",
            IdentifierType::Function => "Function",
            IdentifierType::Constant => "Constant",
        })
    }
}

/// What reflection is being requested: a symbol kind plus its
/// fully-qualified name, without any leading backslash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identifier {
    name: String,
    kind: IdentifierType,
}

impl Identifier {
    pub fn new(name: &str, kind: IdentifierType) -> Self {
        Self {
            name: name.trim_start_matches('\\').to_string(),
            kind,
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, IdentifierType::Class)
    }

    pub fn function(name: &str) -> Self {
        Self::new(name, IdentifierType::Function)
    }

    pub fn constant(name: &str) -> Self {
        Self::new(name, IdentifierType::Constant)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IdentifierType {
        self.kind
    }

    pub fn is_class(&self) -> bool {
        self.kind == IdentifierType::Class
    }

    pub fn is_function(&self) -> bool {
        self.kind == IdentifierType::Function
    }

    pub fn is_constant(&self) -> bool {
        self.kind == IdentifierType::Constant
    }

    /// Key under which two identifiers denote the same symbol.
    ///
    /// Classes and functions compare case-insensitively. Constants keep a
    /// case-sensitive short name but a case-insensitive namespace.
    pub fn lookup_key(&self) -> String {
        match self.kind {
            IdentifierType::Class | IdentifierType::Function => self.name.to_ascii_lowercase(),
            IdentifierType::Constant => normalize_constant_name(&self.name),
        }
    }

    /// Whether a declared fully-qualified name refers to this identifier.
    pub fn matches(&self, declared: &str) -> bool {
        let declared = declared.trim_start_matches('\\');
        match self.kind {
            IdentifierType::Class | IdentifierType::Function => {
                declared.eq_ignore_ascii_case(&self.name)
            }
            IdentifierType::Constant => normalize_constant_name(declared) == self.lookup_key(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

pub fn normalize_constant_name(name: &str) -> String {
    let name = name.trim_start_matches('\\');
    match name.rsplit_once('\\') {
        Some((namespace, short)) => format!("{}\\{short}", namespace.to_ascii_lowercase()),
        None => name.to_string(),
    }
}

/// Splits `A\B\C` into (`Some("A\B")`, `"C"`).
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.trim_start_matches('\\').rsplit_once('\\') {
        Some((namespace, short)) => (Some(namespace), short),
        None => (None, name.trim_start_matches('\\')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_identity_is_case_insensitive() {
        let id = Identifier::class("\\App\\Foo");
        assert_eq!(id.name(), "App\\Foo");
        assert!(id.matches("app\\FOO"));
        assert_eq!(id.lookup_key(), Identifier::class("APP\\foo").lookup_key());
    }

    #[test]
    fn test_constant_identity_keeps_short_name_case() {
        let id = Identifier::constant("App\\LIMIT");
        assert!(id.matches("APP\\LIMIT"));
        assert!(!id.matches("App\\limit"));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("A\\B\\C"), (Some("A\\B"), "C"));
        assert_eq!(split_name("\\C"), (None, "C"));
    }
}
