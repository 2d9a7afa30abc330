use crate::identifier::IdentifierType;
use std::path::Path;
use thiserror::Error;

/// Failures surfaced by the reflection engine.
///
/// The type is `Clone` so a memoized failure can be handed out again on every
/// later access to the same accessor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReflectionError {
    #[error("{kind} \"{name}\" could not be found in the located source")]
    IdentifierNotFound { kind: IdentifierType, name: String },
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
    #[error("Unable to compile expression: {message}{}", location_suffix(.file, .line))]
    UnableToCompile {
        message: String,
        file: Option<String>,
        line: Option<usize>,
    },
    #[error("Circular reference detected: {}", .chain.join(" -> "))]
    CircularReference { chain: Vec<String> },
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("Trying to clone an uncloneable object of class {0}")]
    Uncloneable(String),
    #[error("Property {class}::${property} does not exist")]
    PropertyDoesNotExist { class: String, property: String },
    #[error("Method {class}::{method}() does not exist")]
    MethodDoesNotExist { class: String, method: String },
    #[error("Method {class}::{method}() does not have a prototype")]
    MethodPrototypeNotFound { class: String, method: String },
    #[error("Property {class}::${property} is not accessible")]
    PropertyNotAccessible { class: String, property: String },
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },
}

fn location_suffix(file: &Option<String>, line: &Option<usize>) -> String {
    match (file, line) {
        (Some(file), Some(line)) => format!(" in {file} on line {line}"),
        (Some(file), None) => format!(" in {file}"),
        (None, Some(line)) => format!(" on line {line}"),
        (None, None) => String::new(),
    }
}

impl ReflectionError {
    pub fn not_found(kind: IdentifierType, name: impl Into<String>) -> Self {
        ReflectionError::IdentifierNotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn not_a_class(name: &str) -> Self {
        ReflectionError::InvalidStructure(format!("\"{name}\" is not a class"))
    }

    pub fn not_an_interface(name: &str) -> Self {
        ReflectionError::InvalidStructure(format!("\"{name}\" is not an interface"))
    }

    pub fn not_a_trait(name: &str) -> Self {
        ReflectionError::InvalidStructure(format!("\"{name}\" is not a trait"))
    }

    pub fn invalid_constant_declaration() -> Self {
        ReflectionError::InvalidStructure("invalid constant declaration".to_string())
    }

    pub fn unable_to_compile(
        message: impl Into<String>,
        file: Option<&str>,
        line: Option<usize>,
    ) -> Self {
        ReflectionError::UnableToCompile {
            message: message.into(),
            file: file.map(str::to_string),
            line,
        }
    }

    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        ReflectionError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// A cycle between constant initializers cannot be compiled; every other
    /// error is returned unchanged.
    pub fn into_compile_error(self) -> Self {
        match self {
            ReflectionError::CircularReference { chain } => ReflectionError::UnableToCompile {
                message: format!("Recursive constant reference: {}", chain.join(" -> ")),
                file: None,
                line: None,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReflectionError::IdentifierNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReflectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ReflectionError::not_found(IdentifierType::Class, "Foo");
        assert_eq!(
            err.to_string(),
            "Class \"Foo\" could not be found in the located source"
        );

        let err = ReflectionError::unable_to_compile("Undefined constant FOO", Some("a.php"), Some(3));
        assert_eq!(
            err.to_string(),
            "Unable to compile expression: Undefined constant FOO in a.php on line 3"
        );

        let err = ReflectionError::CircularReference {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Circular reference detected: A -> B -> A");
    }
}
