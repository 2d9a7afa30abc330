//! Reflection objects built from declarations.
//!
//! Objects are shared through `Rc` and compute every derived table at most
//! once. Cross-references between classes go by name through the
//! [`Reflector`]; a member keeps only a weak pointer to its class so that
//! class tables and their members never form a reference cycle.

pub mod attribute;
pub mod class;
pub mod class_constant;
pub mod constant;
pub mod enum_case;
mod enum_synthesis;
pub mod function;
pub mod method;
pub mod modifiers;
pub mod parameter;
pub mod property;
pub mod trait_adaptations;
pub mod types;

pub use attribute::{ArgumentKey, AttributeTarget, ReflectionAttribute};
pub use class::ReflectionClass;
pub use class_constant::ReflectionClassConstant;
pub use constant::ReflectionConstant;
pub use enum_case::ReflectionEnumCase;
pub use function::{FunctionLike, ReflectionFunction, ReflectionFunctionAbstract};
pub use method::ReflectionMethod;
pub use modifiers::{ClassModifiers, MemberModifiers};
pub use parameter::ReflectionParameter;
pub use property::ReflectionProperty;
pub use types::ReflectionType;

use crate::error::{ReflectionError, Result};
use crate::reflector::Reflector;
use std::cell::OnceCell;
use std::rc::{Rc, Weak};

/// Names a class and, while it is alive, points at its reflection.
#[derive(Debug, Clone)]
pub struct ClassHandle {
    name: String,
    class: Weak<ReflectionClass>,
}

impl ClassHandle {
    pub(crate) fn new(name: impl Into<String>, class: Weak<ReflectionClass>) -> Self {
        Self {
            name: name.into(),
            class,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The reflection this handle was created from, or a fresh one looked up
    /// by name once that has been dropped.
    pub fn resolve(&self, reflector: &Reflector) -> Result<Rc<ReflectionClass>> {
        match self.class.upgrade() {
            Some(class) => Ok(class),
            None => reflector.reflect_class(&self.name),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Memoizes a fallible computation that may recurse into other reflections.
///
/// The computation runs outside the cell under a resolving guard keyed by
/// `(purpose, name)`, so a cycle surfaces as an error instead of recursing
/// forever or re-entering the cell.
pub(crate) fn guarded_memo<T: Clone>(
    reflector: &Reflector,
    cell: &OnceCell<Result<T>>,
    purpose: &'static str,
    name: &str,
    compute: impl FnOnce() -> Result<T>,
) -> Result<T> {
    if let Some(value) = cell.get() {
        return value.clone();
    }
    let result = {
        let _guard = reflector.enter(purpose, name)?;
        compute()
    };
    cell.get_or_init(|| result).clone()
}

/// Like [`guarded_memo`] for constant initializers: re-entering the same
/// constant is a compile error rather than a circular reference.
pub(crate) fn constant_memo<T: Clone>(
    reflector: &Reflector,
    cell: &OnceCell<Result<T>>,
    purpose: &'static str,
    name: &str,
    compute: impl FnOnce() -> Result<T>,
) -> Result<T> {
    if let Some(value) = cell.get() {
        return value.clone();
    }
    let result = {
        let _guard = reflector
            .enter(purpose, name)
            .map_err(ReflectionError::into_compile_error)?;
        compute()
    };
    cell.get_or_init(|| result).clone()
}

/// Whether a doc comment carries the `@deprecated` tag.
pub(crate) fn doc_is_deprecated(doc: Option<&str>) -> bool {
    doc.is_some_and(|doc| {
        doc.lines().any(|line| {
            line.trim_start_matches([' ', '\t', '*', '/'])
                .starts_with("@deprecated")
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deprecated_tag() {
        assert!(doc_is_deprecated(Some("/**\n * @deprecated since 2.0\n */")));
        assert!(!doc_is_deprecated(Some("/** not @deprecated here */")));
        assert!(!doc_is_deprecated(None));
    }
}
