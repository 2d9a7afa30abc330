//! Entry point: turns names into reflections through a source locator.

use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType, normalize_constant_name};
use crate::locator::ast::{declarations_of_type, find_declaration};
use crate::locator::{
    AggregateSourceLocator, LocatedSource, PhpInternalSourceLocator, SourceLocator,
    StringSourceLocator,
};
use crate::materializer::{Reflection, materialize};
use crate::reflection::function::ReflectionFunctionAbstract;
use crate::reflection::{ReflectionClass, ReflectionConstant, ReflectionFunction};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Settings that model the PHP engine being reflected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectorConfig {
    /// `PHP_VERSION_ID` of the modelled engine, e.g. `80300` for 8.3.0.
    pub php_version_id: u32,
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            php_version_id: 80300,
        }
    }
}

impl ReflectorConfig {
    pub fn major(&self) -> u32 {
        self.php_version_id / 10000
    }

    pub fn minor(&self) -> u32 {
        self.php_version_id / 100 % 100
    }

    pub fn release(&self) -> u32 {
        self.php_version_id % 100
    }

    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.major(), self.minor(), self.release())
    }
}

struct Inner {
    locator: Rc<dyn SourceLocator>,
    config: ReflectorConfig,
    /// `(purpose, name)` of every computation currently in progress.
    resolving: RefCell<Vec<(&'static str, String)>>,
}

/// Resolves classes, functions and constants by name.
///
/// Cloning is cheap; clones share the locator and the in-progress stack that
/// detects cycles. Reflections are not cached here: each lookup parses (or
/// reuses a locator's cached source) and builds fresh objects.
#[derive(Clone)]
pub struct Reflector {
    inner: Rc<Inner>,
}

impl fmt::Debug for Reflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Pops its entry off the in-progress stack when dropped.
pub(crate) struct ResolvingGuard {
    reflector: Reflector,
}

impl std::fmt::Debug for ResolvingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvingGuard").finish_non_exhaustive()
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        self.reflector.inner.resolving.borrow_mut().pop();
    }
}

/// Whether two in-progress names denote the same symbol for `purpose`.
///
/// Class names ignore case. Constant short names and class constant
/// member names do not.
fn same_key(purpose: &str, a: &str, b: &str) -> bool {
    match purpose {
        "constant" => normalize_constant_name(a) == normalize_constant_name(b),
        "class constant" | "enum case" => match (a.rsplit_once("::"), b.rsplit_once("::")) {
            (Some((class_a, member_a)), Some((class_b, member_b))) => {
                class_a.eq_ignore_ascii_case(class_b) && member_a == member_b
            }
            _ => a == b,
        },
        _ => a.eq_ignore_ascii_case(b),
    }
}

impl Reflector {
    pub fn new(locator: Rc<dyn SourceLocator>) -> Self {
        Self::with_config(locator, ReflectorConfig::default())
    }

    pub fn with_config(locator: Rc<dyn SourceLocator>, config: ReflectorConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                locator,
                config,
                resolving: RefCell::new(Vec::new()),
            }),
        }
    }

    /// A reflector over one piece of code plus the built-in stubs.
    pub fn for_source(code: &str) -> Self {
        let locator = AggregateSourceLocator::new(vec![
            Rc::new(StringSourceLocator::new(code)),
            Rc::new(PhpInternalSourceLocator::default()),
        ]);
        Self::new(Rc::new(locator))
    }

    pub fn config(&self) -> &ReflectorConfig {
        &self.inner.config
    }

    pub fn locator(&self) -> &Rc<dyn SourceLocator> {
        &self.inner.locator
    }

    /// Marks `(purpose, name)` as in progress until the guard drops. Entering
    /// a pair that is already in progress is a cycle.
    pub(crate) fn enter(&self, purpose: &'static str, name: &str) -> Result<ResolvingGuard> {
        let mut resolving = self.inner.resolving.borrow_mut();
        if let Some(start) = resolving
            .iter()
            .position(|(p, n)| *p == purpose && same_key(purpose, n, name))
        {
            let mut chain: Vec<String> = resolving[start..]
                .iter()
                .filter(|(p, _)| *p == purpose)
                .map(|(_, n)| n.clone())
                .collect();
            chain.push(name.to_string());
            tracing::debug!(purpose, chain = %chain.join(" -> "), "cycle detected");
            return Err(ReflectionError::CircularReference { chain });
        }
        resolving.push((purpose, name.to_string()));
        Ok(ResolvingGuard {
            reflector: self.clone(),
        })
    }

    fn reflect(&self, identifier: &Identifier) -> Result<Reflection> {
        let Some(source) = self.inner.locator.locate_identifier(self, identifier)? else {
            return Err(ReflectionError::not_found(identifier.kind(), identifier.name()));
        };
        let program = source.program();
        let Some(node) = find_declaration(&program, identifier) else {
            return Err(ReflectionError::not_found(identifier.kind(), identifier.name()));
        };
        tracing::trace!(%identifier, file = source.file_name().unwrap_or("<string>"), "reflecting");
        materialize(self, &node, &source)
    }

    pub fn reflect_class(&self, name: &str) -> Result<Rc<ReflectionClass>> {
        match self.reflect(&Identifier::class(name))? {
            Reflection::Class(class) => Ok(class),
            _ => Err(ReflectionError::not_found(IdentifierType::Class, name)),
        }
    }

    /// Like [`reflect_class`](Self::reflect_class), with "not found" as
    /// `None`.
    pub fn try_reflect_class(&self, name: &str) -> Result<Option<Rc<ReflectionClass>>> {
        match self.reflect_class(name) {
            Ok(class) => Ok(Some(class)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn reflect_function(&self, name: &str) -> Result<Rc<ReflectionFunction>> {
        match self.reflect(&Identifier::function(name))? {
            Reflection::Function(function) => Ok(function),
            _ => Err(ReflectionError::not_found(IdentifierType::Function, name)),
        }
    }

    pub fn reflect_constant(&self, name: &str) -> Result<Rc<ReflectionConstant>> {
        match self.reflect(&Identifier::constant(name))? {
            Reflection::Constant(constant) => Ok(constant),
            _ => Err(ReflectionError::not_found(IdentifierType::Constant, name)),
        }
    }

    /// Every symbol of `kind` the locator can enumerate. When a name is
    /// declared more than once, the first valid declaration found wins.
    /// Malformed `define()` calls are skipped.
    fn reflect_all(&self, kind: IdentifierType) -> Result<Vec<Reflection>> {
        let mut seen: IndexMap<String, Reflection> = IndexMap::new();
        for source in self.inner.locator.locate_identifiers_by_type(self, kind)? {
            let program = source.program();
            for node in declarations_of_type(&program, kind) {
                let Some(name) = node.declared_name() else {
                    continue;
                };
                let key = Identifier::new(&name, kind).lookup_key();
                if seen.contains_key(&key) {
                    continue;
                }
                match materialize(self, &node, &source) {
                    Ok(reflection) => {
                        seen.insert(key, reflection);
                    }
                    Err(err @ ReflectionError::InvalidStructure(_)) => {
                        tracing::warn!(
                            %name,
                            file = source.file_name().unwrap_or("<string>"),
                            error = %err,
                            "skipping invalid declaration"
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(seen.into_values().collect())
    }

    pub fn reflect_all_classes(&self) -> Result<Vec<Rc<ReflectionClass>>> {
        Ok(self
            .reflect_all(IdentifierType::Class)?
            .into_iter()
            .filter_map(|reflection| match reflection {
                Reflection::Class(class) => Some(class),
                _ => None,
            })
            .collect())
    }

    pub fn reflect_all_functions(&self) -> Result<Vec<Rc<ReflectionFunction>>> {
        Ok(self
            .reflect_all(IdentifierType::Function)?
            .into_iter()
            .filter_map(|reflection| match reflection {
                Reflection::Function(function) => Some(function),
                _ => None,
            })
            .collect())
    }

    pub fn reflect_all_constants(&self) -> Result<Vec<Rc<ReflectionConstant>>> {
        Ok(self
            .reflect_all(IdentifierType::Constant)?
            .into_iter()
            .filter_map(|reflection| match reflection {
                Reflection::Constant(constant) => Some(constant),
                _ => None,
            })
            .collect())
    }

    /// The closure or arrow function starting on `line` of `source`.
    pub fn reflect_closure_at_line(
        &self,
        source: &Rc<LocatedSource>,
        line: usize,
    ) -> Result<Rc<ReflectionFunction>> {
        let program = source.program();
        let mut found = program
            .closures
            .iter()
            .filter(|closure| source.lines(closure.span).0 == line);
        let Some(closure) = found.next() else {
            return Err(ReflectionError::not_found(
                IdentifierType::Function,
                format!("{{closure}} on line {line}"),
            ));
        };
        if found.next().is_some() {
            return Err(ReflectionError::InvalidStructure(format!(
                "more than one closure starts on line {line}"
            )));
        }
        let function = ReflectionFunction::new(self, source.clone(), closure.clone());
        tracing::trace!(name = function.get_name(), line, "reflected closure");
        Ok(function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_version_parts() {
        let config = ReflectorConfig {
            php_version_id: 80215,
        };
        assert_eq!(config.major(), 8);
        assert_eq!(config.minor(), 2);
        assert_eq!(config.release(), 15);
        assert_eq!(config.version_string(), "8.2.15");
    }

    #[test]
    fn test_guard_detects_reentry_and_unwinds() {
        let reflector = Reflector::for_source("<?php");
        {
            let _a = reflector.enter("parent", "A").expect("enter A");
            let _b = reflector.enter("parent", "B").expect("enter B");
            let _other = reflector.enter("methods", "A").expect("different purpose");
            let err = reflector.enter("parent", "a").expect_err("cycle");
            assert_eq!(
                err,
                ReflectionError::CircularReference {
                    chain: vec!["A".into(), "B".into(), "a".into()]
                }
            );
        }
        assert!(reflector.enter("parent", "A").is_ok());
    }

    #[test]
    fn test_constant_keys_keep_member_case() {
        let reflector = Reflector::for_source("<?php");
        let _upper = reflector.enter("constant", "App\\LIMIT").expect("enter LIMIT");
        assert!(reflector.enter("constant", "App\\limit").is_ok());
        assert!(reflector.enter("constant", "app\\LIMIT").is_err());

        let _member = reflector.enter("class constant", "C::A").expect("enter C::A");
        assert!(reflector.enter("class constant", "C::a").is_ok());
        assert!(reflector.enter("class constant", "c::A").is_err());
    }

    #[test]
    fn test_not_found_is_recoverable_through_try() {
        let reflector = Reflector::for_source("<?php class Foo {}");
        assert!(reflector.try_reflect_class("Foo").expect("lookup").is_some());
        assert!(reflector.try_reflect_class("Bar").expect("lookup").is_none());
        let err = reflector.reflect_function("bar").expect_err("missing function");
        assert!(err.is_not_found());
    }
}
