//! Common test helpers for reflection tests
//!
//! Builds reflectors over literal PHP code, plus a locator that counts how
//! often it is asked to find something.

#![allow(dead_code)]

use php_reflector::identifier::{Identifier, IdentifierType};
use php_reflector::locator::{
    AggregateSourceLocator, LocatedSource, PhpInternalSourceLocator, SourceLocator,
    StringSourceLocator,
};
use php_reflector::reflection::ReflectionClass;
use php_reflector::{Reflector, ReflectorConfig, Result};
use std::cell::Cell;
use std::rc::Rc;

/// Reflector over `code` plus the built-in stubs.
///
/// Code must contain the full `<?php` opening tag.
pub fn reflector_for(code: &str) -> Reflector {
    Reflector::for_source(code)
}

/// Like [`reflector_for`], modelling a specific `PHP_VERSION_ID`.
pub fn reflector_for_version(code: &str, php_version_id: u32) -> Reflector {
    let locator = AggregateSourceLocator::new(vec![
        Rc::new(StringSourceLocator::new(code)),
        Rc::new(PhpInternalSourceLocator::default()),
    ]);
    Reflector::with_config(Rc::new(locator), ReflectorConfig { php_version_id })
}

/// Reflects `name` from `code`, panicking if it cannot be found.
pub fn class(code: &str, name: &str) -> Rc<ReflectionClass> {
    reflector_for(code)
        .reflect_class(name)
        .unwrap_or_else(|err| panic!("reflect {name}: {err}"))
}

/// Names of `items`, in order.
pub fn names<T>(items: &[Rc<T>], name: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|item| name(item).to_string()).collect()
}

/// Wraps a [`StringSourceLocator`] and counts lookups.
pub struct CountingLocator {
    inner: StringSourceLocator,
    lookups: Cell<usize>,
}

impl CountingLocator {
    pub fn new(code: &str) -> Self {
        Self {
            inner: StringSourceLocator::new(code),
            lookups: Cell::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl SourceLocator for CountingLocator {
    fn locate_identifier(
        &self,
        reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.locate_identifier(reflector, identifier)
    }

    fn locate_identifiers_by_type(
        &self,
        reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.locate_identifiers_by_type(reflector, kind)
    }
}

/// A reflector over `code` whose lookups are counted, without the stubs.
pub fn counting_reflector(code: &str) -> (Reflector, Rc<CountingLocator>) {
    let locator = Rc::new(CountingLocator::new(code));
    let reflector = Reflector::new(locator.clone());
    (reflector, locator)
}
