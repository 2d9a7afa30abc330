use super::{LocatedSource, SourceLocator};
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::reflector::Reflector;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Caches the answers of an inner locator, misses included.
///
/// Errors are not cached; a failing lookup is retried next time.
pub struct MemoizingSourceLocator {
    inner: Rc<dyn SourceLocator>,
    by_identifier: RefCell<HashMap<(IdentifierType, String), Option<Rc<LocatedSource>>>>,
    by_type: RefCell<HashMap<IdentifierType, Vec<Rc<LocatedSource>>>>,
}

impl MemoizingSourceLocator {
    pub fn new(inner: Rc<dyn SourceLocator>) -> Self {
        Self {
            inner,
            by_identifier: RefCell::new(HashMap::new()),
            by_type: RefCell::new(HashMap::new()),
        }
    }
}

impl SourceLocator for MemoizingSourceLocator {
    fn locate_identifier(
        &self,
        reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        let key = (identifier.kind(), identifier.lookup_key());
        if let Some(cached) = self.by_identifier.borrow().get(&key) {
            return Ok(cached.clone());
        }
        let located = self.inner.locate_identifier(reflector, identifier)?;
        tracing::debug!(%identifier, hit = located.is_some(), "memoized locator lookup");
        self.by_identifier.borrow_mut().insert(key, located.clone());
        Ok(located)
    }

    fn locate_identifiers_by_type(
        &self,
        reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        if let Some(cached) = self.by_type.borrow().get(&kind) {
            return Ok(cached.clone());
        }
        let located = self.inner.locate_identifiers_by_type(reflector, kind)?;
        self.by_type.borrow_mut().insert(kind, located.clone());
        Ok(located)
    }
}
