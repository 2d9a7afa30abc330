use super::{LocatedSource, SourceLocator};
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::reflector::Reflector;
use std::cell::RefCell;
use std::rc::Rc;

/// Holds code snippets that only exist in memory, as if passed to `eval`.
///
/// Snippets can be added after the locator is handed to a reflector; lookups
/// search them newest first.
#[derive(Default)]
pub struct MemorySourceLocator {
    sources: RefCell<Vec<Rc<LocatedSource>>>,
}

impl MemorySourceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, code: impl Into<String>) -> Rc<LocatedSource> {
        self.push(LocatedSource::evaled(code, None))
    }

    /// Adds a snippet reported under a virtual file name.
    pub fn add_named(&self, code: impl Into<String>, file_name: impl Into<String>) -> Rc<LocatedSource> {
        self.push(LocatedSource::evaled(code, Some(file_name.into())))
    }

    fn push(&self, source: LocatedSource) -> Rc<LocatedSource> {
        let source = Rc::new(source);
        self.sources.borrow_mut().push(source.clone());
        source
    }

    pub fn len(&self) -> usize {
        self.sources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.borrow().is_empty()
    }
}

impl SourceLocator for MemorySourceLocator {
    fn locate_identifier(
        &self,
        _reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        Ok(self
            .sources
            .borrow()
            .iter()
            .rev()
            .find(|source| source.declares(identifier))
            .cloned())
    }

    fn locate_identifiers_by_type(
        &self,
        _reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        Ok(self
            .sources
            .borrow()
            .iter()
            .filter(|source| source.declares_any(kind))
            .cloned()
            .collect())
    }
}
