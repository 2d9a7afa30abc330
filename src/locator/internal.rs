use super::{LocatedSource, SourceLocator};
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::reflector::Reflector;
use crate::stubs::{BuiltinStubProvider, StubData, StubProvider};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Locates engine-provided symbols through a [`StubProvider`].
///
/// Sources are cached per stub file, so every class of one extension shares a
/// single parsed program.
pub struct PhpInternalSourceLocator {
    provider: Box<dyn StubProvider>,
    /// File name -> every distinct stub text served under it.
    sources: RefCell<HashMap<Option<String>, Vec<Rc<LocatedSource>>>>,
}

impl Default for PhpInternalSourceLocator {
    fn default() -> Self {
        Self::new(Box::new(BuiltinStubProvider::new()))
    }
}

impl PhpInternalSourceLocator {
    pub fn new(provider: Box<dyn StubProvider>) -> Self {
        Self {
            provider,
            sources: RefCell::new(HashMap::new()),
        }
    }

    fn source_for(&self, data: StubData) -> Rc<LocatedSource> {
        let mut sources = self.sources.borrow_mut();
        let cached = sources.entry(data.file_name.clone()).or_default();
        if let Some(source) = cached.iter().find(|source| source.source() == data.stub) {
            return source.clone();
        }
        let source = Rc::new(LocatedSource::internal(
            data.stub.into_owned(),
            data.extension_name,
            data.file_name,
        ));
        cached.push(source.clone());
        source
    }
}

impl SourceLocator for PhpInternalSourceLocator {
    fn locate_identifier(
        &self,
        _reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        let Some(data) = self.provider.stub_for(identifier.kind(), identifier.name()) else {
            return Ok(None);
        };
        let source = self.source_for(data);
        Ok(source.declares(identifier).then_some(source))
    }

    fn locate_identifiers_by_type(
        &self,
        _reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        let mut sources: Vec<Rc<LocatedSource>> = Vec::new();
        for name in self.provider.names(kind) {
            let Some(data) = self.provider.stub_for(kind, &name) else {
                continue;
            };
            let source = self.source_for(data);
            if !sources.iter().any(|known| Rc::ptr_eq(known, &source)) {
                sources.push(source);
            }
        }
        Ok(sources)
    }
}
