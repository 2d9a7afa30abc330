use super::{LocatedSource, SourceLocator};
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::reflector::Reflector;
use std::rc::Rc;

/// Locates symbols declared in one literal string of PHP source.
pub struct StringSourceLocator {
    source: Rc<LocatedSource>,
}

impl StringSourceLocator {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Rc::new(LocatedSource::new(source, None)),
        }
    }

    pub fn with_file_name(source: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            source: Rc::new(LocatedSource::new(source, Some(file_name.into()))),
        }
    }

    pub fn located_source(&self) -> &Rc<LocatedSource> {
        &self.source
    }
}

impl SourceLocator for StringSourceLocator {
    fn locate_identifier(
        &self,
        _reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        Ok(self
            .source
            .declares(identifier)
            .then(|| self.source.clone()))
    }

    fn locate_identifiers_by_type(
        &self,
        _reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        Ok(if self.source.declares_any(kind) {
            vec![self.source.clone()]
        } else {
            Vec::new()
        })
    }
}
