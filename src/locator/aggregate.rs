use super::{LocatedSource, SourceLocator};
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::reflector::Reflector;
use std::rc::Rc;

/// Tries each locator in order; the first hit wins.
#[derive(Default)]
pub struct AggregateSourceLocator {
    locators: Vec<Rc<dyn SourceLocator>>,
}

impl AggregateSourceLocator {
    pub fn new(locators: Vec<Rc<dyn SourceLocator>>) -> Self {
        Self { locators }
    }

    pub fn with(mut self, locator: Rc<dyn SourceLocator>) -> Self {
        self.locators.push(locator);
        self
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl SourceLocator for AggregateSourceLocator {
    fn locate_identifier(
        &self,
        reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        for locator in &self.locators {
            if let Some(source) = locator.locate_identifier(reflector, identifier)? {
                return Ok(Some(source));
            }
        }
        Ok(None)
    }

    fn locate_identifiers_by_type(
        &self,
        reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        let mut sources = Vec::new();
        for locator in &self.locators {
            sources.extend(locator.locate_identifiers_by_type(reflector, kind)?);
        }
        Ok(sources)
    }
}
