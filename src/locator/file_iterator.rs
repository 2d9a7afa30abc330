use super::{AggregateSourceLocator, SingleFileSourceLocator, SourceLocator};
use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::locator::LocatedSource;
use crate::reflector::Reflector;
use std::cell::OnceCell;
use std::path::PathBuf;
use std::rc::Rc;

/// Locates symbols across a fixed list of files. Only `.php` files are used.
pub struct FileIteratorSourceLocator {
    files: Vec<PathBuf>,
    aggregate: OnceCell<AggregateSourceLocator>,
}

impl FileIteratorSourceLocator {
    pub fn new(files: impl IntoIterator<Item = PathBuf>) -> Self {
        let files = files
            .into_iter()
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
            })
            .collect();
        Self {
            files,
            aggregate: OnceCell::new(),
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn aggregate(&self) -> Result<&AggregateSourceLocator> {
        if let Some(aggregate) = self.aggregate.get() {
            return Ok(aggregate);
        }
        let mut locators: Vec<Rc<dyn SourceLocator>> = Vec::with_capacity(self.files.len());
        for file in &self.files {
            locators.push(Rc::new(SingleFileSourceLocator::new(file)?));
        }
        Ok(self
            .aggregate
            .get_or_init(|| AggregateSourceLocator::new(locators)))
    }
}

impl SourceLocator for FileIteratorSourceLocator {
    fn locate_identifier(
        &self,
        reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        self.aggregate()?.locate_identifier(reflector, identifier)
    }

    fn locate_identifiers_by_type(
        &self,
        reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        self.aggregate()?.locate_identifiers_by_type(reflector, kind)
    }
}
