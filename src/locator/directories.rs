use super::{AggregateSourceLocator, FileIteratorSourceLocator, LocatedSource, SourceLocator};
use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType};
use crate::reflector::Reflector;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use walkdir::WalkDir;

/// Scans directories recursively for `.php` files.
///
/// Each directory becomes one [`FileIteratorSourceLocator`]; the directories
/// are tried in the order given.
pub struct DirectoriesSourceLocator {
    aggregate: AggregateSourceLocator,
}

impl DirectoriesSourceLocator {
    pub fn new<P: AsRef<Path>>(directories: impl IntoIterator<Item = P>) -> Result<Self> {
        let mut locators: Vec<Rc<dyn SourceLocator>> = Vec::new();
        for directory in directories {
            let directory = directory.as_ref();
            if !directory.is_dir() {
                return Err(ReflectionError::Io {
                    path: directory.display().to_string(),
                    message: "not a directory".to_string(),
                });
            }
            locators.push(Rc::new(FileIteratorSourceLocator::new(php_files(directory))));
        }
        Ok(Self {
            aggregate: AggregateSourceLocator::new(locators),
        })
    }
}

fn php_files(directory: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(directory)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    tracing::debug!(directory = %directory.display(), files = files.len(), "scanned directory");
    files
}

impl SourceLocator for DirectoriesSourceLocator {
    fn locate_identifier(
        &self,
        reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        self.aggregate.locate_identifier(reflector, identifier)
    }

    fn locate_identifiers_by_type(
        &self,
        reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        self.aggregate.locate_identifiers_by_type(reflector, kind)
    }
}
