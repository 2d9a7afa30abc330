use super::{LocatedSource, SourceLocator};
use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType};
use crate::reflector::Reflector;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Locates symbols declared in a single file on disk.
///
/// The file is read on first use; a file that disappeared in the meantime is
/// reported as an I/O error rather than a miss.
pub struct SingleFileSourceLocator {
    path: PathBuf,
    source: OnceCell<Rc<LocatedSource>>,
}

impl SingleFileSourceLocator {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ReflectionError::Io {
                path: path.display().to_string(),
                message: "file does not exist or is not readable".to_string(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            source: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn located_source(&self) -> Result<Rc<LocatedSource>> {
        if let Some(source) = self.source.get() {
            return Ok(source.clone());
        }
        let bytes = std::fs::read(&self.path).map_err(|err| ReflectionError::io(&self.path, &err))?;
        let source = Rc::new(LocatedSource::new(
            String::from_utf8_lossy(&bytes).into_owned(),
            Some(self.path.display().to_string()),
        ));
        tracing::debug!(path = %self.path.display(), "read source file");
        Ok(self.source.get_or_init(|| source).clone())
    }
}

impl SourceLocator for SingleFileSourceLocator {
    fn locate_identifier(
        &self,
        _reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        let source = self.located_source()?;
        Ok(source.declares(identifier).then_some(source))
    }

    fn locate_identifiers_by_type(
        &self,
        _reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        let source = self.located_source()?;
        Ok(if source.declares_any(kind) {
            vec![source]
        } else {
            Vec::new()
        })
    }
}
