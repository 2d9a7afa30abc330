use super::{LocatedSource, SourceLocator};
use crate::error::{ReflectionError, Result};
use crate::identifier::{Identifier, IdentifierType};
use crate::reflector::Reflector;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use walkdir::WalkDir;

/// Maps class names to files the way a Composer autoloader would: an explicit
/// class map first, then PSR-4 prefixes in registration order.
///
/// Only classes are autoloadable. Function and constant lookups always miss.
#[derive(Default)]
pub struct AutoloadSourceLocator {
    class_map: IndexMap<String, PathBuf>,
    psr4: Vec<(String, Vec<PathBuf>)>,
    sources: RefCell<HashMap<PathBuf, Rc<LocatedSource>>>,
}

impl AutoloadSourceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_map<I, K, P>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<PathBuf>,
    {
        for (class, path) in entries {
            self.class_map.insert(
                class.as_ref().trim_start_matches('\\').to_ascii_lowercase(),
                path.into(),
            );
        }
        self
    }

    /// Registers a PSR-4 prefix such as `App\` for one or more base directories.
    pub fn with_psr4<P: Into<PathBuf>>(
        mut self,
        prefix: &str,
        directories: impl IntoIterator<Item = P>,
    ) -> Self {
        let mut prefix = prefix.trim_start_matches('\\').to_string();
        if !prefix.is_empty() && !prefix.ends_with('\\') {
            prefix.push('\\');
        }
        self.psr4
            .push((prefix, directories.into_iter().map(Into::into).collect()));
        self
    }

    /// Candidate files for a class, in lookup order. Missing files are skipped.
    fn candidates(&self, class: &str) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if let Some(path) = self.class_map.get(&class.to_ascii_lowercase()) {
            out.push(path.clone());
        }
        for (prefix, directories) in &self.psr4 {
            let Some(relative) = strip_prefix_ignore_case(class, prefix) else {
                continue;
            };
            let relative = format!("{}.php", relative.replace('\\', "/"));
            for directory in directories {
                let path = directory.join(&relative);
                if path.is_file() {
                    out.push(path);
                }
            }
        }
        out
    }

    fn load(&self, path: &Path) -> Result<Rc<LocatedSource>> {
        if let Some(source) = self.sources.borrow().get(path) {
            return Ok(source.clone());
        }
        let bytes = std::fs::read(path).map_err(|err| ReflectionError::io(path, &err))?;
        let source = Rc::new(LocatedSource::new(
            String::from_utf8_lossy(&bytes).into_owned(),
            Some(path.display().to_string()),
        ));
        self.sources
            .borrow_mut()
            .insert(path.to_path_buf(), source.clone());
        Ok(source)
    }

    fn all_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.class_map.values().cloned().collect();
        for (_, directories) in &self.psr4 {
            for directory in directories {
                let mut found: Vec<PathBuf> = WalkDir::new(directory)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|path| path.extension().is_some_and(|ext| ext == "php"))
                    .collect();
                found.sort();
                files.extend(found);
            }
        }
        let mut seen = std::collections::HashSet::new();
        files.retain(|path| seen.insert(path.clone()));
        files
    }
}

fn strip_prefix_ignore_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &name[prefix.len()..])
}

impl SourceLocator for AutoloadSourceLocator {
    fn locate_identifier(
        &self,
        _reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>> {
        if !identifier.is_class() {
            return Ok(None);
        }
        for path in self.candidates(identifier.name()) {
            let source = self.load(&path)?;
            if source.declares(identifier) {
                tracing::debug!(class = identifier.name(), path = %path.display(), "autoload hit");
                return Ok(Some(source));
            }
        }
        Ok(None)
    }

    fn locate_identifiers_by_type(
        &self,
        _reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>> {
        if kind != IdentifierType::Class {
            return Ok(Vec::new());
        }
        let mut sources = Vec::new();
        for path in self.all_files() {
            if !path.is_file() {
                continue;
            }
            let source = self.load(&path)?;
            if source.declares_any(kind) {
                sources.push(source);
            }
        }
        Ok(sources)
    }
}
