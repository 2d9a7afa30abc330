//! Source locator chain: strategies that map an [`Identifier`] to the source
//! text declaring it.
//!
//! A locator answers `Ok(None)` when it simply does not know the symbol.
//! Errors are reserved for malformed inputs, such as a file that was
//! expected to exist but could not be read.

pub mod aggregate;
pub mod ast;
pub mod autoload;
pub mod directories;
pub mod file_iterator;
pub mod internal;
pub mod memoizing;
pub mod memory;
pub mod single_file;
pub mod string_source;

pub use aggregate::AggregateSourceLocator;
pub use autoload::AutoloadSourceLocator;
pub use directories::DirectoriesSourceLocator;
pub use file_iterator::FileIteratorSourceLocator;
pub use internal::PhpInternalSourceLocator;
pub use memoizing::MemoizingSourceLocator;
pub use memory::MemorySourceLocator;
pub use single_file::SingleFileSourceLocator;
pub use string_source::StringSourceLocator;

use crate::error::Result;
use crate::identifier::{Identifier, IdentifierType};
use crate::parser::ast::Program;
use crate::parser::line_index::LineIndex;
use crate::parser::span::Span;
use crate::reflector::Reflector;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

pub trait SourceLocator {
    /// Returns the source declaring `identifier`, or `None` if this
    /// strategy does not know it.
    fn locate_identifier(
        &self,
        reflector: &Reflector,
        identifier: &Identifier,
    ) -> Result<Option<Rc<LocatedSource>>>;

    /// Every source this strategy knows that declares at least one symbol of `kind`.
    fn locate_identifiers_by_type(
        &self,
        reflector: &Reflector,
        kind: IdentifierType,
    ) -> Result<Vec<Rc<LocatedSource>>>;
}

/// Source text handed out by a locator.
///
/// Parsing and line indexing happen at most once, on first use, and are kept
/// for as long as any reflection derived from this source is alive.
pub struct LocatedSource {
    source: String,
    file_name: Option<String>,
    is_internal: bool,
    is_evaled: bool,
    extension_name: Option<String>,
    program: OnceCell<Rc<Program>>,
    line_index: OnceCell<LineIndex>,
}

impl fmt::Debug for LocatedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatedSource")
            .field("file_name", &self.file_name)
            .field("is_internal", &self.is_internal)
            .field("is_evaled", &self.is_evaled)
            .field("extension_name", &self.extension_name)
            .field("len", &self.source.len())
            .finish()
    }
}

impl LocatedSource {
    pub fn new(source: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            source: source.into(),
            file_name,
            is_internal: false,
            is_evaled: false,
            extension_name: None,
            program: OnceCell::new(),
            line_index: OnceCell::new(),
        }
    }

    /// Source of an engine-provided symbol (a stub).
    pub fn internal(
        source: impl Into<String>,
        extension_name: Option<String>,
        file_name: Option<String>,
    ) -> Self {
        Self {
            is_internal: true,
            extension_name,
            ..Self::new(source, file_name)
        }
    }

    /// Source that only ever existed in memory, like code passed to `eval`.
    pub fn evaled(source: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            is_evaled: true,
            ..Self::new(source, file_name)
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    pub fn is_evaled(&self) -> bool {
        self.is_evaled
    }

    pub fn extension_name(&self) -> Option<&str> {
        self.extension_name.as_deref()
    }

    pub fn program(&self) -> Rc<Program> {
        self.program
            .get_or_init(|| {
                let program = crate::parser::parse(self.source.as_bytes());
                tracing::debug!(
                    file = self.file_name.as_deref().unwrap_or("<string>"),
                    statements = program.statements.len(),
                    "parsed located source"
                );
                for error in &program.errors {
                    tracing::warn!(
                        "{}",
                        error.to_human_readable_with_path(
                            self.source.as_bytes(),
                            self.file_name.as_deref()
                        )
                    );
                }
                Rc::new(program)
            })
            .clone()
    }

    pub fn line_index(&self) -> &LineIndex {
        self.line_index
            .get_or_init(|| LineIndex::new(self.source.as_bytes()))
    }

    /// 1-based start and end line of `span`.
    pub fn lines(&self, span: Span) -> (usize, usize) {
        self.line_index().line_range(span)
    }

    /// 1-based start and end column of `span`.
    pub fn columns(&self, span: Span) -> (usize, usize) {
        self.line_index().column_range(span)
    }

    pub fn declares(&self, identifier: &Identifier) -> bool {
        ast::find_declaration(&self.program(), identifier).is_some()
    }

    pub fn declares_any(&self, kind: IdentifierType) -> bool {
        !ast::declarations_of_type(&self.program(), kind).is_empty()
    }
}
