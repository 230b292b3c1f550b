//! Registered source files of one package.

use std::collections::HashMap;

use tracing::debug;

use super::parser::{ParsedFile, Parser};
use crate::error::{GorgError, Result};
use crate::resolve::PackageScope;

pub struct SourceFile {
    id: String,
    original: Vec<u8>,
    parsed: ParsedFile,
}

impl SourceFile {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original(&self) -> &[u8] {
        &self.original
    }

    pub fn current(&self) -> &[u8] {
        self.parsed.source_bytes()
    }

    pub fn parsed(&self) -> &ParsedFile {
        &self.parsed
    }

    pub fn package(&self) -> &str {
        &self.parsed.package
    }
}

/// Maps file identifiers to their parsed content and holds the package
/// scope computed over all of them.
#[derive(Default)]
pub struct SourceStore {
    parser: Parser,
    files: Vec<SourceFile>,
    index: HashMap<String, usize>,
    scope: Option<PackageScope>,
}

impl SourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Parses and stores one file. Fails if the identifier is already
    /// known, the source does not parse, or it declares a different
    /// package than the files registered before it.
    pub fn register(&mut self, id: &str, source: Vec<u8>) -> Result<()> {
        if self.index.contains_key(id) {
            return Err(GorgError::AlreadyExists { id: id.to_string() });
        }

        let parsed = self.parser.parse(id, source)?;
        if let Some(first) = self.files.first() {
            if first.package() != parsed.package {
                return Err(GorgError::PackageMismatch {
                    first: first.id.clone(),
                    first_package: first.package().to_string(),
                    second: id.to_string(),
                    second_package: parsed.package.clone(),
                });
            }
        }

        debug!(id, package = %parsed.package, "registered file");
        self.index.insert(id.to_string(), self.files.len());
        self.files.push(SourceFile {
            id: id.to_string(),
            original: parsed.source.clone(),
            parsed,
        });
        Ok(())
    }

    /// Registers a batch, then builds the package scope once.
    ///
    /// A duplicate identifier does not stop the batch: the remaining
    /// files are still registered and the first duplicate is reported
    /// afterwards. Any other error aborts the batch and unregisters the
    /// files it had already added.
    pub fn add_files<I, S>(&mut self, files: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let mark = self.files.len();
        let mut duplicate = None;

        for (id, source) in files {
            match self.register(id.as_ref(), source) {
                Ok(()) => {}
                Err(GorgError::AlreadyExists { id }) => {
                    debug!(%id, "file registered twice");
                    duplicate.get_or_insert(GorgError::AlreadyExists { id });
                }
                Err(e) => {
                    self.truncate(mark);
                    return Err(e);
                }
            }
        }

        self.resolve();
        duplicate.map_or(Ok(()), Err)
    }

    fn truncate(&mut self, len: usize) {
        if len < self.files.len() {
            debug!(dropped = self.files.len() - len, "rolling back batch");
            self.files.truncate(len);
            self.index.retain(|_, i| *i < len);
        }
    }

    /// Rebuilds the cross-file package scope from the current trees.
    pub fn resolve(&mut self) {
        self.scope = Some(PackageScope::build(self.files.iter().map(|f| &f.parsed)));
    }

    pub fn scope(&self) -> Option<&PackageScope> {
        self.scope.as_ref()
    }

    pub fn get(&self, id: &str) -> Result<&SourceFile> {
        self.index
            .get(id)
            .map(|&i| &self.files[i])
            .ok_or_else(|| GorgError::NotRegistered { id: id.to_string() })
    }

    /// Replaces a file's current content with an already parsed buffer.
    pub fn replace(&mut self, id: &str, parsed: ParsedFile) -> Result<()> {
        let i = *self
            .index
            .get(id)
            .ok_or_else(|| GorgError::NotRegistered { id: id.to_string() })?;
        self.files[i].parsed = parsed;
        Ok(())
    }

    pub fn package(&self) -> Option<&str> {
        self.files.first().map(SourceFile::package)
    }

    /// Identifiers in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.files.iter().map(|f| f.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
