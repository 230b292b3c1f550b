//! Session
//!
//! Runs the reorganization pipeline over the files of one package and
//! records which files end up different from what was registered.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{GorgError, Result};
use crate::organize::{group_declarations, split_values, Canonicalize, FileLayout, Tidy};
use crate::resolve::TypeResolver;
use crate::syntax::{FileWalker, ParsedFile, SourceStore};

/// Original and current content of a file that changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub id: String,
    pub original: Vec<u8>,
    pub current: Vec<u8>,
}

pub struct Session {
    store: SourceStore,
    changes: Vec<Change>,
    canonicalizer: Box<dyn Canonicalize>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_canonicalizer(Tidy)
    }

    pub fn with_canonicalizer(canonicalizer: impl Canonicalize + 'static) -> Self {
        Self {
            store: SourceStore::new(),
            changes: Vec::new(),
            canonicalizer: Box::new(canonicalizer),
        }
    }

    pub fn store(&self) -> &SourceStore {
        &self.store
    }

    /// Registers a single file as a batch of one.
    pub fn add(&mut self, id: &str, source: impl Into<Vec<u8>>) -> Result<()> {
        self.add_files([(id, source.into())])
    }

    pub fn add_files<I, S>(&mut self, files: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        self.store.add_files(files)
    }

    /// Registers every source file of `dir` and returns their identifiers.
    pub fn add_dir(&mut self, dir: &Path) -> Result<Vec<String>> {
        let paths = FileWalker::new().walk(dir)?;

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            files.push((path.to_string_lossy().to_string(), std::fs::read(path)?));
        }
        let ids = files.iter().map(|(id, _)| id.clone()).collect();

        self.add_files(files)?;
        Ok(ids)
    }

    pub fn current(&self, id: &str) -> Result<&[u8]> {
        Ok(self.store.get(id)?.current())
    }

    /// Splits mixed-type value blocks of one file and commits the result.
    pub fn separate_values(&mut self, id: &str) -> Result<Vec<u8>> {
        let split = {
            let file = self.store.get(id)?;
            let resolver = TypeResolver::new(file.current(), self.store.scope());
            split_values(file.parsed(), &resolver)
        };

        let formatted = self.canonicalize(id, split)?;
        let parsed = self.store.parser().parse(id, formatted)?;
        self.commit(id, parsed)
    }

    /// Runs the full pipeline on one file: split, re-parse, group,
    /// canonicalize, re-parse, commit. Nothing is committed on error.
    pub fn organize(&mut self, id: &str) -> Result<Vec<u8>> {
        let grouped = {
            let file = self.store.get(id)?;
            let scope = self.store.scope();

            let resolver = TypeResolver::new(file.current(), scope);
            let split = split_values(file.parsed(), &resolver);
            debug!(id, "value blocks separated");

            let reparsed = self.store.parser().parse(id, split)?;
            let resolver = TypeResolver::new(reparsed.source_bytes(), scope);
            let layout = FileLayout::extract(id, &reparsed, &resolver)?;
            debug!(id, declarations = layout.declarations.len(), "declarations grouped");
            group_declarations(&layout, reparsed.source_bytes())
        };

        let formatted = self.canonicalize(id, grouped)?;
        let parsed = self.store.parser().parse(id, formatted)?;
        self.commit(id, parsed)
    }

    /// Organizes the given files in order, stopping at the first error.
    pub fn organize_files<I, S>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.organize(id.as_ref())?;
        }
        Ok(())
    }

    pub fn organize_all(&mut self) -> Result<()> {
        let ids = self.store.ids();
        self.organize_files(ids)
    }

    /// Identifiers of files whose content differs, in order of first change.
    pub fn changed_files(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn change(&self, id: &str) -> Option<&Change> {
        self.changes.iter().find(|c| c.id == id)
    }

    /// Hands every changed file to `sink`, stopping at the first failure.
    pub fn write_files<F>(&self, mut sink: F) -> Result<()>
    where
        F: FnMut(&str, &[u8]) -> std::io::Result<()>,
    {
        for change in &self.changes {
            sink(&change.id, &change.current).map_err(|source| GorgError::Write {
                id: change.id.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn canonicalize(&self, id: &str, raw: Vec<u8>) -> Result<Vec<u8>> {
        self.canonicalizer
            .canonicalize(id, &raw)
            .map_err(|e| GorgError::Format {
                id: id.to_string(),
                message: e.to_string(),
                output: raw,
            })
    }

    fn commit(&mut self, id: &str, parsed: ParsedFile) -> Result<Vec<u8>> {
        let output = parsed.source.clone();
        let original = self.store.get(id)?.original();
        let differs = original != output.as_slice();

        match self.changes.iter_mut().find(|c| c.id == id) {
            Some(change) => change.current = output.clone(),
            None if differs => self.changes.push(Change {
                id: id.to_string(),
                original: original.to_vec(),
                current: output.clone(),
            }),
            None => {}
        }

        self.store.replace(id, parsed)?;
        self.store.resolve();

        if differs {
            info!(id, "file reorganized");
        } else {
            debug!(id, "file already organized");
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_file_is_not_recorded() {
        let source = "package p\n\ntype Foo struct{}\n\nfunc (f Foo) Bar() {}\n";
        let mut session = Session::new();
        session.add("foo.go", source).unwrap();

        let output = session.organize("foo.go").unwrap();
        assert_eq!(output, source.as_bytes());
        assert!(session.changed_files().is_empty());
    }

    #[test]
    fn test_changed_file_is_recorded_with_original() {
        let source = "package p\n\nfunc (f Foo) Bar() {}\n\ntype Foo struct{}\n";
        let mut session = Session::new();
        session.add("foo.go", source).unwrap();
        session.organize("foo.go").unwrap();

        assert_eq!(session.changed_files(), vec!["foo.go"]);
        let change = session.change("foo.go").unwrap();
        assert_eq!(change.original, source.as_bytes());
        assert_eq!(change.current, session.current("foo.go").unwrap());
    }

    #[test]
    fn test_organize_unknown_file() {
        let mut session = Session::new();
        assert!(matches!(
            session.organize("missing.go"),
            Err(GorgError::NotRegistered { .. })
        ));
    }

    #[test]
    fn test_unknown_declaration_leaves_file_untouched() {
        let source = "package p\n\nfunc a() {}\n\nx := 1\n";
        let mut session = Session::new();
        if session.add("bad.go", source).is_err() {
            // rejected at registration, nothing to organize
            return;
        }

        let err = session.organize("bad.go").unwrap_err();
        assert!(matches!(
            err,
            GorgError::UnknownDeclaration { .. } | GorgError::Syntax { .. }
        ));
        assert_eq!(session.current("bad.go").unwrap(), source.as_bytes());
        assert!(session.changed_files().is_empty());
    }

    struct Failing;

    impl Canonicalize for Failing {
        fn canonicalize(&self, id: &str, _source: &[u8]) -> Result<Vec<u8>> {
            Err(GorgError::syntax(id, 1, 1, "refused"))
        }
    }

    #[test]
    fn test_canonicalize_failure_returns_raw_output() {
        let source = "package p\n\nfunc b() {}\n\nfunc a() {}\n";
        let mut session = Session::with_canonicalizer(Failing);
        session.add("x.go", source).unwrap();

        match session.organize("x.go") {
            Err(GorgError::Format { id, output, .. }) => {
                assert_eq!(id, "x.go");
                assert!(String::from_utf8(output).unwrap().contains("func a() {}\n\nfunc b() {}"));
            }
            other => panic!("expected format error, got {:?}", other.map(String::from_utf8)),
        }
        assert_eq!(session.current("x.go").unwrap(), source.as_bytes());
        assert!(session.changed_files().is_empty());
    }

    #[test]
    fn test_write_files_stops_at_first_error() {
        let mut session = Session::new();
        session
            .add_files(vec![
                ("a.go", b"package p\n\nfunc b() {}\n\nfunc a() {}\n".to_vec()),
                ("b.go", b"package p\n\nfunc d() {}\n\nfunc c() {}\n".to_vec()),
            ])
            .unwrap();
        session.organize_all().unwrap();
        assert_eq!(session.changed_files(), vec!["a.go", "b.go"]);

        let mut calls = Vec::new();
        let err = session
            .write_files(|id, _| {
                calls.push(id.to_string());
                Err(std::io::Error::other("disk full"))
            })
            .unwrap_err();
        assert!(matches!(err, GorgError::Write { .. }));
        assert_eq!(calls, vec!["a.go".to_string()]);
    }

    #[test]
    fn test_separate_values_commits_split() {
        let source = "package p\n\nconst (\n\tA int = 1\n\tB string = \"b\"\n)\n";
        let mut session = Session::new();
        session.add("v.go", source).unwrap();

        let output = String::from_utf8(session.separate_values("v.go").unwrap()).unwrap();
        assert_eq!(output.matches("const (").count(), 2);
        assert_eq!(session.changed_files(), vec!["v.go"]);
    }
}
