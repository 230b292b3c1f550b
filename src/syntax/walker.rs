use std::path::{Path, PathBuf};

use crate::error::{GorgError, Result};
use crate::languages::GoGrammar;

/// Lists the source files of one package directory (not recursive).
pub struct FileWalker {
    grammar: GoGrammar,
}

impl FileWalker {
    pub fn new() -> Self {
        Self { grammar: GoGrammar }
    }

    pub fn walk(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let base = glob::Pattern::escape(&dir.to_string_lossy());

        for ext in self.grammar.file_extensions() {
            let pattern = Path::new(&base).join(format!("*.{}", ext));
            let entries = glob::glob(&pattern.to_string_lossy()).map_err(|e| {
                GorgError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    e.to_string(),
                ))
            })?;

            for entry in entries {
                let path = entry.map_err(glob::GlobError::into_error)?;
                if path.is_file() {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.grammar.file_extensions().contains(&ext))
    }
}

impl Default for FileWalker {
    fn default() -> Self {
        Self::new()
    }
}
