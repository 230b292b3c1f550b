use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use similar::TextDiff;
use tracing::debug;

use gorg::{FileWalker, Gofmt, Session};

#[derive(Parser)]
#[command(name = "gorg")]
#[command(about = "Reorganize Go source files so declarations sit next to their types")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Print the reorganized file
    gorg foo.go

    # List files of a package that would change
    gorg -l ./pkg/store

    # Show what would change as a unified diff
    gorg -d ./pkg/store

    # Rewrite in place, formatting with gofmt
    gorg -w --gofmt ./pkg/store
"#)]
pub struct Cli {
    /// List files whose content would change
    #[arg(short = 'l')]
    pub list: bool,

    /// Display diffs instead of rewriting files
    #[arg(short = 'd')]
    pub diff: bool,

    /// Write result to (source) file instead of stdout
    #[arg(short = 'w')]
    pub write: bool,

    /// Canonicalize output with gofmt, optionally naming the executable
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "gofmt")]
    pub gofmt: Option<PathBuf>,

    /// Go source files or package directories
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

impl Cli {
    fn session(&self) -> Session {
        match &self.gofmt {
            Some(program) => Session::with_canonicalizer(Gofmt::new(program)),
            None => Session::new(),
        }
    }
}

pub fn run(cli: &Cli) -> Result<()> {
    let mut session = cli.session();
    let targets = load_targets(&mut session, &cli.paths)?;
    debug!(files = targets.len(), "targets loaded");

    for id in &targets {
        session
            .organize(id)
            .with_context(|| format!("failed to organize {}", id))?;
    }

    if cli.write {
        return session
            .write_files(|id, content| fs::write(id, content))
            .context("failed to write results");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for id in &targets {
        let change = session.change(id);
        if cli.list {
            if change.is_some() {
                writeln!(out, "{}", id)?;
            }
        } else if cli.diff {
            if let Some(change) = change {
                writeln!(out, "{}", id)?;
                write!(out, "{}", render_diff(id, &change.original, &change.current))?;
            }
        } else {
            out.write_all(session.current(id)?)?;
        }
    }

    Ok(())
}

/// Registers the package of every path and returns the files to organize,
/// each once, in argument order.
fn load_targets(session: &mut Session, paths: &[PathBuf]) -> Result<Vec<String>> {
    let walker = FileWalker::new();
    // package directories already registered, keyed by canonical path
    let mut packages: HashMap<PathBuf, Vec<String>> = HashMap::new();
    let mut targets = Vec::new();

    for path in paths {
        if path.is_dir() {
            targets.extend(package_files(session, &mut packages, path)?.iter().cloned());
            continue;
        }

        if !walker.is_supported(path) {
            bail!("{} is not a Go source file", path.display());
        }
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let wanted = fs::canonicalize(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let id = package_files(session, &mut packages, dir)?
            .iter()
            .find(|id| fs::canonicalize(id).is_ok_and(|p| p == wanted))
            .cloned();
        match id {
            Some(id) => targets.push(id),
            None => bail!("{} is not a Go source file", path.display()),
        }
    }

    let mut seen = HashSet::new();
    targets.retain(|id| seen.insert(id.clone()));
    Ok(targets)
}

/// Registers `dir` unless it was already loaded under any spelling, and
/// returns the identifiers of its files.
fn package_files<'p>(
    session: &mut Session,
    packages: &'p mut HashMap<PathBuf, Vec<String>>,
    dir: &Path,
) -> Result<&'p Vec<String>> {
    let key = fs::canonicalize(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    match packages.entry(key) {
        Entry::Occupied(entry) => {
            debug!(dir = %dir.display(), "package already loaded");
            Ok(entry.into_mut())
        }
        Entry::Vacant(entry) => {
            let ids = session
                .add_dir(dir)
                .with_context(|| format!("failed to add directory {}", dir.display()))?;
            Ok(entry.insert(ids))
        }
    }
}

fn render_diff(id: &str, original: &[u8], current: &[u8]) -> String {
    let original = String::from_utf8_lossy(original);
    let current = String::from_utf8_lossy(current);
    TextDiff::from_lines(original.as_ref(), current.as_ref())
        .unified_diff()
        .header(&format!("{}.orig", id), id)
        .to_string()
}
