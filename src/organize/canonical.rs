//! Canonical formatting of rewritten buffers.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{GorgError, Result};
use crate::syntax::nodes::line_ending;
use crate::syntax::parser::Parser;

/// gofmt reports errors as `<standard input>:LINE:COL: message`.
static GOFMT_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^<standard input>:(\d+):(\d+): (.+)$").expect("valid gofmt error pattern")
});

pub trait Canonicalize {
    /// Returns a canonically formatted equivalent of `source`, or a
    /// syntax error if it does not parse.
    fn canonicalize(&self, id: &str, source: &[u8]) -> Result<Vec<u8>>;
}

/// Built-in canonicalizer: checks the buffer parses and ends it with
/// exactly one line ending of the kind the buffer already uses.
/// Indentation is left as written.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tidy;

impl Canonicalize for Tidy {
    fn canonicalize(&self, id: &str, source: &[u8]) -> Result<Vec<u8>> {
        Parser::new().parse(id, source.to_vec())?;

        let end = source
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(0, |i| i + 1);
        let mut output = source[..end].to_vec();
        output.extend_from_slice(line_ending(source).as_bytes());
        Ok(output)
    }
}

/// Pipes the buffer through a `gofmt` executable.
#[derive(Debug, Clone)]
pub struct Gofmt {
    program: PathBuf,
}

impl Gofmt {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Gofmt {
    fn default() -> Self {
        Self::new("gofmt")
    }
}

impl Canonicalize for Gofmt {
    fn canonicalize(&self, id: &str, source: &[u8]) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // feed stdin from its own thread so a full stdout pipe cannot stall us
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("gofmt stdin unavailable"))?;
        let input = source.to_vec();
        let feeder = std::thread::spawn(move || stdin.write_all(&input));

        let output = child.wait_with_output()?;
        feeder
            .join()
            .map_err(|_| std::io::Error::other("gofmt stdin writer panicked"))??;

        if output.status.success() {
            return Ok(output.stdout);
        }
        Err(parse_gofmt_error(id, &String::from_utf8_lossy(&output.stderr)))
    }
}

fn parse_gofmt_error(id: &str, stderr: &str) -> GorgError {
    match GOFMT_ERROR.captures(stderr) {
        Some(caps) => GorgError::syntax(
            id,
            caps[1].parse().unwrap_or(1),
            caps[2].parse().unwrap_or(1),
            &caps[3],
        ),
        None => GorgError::syntax(id, 1, 1, stderr.trim()),
    }
}
