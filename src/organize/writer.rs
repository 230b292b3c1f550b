use super::decl::SourceRange;
use crate::syntax::nodes::line_ending;

/// Append-only output buffer that copies untouched text straight from
/// the original source and only synthesizes separators, using the
/// source's own line ending.
pub struct SourceWriter<'s> {
    source: &'s [u8],
    out: Vec<u8>,
    newline: &'static str,
}

impl<'s> SourceWriter<'s> {
    pub fn new(source: &'s [u8]) -> Self {
        Self {
            source,
            out: Vec::with_capacity(source.len()),
            newline: line_ending(source),
        }
    }

    pub fn newline(&self) -> &'static str {
        self.newline
    }

    pub fn copy_range(&mut self, start: usize, end: usize) {
        if start < end {
            self.out.extend_from_slice(&self.source[start..end]);
        }
    }

    pub fn copy(&mut self, range: SourceRange) {
        self.copy_range(range.start, range.end);
    }

    pub fn emit(&mut self, text: &str) {
        self.out.extend_from_slice(text.as_bytes());
    }

    /// Terminates the current line unless the output is empty or already
    /// at the start of a line.
    pub fn end_line(&mut self) {
        if self.out.is_empty() || self.out.ends_with(b"\n") {
            return;
        }
        // a comment running to the end of a CRLF line keeps its '\r'
        if self.out.ends_with(b"\r") {
            self.out.push(b'\n');
        } else {
            self.out.extend_from_slice(self.newline.as_bytes());
        }
    }

    /// Copies `range` as its own paragraph, separated from what precedes
    /// it by exactly one blank line.
    pub fn paragraph(&mut self, range: SourceRange) {
        self.end_line();
        if !self.out.is_empty() && !self.ends_with_blank_line() {
            self.out.extend_from_slice(self.newline.as_bytes());
        }
        self.copy(range);
        self.end_line();
    }

    fn ends_with_blank_line(&self) -> bool {
        let newline = self.newline.as_bytes();
        self.out.ends_with(newline) && self.out[..self.out.len() - newline.len()].ends_with(newline)
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}
