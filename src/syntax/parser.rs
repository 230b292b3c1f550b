use tree_sitter::{InputEdit, Node, Point, Tree};

use crate::error::{GorgError, Result};
use crate::languages::GoGrammar;

pub struct Parser {
    grammar: GoGrammar,
}

impl Parser {
    pub fn new() -> Self {
        Self { grammar: GoGrammar }
    }

    /// Parses `source` and rejects it unless the tree is free of errors
    /// and starts with a package clause.
    ///
    /// Go allows the last spec of a parenthesized declaration to run
    /// straight into the closing `)`, as in `var (x = 1)`. The grammar
    /// does not, so such files are parsed a second time with a `;`
    /// before each of those `)`, and the inserted bytes are then edited
    /// out of the tree so its offsets address `source` again.
    pub fn parse(&self, id: &str, source: Vec<u8>) -> Result<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.grammar.language())
            .map_err(|e| GorgError::Language(format!("{}: {}", self.grammar.name(), e)))?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| GorgError::syntax(id, 1, 1, "parser produced no tree"))?;

        let tree = if tree.root_node().has_error() {
            match parse_terminated(&mut parser, &source) {
                Some(terminated) => terminated,
                None => return Err(syntax_error(id, &tree, &source)),
            }
        } else {
            tree
        };

        let package = package_name(tree.root_node(), &source)
            .ok_or_else(|| GorgError::syntax(id, 1, 1, "expected 'package' clause"))?;

        Ok(ParsedFile {
            tree,
            source,
            package,
        })
    }
}

fn syntax_error(id: &str, tree: &Tree, source: &[u8]) -> GorgError {
    let root = tree.root_node();
    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("missing {}", node.kind())
    } else {
        let text = node.utf8_text(source).unwrap_or("");
        let snippet: String = text.chars().take(20).collect();
        format!("unexpected {:?}", snippet)
    };
    GorgError::syntax(id, position.row + 1, position.column + 1, message)
}

/// Re-parses with a `;` in front of every unterminated group closer and
/// maps the resulting tree back onto the original offsets. Returns `None`
/// when there is nothing to terminate or the file is still broken.
fn parse_terminated(parser: &mut tree_sitter::Parser, source: &[u8]) -> Option<Tree> {
    let closers = unterminated_closers(source);
    if closers.is_empty() {
        return None;
    }

    let mut patched = Vec::with_capacity(source.len() + closers.len());
    let mut pos = 0;
    for &offset in &closers {
        patched.extend_from_slice(&source[pos..offset]);
        patched.push(b';');
        pos = offset;
    }
    patched.extend_from_slice(&source[pos..]);

    parser.reset();
    let mut tree = parser.parse(&patched, None)?;
    if tree.root_node().has_error() {
        return None;
    }

    // last first, so earlier insertions keep their patched offsets
    for (i, &offset) in closers.iter().enumerate().rev() {
        let at = offset + i;
        let start = point_at(&patched, at);
        tree.edit(&InputEdit {
            start_byte: at,
            old_end_byte: at + 1,
            new_end_byte: at,
            start_position: start,
            old_end_position: Point::new(start.row, start.column + 1),
            new_end_position: start,
        });
    }
    Some(tree)
}

fn point_at(source: &[u8], offset: usize) -> Point {
    let before = &source[..offset];
    let row = before.iter().filter(|&&b| b == b'\n').count();
    let column = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(offset, |i| offset - i - 1);
    Point::new(row, column)
}

/// Offsets of the `)` closing a `const`, `var`, `type` or `import` group
/// whose last spec is not followed by a newline or `;`.
///
/// A small lexer skips comments and string, rune and raw string literals
/// so parentheses inside them are not counted.
fn unterminated_closers(source: &[u8]) -> Vec<usize> {
    let mut closers = Vec::new();
    // one entry per open paren: whether it opens a declaration group
    let mut parens: Vec<bool> = Vec::new();
    let mut after_keyword = false;
    let mut i = 0;

    while i < source.len() {
        match source[i] {
            b'/' if source.get(i + 1) == Some(&b'/') => {
                i = source[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(source.len(), |n| i + n);
                continue;
            }
            b'/' if source.get(i + 1) == Some(&b'*') => {
                i = source[i + 2..]
                    .windows(2)
                    .position(|w| w == b"*/")
                    .map_or(source.len(), |n| i + 2 + n + 2);
                continue;
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i = skip_literal(source, i, quote);
                after_keyword = false;
                continue;
            }
            b'(' => {
                parens.push(after_keyword);
                after_keyword = false;
            }
            b')' => {
                if parens.pop() == Some(true) && needs_terminator(source, i) {
                    closers.push(i);
                }
                after_keyword = false;
            }
            b if b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80 => {
                let end = source[i..]
                    .iter()
                    .position(|&b| !(b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80))
                    .map_or(source.len(), |n| i + n);
                after_keyword = matches!(&source[i..end], b"const" | b"var" | b"type" | b"import");
                i = end;
                continue;
            }
            b if b.is_ascii_whitespace() => {}
            _ => after_keyword = false,
        }
        i += 1;
    }

    closers
}

/// Offset just past the literal opened by `quote` at `start`.
fn skip_literal(source: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < source.len() {
        match source[i] {
            b'\\' if quote != b'`' => i += 2,
            b if b == quote => return i + 1,
            b'\n' if quote != b'`' => return i,
            _ => i += 1,
        }
    }
    source.len()
}

fn needs_terminator(source: &[u8], closer: usize) -> bool {
    source[..closer]
        .iter()
        .rev()
        .find(|&&b| !matches!(b, b' ' | b'\t' | b'\r'))
        .is_some_and(|&b| !matches!(b, b'\n' | b';' | b'('))
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ParsedFile {
    pub tree: Tree,
    pub source: Vec<u8>,
    pub package: String,
}

impl ParsedFile {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        &self.source
    }

    pub fn node_text(&self, node: &Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }
}

fn package_name(root: Node, source: &[u8]) -> Option<String> {
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|child| child.kind() == "package_clause")?;

    let mut cursor = clause.walk();
    let name = clause
        .named_children(&mut cursor)
        .find(|child| child.kind() == "package_identifier")?;
    name.utf8_text(source).ok().map(str::to_string)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}
