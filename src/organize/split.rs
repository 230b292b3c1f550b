//! Splits parenthesized `const`/`var` blocks into blocks of one type.
//!
//! ```text
//! const (                        const (
//!     Int1 int = iota                Int1 int = iota
//!     Int2                           Int2
//!                          =>    )
//!     Str1 string = "a"
//!     Str2        = "b"          const (
//! )                                  Str1 string = "a"
//!                                    Str2        = "b"
//!                                )
//! ```
//!
//! Only specs declaring a single name are considered, and only an
//! explicit annotation of a different type starts a new block. The
//! parentheses of a block that gets split are moved onto lines of their
//! own; blocks that are not split are copied untouched.

use tree_sitter::Node;
use tracing::debug;

use super::decl::{attach_comments, Attached};
use super::writer::SourceWriter;
use crate::resolve::{has_annotation, TypeResolver};
use crate::syntax::nodes::{
    is_blank, is_comment, is_grouped, is_spec, line_end, line_start, named_children,
    spec_container, spec_names, trim_back,
};
use crate::syntax::parser::ParsedFile;

/// Where one block is closed and the next one opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SplitPoint {
    close: usize,
    open: usize,
    /// The two specs share a line, so the delimiters go mid-line.
    inline: bool,
}

/// Rewrites the whole file, splitting every mixed-type value block.
/// Everything outside the split points is copied verbatim.
pub fn split_values(parsed: &ParsedFile, resolver: &TypeResolver) -> Vec<u8> {
    let source = parsed.source_bytes();
    let mut writer = SourceWriter::new(source);
    let mut pos = 0;

    for decl in named_children(parsed.root_node()) {
        let keyword = match decl.kind() {
            "const_declaration" => "const",
            "var_declaration" => "var",
            _ => continue,
        };
        if !is_grouped(decl) {
            continue;
        }

        let points = split_points(decl, source, resolver);
        if points.is_empty() {
            continue;
        }
        debug!(
            keyword,
            line = decl.start_position().row + 1,
            blocks = points.len() + 1,
            "splitting value block"
        );

        let newline = writer.newline();

        if let Some(open) = delimiter(decl, "(") {
            let after = open.end_byte();
            if !is_blank(&source[after..line_end(source, after)]) {
                writer.copy_range(pos, after);
                writer.emit(newline);
                pos = after
                    + source[after..]
                        .iter()
                        .take_while(|&&b| matches!(b, b' ' | b'\t'))
                        .count();
            }
        }

        for point in points {
            writer.copy_range(pos, point.close);
            if point.inline {
                writer.emit(newline);
            }
            writer.emit(&format!("){nl}{nl}{} ({nl}", keyword, nl = newline));
            pos = point.open;
        }

        if let Some(close) = delimiter(decl, ")") {
            let at = close.start_byte();
            if !is_blank(&source[line_start(source, at)..at]) {
                writer.copy_range(pos, trim_back(source, at));
                writer.emit(newline);
                pos = at;
            }
        }
    }

    writer.copy_range(pos, source.len());
    writer.into_bytes()
}

/// The `(` or `)` token of a parenthesized declaration.
fn delimiter<'t>(decl: Node<'t>, kind: &str) -> Option<Node<'t>> {
    [spec_container(decl), decl].into_iter().find_map(|node| {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).find(|child| child.kind() == kind);
        found
    })
}

fn split_points(decl: Node, source: &[u8], resolver: &TypeResolver) -> Vec<SplitPoint> {
    let items: Vec<Node> = named_children(spec_container(decl))
        .into_iter()
        .filter(|node| is_spec(node) || is_comment(node))
        .collect();
    let (specs, _) = attach_comments(&items, 0);

    let mut points = Vec::new();
    let mut last_type: Option<String> = None;

    for (i, spec) in specs.iter().enumerate() {
        if spec_names(spec.node).len() != 1 {
            continue;
        }

        let typ = resolver.type_of_spec(spec.node);
        if last_type.is_none() {
            last_type = typ;
            continue;
        }

        if typ.is_some() && typ != last_type && has_annotation(spec.node) {
            if let Some(previous) = i.checked_sub(1).map(|p| &specs[p]) {
                points.push(split_point(source, previous, spec));
            }
            last_type = typ;
        }
    }

    points
}

fn split_point(source: &[u8], previous: &Attached, next: &Attached) -> SplitPoint {
    let close = line_end(source, previous.range.end);
    let open = line_start(source, next.range.start);

    if close <= open && is_blank(&source[close..open]) {
        SplitPoint {
            close,
            open,
            inline: false,
        }
    } else {
        SplitPoint {
            close: trim_back(source, next.range.start),
            open: next.range.start,
            inline: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::Parser;

    fn split(source: &str) -> String {
        let parsed = Parser::new()
            .parse("test.go", source.as_bytes().to_vec())
            .unwrap();
        let resolver = TypeResolver::new(parsed.source_bytes(), None);
        String::from_utf8(split_values(&parsed, &resolver)).unwrap()
    }

    #[test]
    fn test_splits_on_annotated_type_change() {
        let source = "package p\n\nconst (\n\tA int = 1\n\tB int = 2\n\n\tC string = \"x\"\n\tD string = \"y\"\n)\n";
        let want = "package p\n\nconst (\n\tA int = 1\n\tB int = 2\n)\n\nconst (\n\tC string = \"x\"\n\tD string = \"y\"\n)\n";
        assert_eq!(split(source), want);
    }

    #[test]
    fn test_unannotated_specs_continue_block() {
        let source = "package p\n\nconst (\n\tInt1 int = iota\n\tInt2\n\tStr1 string = \"a\"\n\tStr2 = \"b\"\n)\n";
        let want = "package p\n\nconst (\n\tInt1 int = iota\n\tInt2\n)\n\nconst (\n\tStr1 string = \"a\"\n\tStr2 = \"b\"\n)\n";
        assert_eq!(split(source), want);
    }

    #[test]
    fn test_comments_travel_with_their_spec() {
        let source = "package p\n\nvar (\n\ta int = 1 // one\n\n\t// b is a string\n\tb string = \"b\"\n)\n";
        let want = "package p\n\nvar (\n\ta int = 1 // one\n)\n\nvar (\n\t// b is a string\n\tb string = \"b\"\n)\n";
        assert_eq!(split(source), want);
    }

    #[test]
    fn test_multi_name_specs_are_never_split() {
        let source = "package p\n\nvar (\n\ta int = 1\n\tb, c string = \"b\", \"c\"\n)\n";
        assert_eq!(split(source), source);
    }

    #[test]
    fn test_single_type_block_unchanged() {
        let source = "package p\n\n// doc\nconst (\n\tA int = 1 // a\n\tB int = 2\n)\n\nfunc f() {}\n";
        assert_eq!(split(source), source);
    }

    #[test]
    fn test_unparenthesized_declarations_unchanged() {
        let source = "package p\n\nvar a int = 1\nvar b string = \"b\"\n";
        assert_eq!(split(source), source);
    }

    #[test]
    fn test_split_is_idempotent() {
        let source = "package p\n\nconst (\n\tA int = 1\n\tB string = \"b\"\n\tC float64 = 1.5\n)\n";
        let once = split(source);
        assert_eq!(split(&once), once);
        assert_eq!(once.matches("const (").count(), 3);
    }

    #[test]
    fn test_specs_on_one_line_split_inline() {
        let source = "package p\n\nvar (a int = 1; b string = \"b\")\n";
        let once = split(source);
        assert_eq!(
            once,
            "package p\n\nvar (\na int = 1;\n)\n\nvar (\nb string = \"b\"\n)\n"
        );
        assert!(Parser::new().parse("test.go", once.into_bytes()).is_ok());
    }

    #[test]
    fn test_inline_split_leaves_no_trailing_whitespace() {
        let source = "package p\n\nvar (\n\ta int = 1;   b string = \"b\"\n)\n";
        let once = split(source);
        assert_eq!(
            once,
            "package p\n\nvar (\n\ta int = 1;\n)\n\nvar (\nb string = \"b\"\n)\n"
        );
    }

    #[test]
    fn test_split_block_with_inline_delimiters() {
        let source = "package p\n\nconst ( A int = 1\nB int = 2\n\nC string = \"x\"\nD string = \"y\" )\n";
        let want = "package p\n\nconst (\nA int = 1\nB int = 2\n)\n\nconst (\nC string = \"x\"\nD string = \"y\"\n)\n";
        assert_eq!(split(source), want);
    }

    #[test]
    fn test_unsplit_inline_block_is_untouched() {
        let source = "package p\n\nvar (a int = 1)\n";
        assert_eq!(split(source), source);
    }

    #[test]
    fn test_crlf_split_uses_crlf() {
        let source = "package p\r\n\r\nvar (\r\n\ta int = 1\r\n\tb string = \"b\"\r\n)\r\n";
        let want = "package p\r\n\r\nvar (\r\n\ta int = 1\r\n)\r\n\r\nvar (\r\n\tb string = \"b\"\r\n)\r\n";
        assert_eq!(split(source), want);
    }
}
