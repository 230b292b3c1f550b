//! Top-level declarations of one file and the byte ranges they own.

use tree_sitter::Node;

use crate::error::{GorgError, Result};
use crate::resolve::{receiver_type, result_types, TypeResolver};
use crate::syntax::nodes::{
    is_comment, is_grouped, line_end, named_children, spec_names, specs, text,
};
use crate::syntax::parser::ParsedFile;

/// Half-open byte range `[start, end)` into a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A node together with the comments it owns: the comments preceding it
/// (back to the previous node) and the comments trailing it on its last
/// line.
#[derive(Debug, Clone, Copy)]
pub struct Attached<'t> {
    pub node: Node<'t>,
    pub range: SourceRange,
}

/// Attaches comments to the non-comment nodes among `items`, ignoring
/// anything that starts before `from`. Comments after the last node are
/// returned as a separate trailer range.
pub fn attach_comments<'t>(
    items: &[Node<'t>],
    from: usize,
) -> (Vec<Attached<'t>>, Option<SourceRange>) {
    let mut attached: Vec<Attached<'t>> = Vec::new();
    let mut pending: Option<SourceRange> = None;
    let mut last_row: Option<usize> = None;

    for node in items.iter().filter(|node| node.start_byte() >= from) {
        if is_comment(node) {
            let same_line = last_row == Some(node.start_position().row);
            if let Some(run) = pending.as_mut() {
                run.end = node.end_byte();
            } else if let (true, Some(last)) = (same_line, attached.last_mut()) {
                last.range.end = node.end_byte();
                last_row = Some(node.end_position().row);
            } else {
                pending = Some(SourceRange::new(node.start_byte(), node.end_byte()));
            }
            continue;
        }

        let start = pending.take().map_or(node.start_byte(), |run| run.start);
        attached.push(Attached {
            node: *node,
            range: SourceRange::new(start, node.end_byte()),
        });
        last_row = Some(node.end_position().row);
    }

    (attached, pending)
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub range: SourceRange,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ValueDecl {
    pub range: SourceRange,
    pub grouped: bool,
    pub names: Vec<String>,
    /// Number of names declared by the first spec.
    pub leading_names: usize,
    /// Resolved type of the first spec.
    pub leading_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub range: SourceRange,
    pub grouped: bool,
    pub names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub range: SourceRange,
    pub name: String,
    pub results: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub range: SourceRange,
    pub name: String,
    pub receiver: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Import(ImportDecl),
    Const(ValueDecl),
    Var(ValueDecl),
    Type(TypeDecl),
    Function(FunctionDecl),
    Method(MethodDecl),
}

impl Declaration {
    pub fn range(&self) -> SourceRange {
        match self {
            Self::Import(d) => d.range,
            Self::Const(d) | Self::Var(d) => d.range,
            Self::Type(d) => d.range,
            Self::Function(d) => d.range,
            Self::Method(d) => d.range,
        }
    }

    /// Name used to order the declaration inside its collection.
    pub fn sort_name(&self) -> &str {
        match self {
            Self::Import(d) => d.paths.first().map_or("import", String::as_str),
            Self::Const(_) => "const",
            Self::Var(_) => "var",
            Self::Type(_) => "type",
            Self::Function(d) => &d.name,
            Self::Method(d) => &d.name,
        }
    }
}

/// A file split into its package header, its declarations and any
/// comments trailing the last declaration.
#[derive(Debug, Clone)]
pub struct FileLayout {
    pub header: SourceRange,
    pub declarations: Vec<Declaration>,
    pub trailer: Option<SourceRange>,
}

impl FileLayout {
    pub fn extract(id: &str, parsed: &ParsedFile, resolver: &TypeResolver) -> Result<Self> {
        let source = parsed.source_bytes();
        let items = named_children(parsed.root_node());

        let clause = items
            .iter()
            .find(|node| node.kind() == "package_clause")
            .ok_or_else(|| GorgError::syntax(id, 1, 1, "expected 'package' clause"))?;

        // the header runs to the end of the package line, including any
        // comment that starts on it
        let package_row = clause.end_position().row;
        let header_end = items
            .iter()
            .filter(|node| is_comment(node) && node.start_position().row == package_row)
            .map(|node| node.end_byte())
            .fold(clause.end_byte(), usize::max);
        let header = SourceRange::new(0, line_end(source, header_end));

        let (attached, trailer) = attach_comments(&items, header.end);
        let declarations = attached
            .iter()
            .map(|item| classify(id, item, source, resolver))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            header,
            declarations,
            trailer,
        })
    }
}

fn classify(
    id: &str,
    item: &Attached,
    source: &[u8],
    resolver: &TypeResolver,
) -> Result<Declaration> {
    let node = item.node;
    let range = item.range;

    let decl = match node.kind() {
        "import_declaration" => Declaration::Import(ImportDecl {
            range,
            paths: specs(node)
                .iter()
                .filter_map(|spec| spec.child_by_field_name("path"))
                .map(|path| text(&path, source).trim_matches(|c| c == '"' || c == '`').to_string())
                .collect(),
        }),
        "const_declaration" => Declaration::Const(value_decl(node, range, source, resolver)),
        "var_declaration" => Declaration::Var(value_decl(node, range, source, resolver)),
        "type_declaration" => Declaration::Type(TypeDecl {
            range,
            grouped: is_grouped(node),
            names: specs(node)
                .iter()
                .filter_map(|spec| spec.child_by_field_name("name"))
                .map(|name| text(&name, source).to_string())
                .collect(),
        }),
        "function_declaration" => Declaration::Function(FunctionDecl {
            range,
            name: field_text(node, "name", source),
            results: node
                .child_by_field_name("result")
                .map(|result| result_types(result, source))
                .unwrap_or_default(),
        }),
        "method_declaration" => Declaration::Method(MethodDecl {
            range,
            name: field_text(node, "name", source),
            receiver: node
                .child_by_field_name("receiver")
                .and_then(|receiver| receiver_type(receiver, source)),
        }),
        "ERROR" => {
            let position = node.start_position();
            return Err(GorgError::syntax(
                id,
                position.row + 1,
                position.column + 1,
                "invalid declaration",
            ));
        }
        kind => {
            return Err(GorgError::UnknownDeclaration {
                id: id.to_string(),
                line: node.start_position().row + 1,
                kind: kind.to_string(),
            })
        }
    };

    Ok(decl)
}

fn value_decl(node: Node, range: SourceRange, source: &[u8], resolver: &TypeResolver) -> ValueDecl {
    let specs = specs(node);
    let first = specs.first();

    ValueDecl {
        range,
        grouped: is_grouped(node),
        names: specs
            .iter()
            .flat_map(|spec| spec_names(*spec))
            .map(|name| text(&name, source).to_string())
            .collect(),
        leading_names: first.map_or(0, |spec| spec_names(*spec).len()),
        leading_type: first.and_then(|spec| resolver.type_of_spec(*spec)),
    }
}

fn field_text(node: Node, field: &str, source: &[u8]) -> String {
    node.child_by_field_name(field)
        .map(|child| text(&child, source).to_string())
        .unwrap_or_default()
}
