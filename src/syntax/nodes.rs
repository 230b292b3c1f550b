//! Small tree-sitter helpers shared by the resolver and the organizer.

use tree_sitter::Node;

const SPEC_KINDS: &[&str] = &[
    "const_spec",
    "var_spec",
    "type_spec",
    "type_alias",
    "import_spec",
];

pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

pub fn is_spec(node: &Node) -> bool {
    SPEC_KINDS.contains(&node.kind())
}

pub fn is_comment(node: &Node) -> bool {
    node.kind() == "comment"
}

/// The node holding a declaration's specs: the `*_spec_list` child when
/// the grammar wraps a parenthesized block, otherwise the declaration.
pub fn spec_container(decl: Node) -> Node {
    named_children(decl)
        .into_iter()
        .find(|child| child.kind().ends_with("_spec_list"))
        .unwrap_or(decl)
}

/// Whether the declaration uses the parenthesized `kw ( ... )` form.
pub fn is_grouped(decl: Node) -> bool {
    let has_paren = |node: Node| {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).any(|child| child.kind() == "(");
        found
    };
    has_paren(decl) || has_paren(spec_container(decl))
}

/// Specs of a declaration in source order.
pub fn specs(decl: Node) -> Vec<Node> {
    named_children(spec_container(decl))
        .into_iter()
        .filter(is_spec)
        .collect()
}

pub fn spec_names(spec: Node) -> Vec<Node> {
    let mut cursor = spec.walk();
    spec.children_by_field_name("name", &mut cursor).collect()
}

pub fn spec_values(spec: Node) -> Vec<Node> {
    spec.child_by_field_name("value")
        .map(named_children)
        .unwrap_or_default()
        .into_iter()
        .filter(|node| !is_comment(node))
        .collect()
}

pub fn text<'s>(node: &Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

/// Offset of the first byte of the line containing `offset`.
pub fn line_start(source: &[u8], offset: usize) -> usize {
    source[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Offset just past the newline ending the line containing `offset`,
/// or the end of the buffer.
pub fn line_end(source: &[u8], offset: usize) -> usize {
    source[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| offset + i + 1)
        .unwrap_or(source.len())
}

/// Line terminator used by the buffer, judged by its first line.
pub fn line_ending(source: &[u8]) -> &'static str {
    match source.iter().position(|&b| b == b'\n') {
        Some(i) if i > 0 && source[i - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

/// Moves `offset` back over spaces and tabs.
pub fn trim_back(source: &[u8], offset: usize) -> usize {
    source[..offset]
        .iter()
        .rposition(|&b| !matches!(b, b' ' | b'\t'))
        .map_or(0, |i| i + 1)
}

pub fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
