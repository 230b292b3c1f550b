//! Type resolution for grouping purposes.
//!
//! A declaration's type is looked up in three steps: its explicit
//! annotation, then the package scope built from every registered file,
//! then a purely syntactic reading of the initializer. Anything that
//! cannot be resolved is `None` and is never bucketed or split on.

pub mod scope;

pub use scope::PackageScope;

use tree_sitter::Node;

use crate::syntax::nodes::{named_children, spec_names, spec_values, text};

/// Grouping name of a type expression.
///
/// Pointers and generic instantiations reduce to their base name, so
/// `*Foo` and `Foo[int]` both name `Foo`. Other type expressions keep
/// their literal text without whitespace.
pub fn type_name(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "type_identifier" | "identifier" => Some(text(&node, source).to_string()),
        "pointer_type" | "parenthesized_type" => named_children(node)
            .into_iter()
            .next()
            .and_then(|inner| type_name(inner, source)),
        "generic_type" => node
            .child_by_field_name("type")
            .and_then(|base| type_name(base, source)),
        _ => {
            let literal: String = text(&node, source)
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            (!literal.is_empty()).then_some(literal)
        }
    }
}

/// Base type name of a method receiver list.
pub fn receiver_type(receiver: Node, source: &[u8]) -> Option<String> {
    named_children(receiver)
        .into_iter()
        .find(|param| param.kind() == "parameter_declaration")
        .and_then(|param| param.child_by_field_name("type"))
        .and_then(|typ| type_name(typ, source))
}

/// Declared result types of a function, in order.
pub fn result_types(result: Node, source: &[u8]) -> Vec<String> {
    if result.kind() != "parameter_list" {
        return type_name(result, source).into_iter().collect();
    }

    named_children(result)
        .into_iter()
        .filter_map(|param| param.child_by_field_name("type"))
        .filter_map(|typ| type_name(typ, source))
        .collect()
}

pub struct TypeResolver<'a> {
    source: &'a [u8],
    scope: Option<&'a PackageScope>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(source: &'a [u8], scope: Option<&'a PackageScope>) -> Self {
        Self { source, scope }
    }

    /// Type of a `const`/`var` spec, preferring its annotation.
    pub fn type_of_spec(&self, spec: Node) -> Option<String> {
        if let Some(annotation) = spec.child_by_field_name("type") {
            return type_name(annotation, self.source);
        }

        if let (Some(scope), Some(name)) = (self.scope, spec_names(spec).first()) {
            if let Some(typ) = scope.value_type(text(name, self.source)) {
                return Some(typ.to_string());
            }
        }

        spec_values(spec)
            .first()
            .and_then(|value| self.type_of(*value))
    }

    pub fn type_of(&self, expr: Node) -> Option<String> {
        self.scope
            .and_then(|scope| scope.infer(expr, self.source))
            .or_else(|| syntactic_type(expr, self.source))
    }
}

/// Fallback when no semantic information is available: identifiers name
/// themselves and calls name their callee.
fn syntactic_type(expr: Node, source: &[u8]) -> Option<String> {
    match expr.kind() {
        "identifier" => Some(text(&expr, source).to_string()),
        "call_expression" => expr
            .child_by_field_name("function")
            .filter(|callee| callee.kind() == "identifier")
            .map(|callee| text(&callee, source).to_string()),
        _ => None,
    }
}

pub fn has_annotation(spec: Node) -> bool {
    spec.child_by_field_name("type").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::nodes::specs;
    use crate::syntax::parser::{ParsedFile, Parser};

    fn parse(source: &str) -> ParsedFile {
        Parser::new()
            .parse("test.go", source.as_bytes().to_vec())
            .unwrap()
    }

    fn first_decl<'t>(parsed: &'t ParsedFile, kind: &str) -> Node<'t> {
        named_children(parsed.root_node())
            .into_iter()
            .find(|node| node.kind() == kind)
            .unwrap()
    }

    #[test]
    fn test_type_name_strips_pointer() {
        let parsed = parse("package p\n\nfunc (f *Foo) Bar() {}\n");
        let method = first_decl(&parsed, "method_declaration");
        let receiver = method.child_by_field_name("receiver").unwrap();
        assert_eq!(receiver_type(receiver, &parsed.source), Some("Foo".to_string()));
    }

    #[test]
    fn test_generic_receiver_uses_base_name() {
        let parsed = parse("package p\n\nfunc (l *List[T]) Len() int { return 0 }\n");
        let method = first_decl(&parsed, "method_declaration");
        let receiver = method.child_by_field_name("receiver").unwrap();
        assert_eq!(receiver_type(receiver, &parsed.source), Some("List".to_string()));
    }

    #[test]
    fn test_result_types_in_order() {
        let parsed = parse("package p\n\nfunc New() (*Foo, error) { return nil, nil }\n");
        let func = first_decl(&parsed, "function_declaration");
        let result = func.child_by_field_name("result").unwrap();
        assert_eq!(
            result_types(result, &parsed.source),
            vec!["Foo".to_string(), "error".to_string()]
        );
    }

    #[test]
    fn test_single_result_type() {
        let parsed = parse("package p\n\nfunc New() Foo { return Foo{} }\n");
        let func = first_decl(&parsed, "function_declaration");
        let result = func.child_by_field_name("result").unwrap();
        assert_eq!(result_types(result, &parsed.source), vec!["Foo".to_string()]);
    }

    #[test]
    fn test_annotation_wins_over_value() {
        let parsed = parse("package p\n\nvar x Foo = Bar()\n");
        let decl = first_decl(&parsed, "var_declaration");
        let spec = specs(decl)[0];
        let resolver = TypeResolver::new(&parsed.source, None);
        assert_eq!(resolver.type_of_spec(spec), Some("Foo".to_string()));
    }

    #[test]
    fn test_syntactic_fallback_uses_callee() {
        let parsed = parse("package p\n\nvar x = NewFoo(1)\n");
        let decl = first_decl(&parsed, "var_declaration");
        let spec = specs(decl)[0];
        let resolver = TypeResolver::new(&parsed.source, None);
        assert_eq!(resolver.type_of_spec(spec), Some("NewFoo".to_string()));
    }

    #[test]
    fn test_unknown_for_binary_expression() {
        let parsed = parse("package p\n\nvar x = a + b\n");
        let decl = first_decl(&parsed, "var_declaration");
        let spec = specs(decl)[0];
        let resolver = TypeResolver::new(&parsed.source, None);
        assert_eq!(resolver.type_of_spec(spec), None);
    }

    #[test]
    fn test_scope_resolves_constructor_result() {
        let parsed = parse(
            "package p\n\ntype Foo struct{}\n\nfunc NewFoo() *Foo { return &Foo{} }\n\nvar x = NewFoo()\n",
        );
        let scope = PackageScope::build([&parsed]);
        let decl = first_decl(&parsed, "var_declaration");
        let spec = specs(decl)[0];
        let resolver = TypeResolver::new(&parsed.source, Some(&scope));
        assert_eq!(resolver.type_of_spec(spec), Some("Foo".to_string()));
    }

    #[test]
    fn test_literal_array_type_keeps_text() {
        let parsed = parse("package p\n\nvar x []byte\n");
        let decl = first_decl(&parsed, "var_declaration");
        let spec = specs(decl)[0];
        let resolver = TypeResolver::new(&parsed.source, None);
        assert_eq!(resolver.type_of_spec(spec), Some("[]byte".to_string()));
        assert!(has_annotation(spec));
    }
}
