//! Package scope: the cross-file view of declared types, function
//! results and package-level values.
//!
//! This is a best-effort stand-in for a real type checker. References
//! that leave the package (imports, builtins it does not model) simply
//! stay unresolved.

use std::collections::{HashMap, HashSet};

use tree_sitter::{Node, QueryCursor, StreamingIterator};
use tracing::debug;

use super::{result_types, type_name};
use crate::languages::GoGrammar;
use crate::syntax::nodes::{named_children, spec_names, spec_values, specs, text};
use crate::syntax::parser::ParsedFile;

#[derive(Debug, Default, Clone)]
pub struct PackageScope {
    types: HashSet<String>,
    functions: HashMap<String, String>,
    values: HashMap<String, String>,
}

impl PackageScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the scope from every file of the package. Types and
    /// function results are collected first so value initializers in
    /// any file can refer to them.
    pub fn build<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = &'a ParsedFile>,
    {
        let files: Vec<&ParsedFile> = files.into_iter().collect();
        let mut scope = Self::new();

        for parsed in &files {
            scope.collect_types(parsed);
            scope.collect_functions(parsed);
        }
        for parsed in &files {
            scope.collect_values(parsed);
        }

        debug!(
            types = scope.types.len(),
            functions = scope.functions.len(),
            values = scope.values.len(),
            "package scope built"
        );
        scope
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    pub fn function_result(&self, name: &str) -> Option<&str> {
        self.functions.get(name).map(String::as_str)
    }

    pub fn value_type(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn collect_types(&mut self, parsed: &ParsedFile) {
        let Some(query) = GoGrammar.cached_types_query() else {
            return;
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            let mut name: Option<&str> = None;
            let mut top_level = false;

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "name" => name = Some(parsed.node_text(&capture.node)),
                    "type" | "alias" => top_level = is_top_level(&capture.node),
                    _ => {}
                }
            }

            if let (Some(name), true) = (name, top_level) {
                self.types.insert(name.to_string());
            }
        }
    }

    fn collect_functions(&mut self, parsed: &ParsedFile) {
        let Some(query) = GoGrammar.cached_functions_query() else {
            return;
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            let mut name: Option<&str> = None;
            let mut results = Vec::new();

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "name" => name = Some(parsed.node_text(&capture.node)),
                    "result" => results = result_types(capture.node, parsed.source_bytes()),
                    _ => {}
                }
            }

            // a call only has a usable type when it yields exactly one value
            if let (Some(name), [result]) = (name, results.as_slice()) {
                self.functions.insert(name.to_string(), result.clone());
            }
        }
    }

    fn collect_values(&mut self, parsed: &ParsedFile) {
        let source = parsed.source_bytes();

        for decl in named_children(parsed.root_node()) {
            let is_const = match decl.kind() {
                "const_declaration" => true,
                "var_declaration" => false,
                _ => continue,
            };

            // types of the previous spec, repeated by bare const specs
            let mut previous: Vec<Option<String>> = Vec::new();

            for spec in specs(decl) {
                let names = spec_names(spec);
                let values = spec_values(spec);

                let types: Vec<Option<String>> = match spec.child_by_field_name("type") {
                    Some(annotation) => vec![type_name(annotation, source); names.len()],
                    None if is_const && values.is_empty() => (0..names.len())
                        .map(|i| previous.get(i).or(previous.first()).cloned().flatten())
                        .collect(),
                    None => (0..names.len())
                        .map(|i| values.get(i).and_then(|value| self.infer(*value, source)))
                        .collect(),
                };

                for (name, typ) in names.iter().zip(&types) {
                    if let Some(typ) = typ {
                        self.values.insert(text(name, source).to_string(), typ.clone());
                    }
                }
                previous = types;
            }
        }
    }

    /// Semantic type of an initializer expression.
    pub fn infer(&self, expr: Node, source: &[u8]) -> Option<String> {
        let basic = |name: &str| Some(name.to_string());

        match expr.kind() {
            "int_literal" | "iota" => basic("int"),
            "float_literal" => basic("float64"),
            "imaginary_literal" => basic("complex128"),
            "rune_literal" => basic("rune"),
            "interpreted_string_literal" | "raw_string_literal" => basic("string"),
            "true" | "false" => basic("bool"),
            "identifier" => self.value_type(text(&expr, source)).map(str::to_string),
            "parenthesized_expression" => named_children(expr)
                .into_iter()
                .next()
                .and_then(|inner| self.infer(inner, source)),
            "unary_expression" => {
                let operator = expr.child_by_field_name("operator")?;
                match text(&operator, source) {
                    "&" | "-" | "+" | "^" => expr
                        .child_by_field_name("operand")
                        .and_then(|operand| self.infer(operand, source)),
                    "!" => basic("bool"),
                    _ => None,
                }
            }
            "composite_literal" | "type_conversion_expression" => expr
                .child_by_field_name("type")
                .and_then(|typ| type_name(typ, source)),
            "call_expression" => self.infer_call(expr, source),
            _ => None,
        }
    }

    fn infer_call(&self, call: Node, source: &[u8]) -> Option<String> {
        let callee = call.child_by_field_name("function")?;
        if callee.kind() != "identifier" {
            return None;
        }

        let name = text(&callee, source);
        if self.is_type(name) {
            return Some(name.to_string());
        }
        if name == "new" {
            return call
                .child_by_field_name("arguments")
                .and_then(|args| named_children(args).into_iter().next())
                .and_then(|arg| type_name(arg, source));
        }
        self.function_result(name).map(str::to_string)
    }
}

fn is_top_level(decl: &Node) -> bool {
    decl.parent().map(|p| p.kind()) == Some("source_file")
}
