//! Groups a file's declarations by the type they belong to.
//!
//! The output is: package header, imports, unbucketed values,
//! unbucketed functions, then one bucket per type in name order. A
//! bucket holds the type declaration followed by its values, functions
//! and methods.

use std::collections::HashMap;

use tracing::debug;

use super::decl::{Declaration, FileLayout, SourceRange};
use super::order::sort_by_name;
use super::writer::SourceWriter;

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    range: SourceRange,
}

impl Entry {
    fn of(decl: &Declaration) -> Self {
        Self {
            name: decl.sort_name().to_string(),
            range: decl.range(),
        }
    }
}

#[derive(Debug)]
struct TypeBucket {
    name: String,
    range: SourceRange,
    values: Vec<Entry>,
    functions: Vec<Entry>,
    methods: Vec<Entry>,
}

impl TypeBucket {
    fn new(name: &str, range: SourceRange) -> Self {
        Self {
            name: name.to_string(),
            range,
            values: Vec::new(),
            functions: Vec::new(),
            methods: Vec::new(),
        }
    }

    fn write(mut self, writer: &mut SourceWriter) {
        writer.paragraph(self.range);
        write_sorted(&mut self.values, writer);
        write_sorted(&mut self.functions, writer);
        write_sorted(&mut self.methods, writer);
    }
}

fn write_sorted(entries: &mut [Entry], writer: &mut SourceWriter) {
    sort_by_name(entries, |entry| entry.name.as_str());
    for entry in entries.iter() {
        writer.paragraph(entry.range);
    }
}

#[derive(Debug, Default)]
struct Organizer {
    imports: Vec<Entry>,
    values: Vec<Entry>,
    functions: Vec<Entry>,
    buckets: Vec<TypeBucket>,
    index: HashMap<String, usize>,
}

impl Organizer {
    /// Creates one bucket per non-parenthesized type declaration.
    fn index_types(&mut self, layout: &FileLayout) {
        for decl in &layout.declarations {
            let Declaration::Type(typ) = decl else {
                continue;
            };
            if typ.grouped {
                continue;
            }
            if let Some(name) = typ.names.first() {
                self.index.insert(name.clone(), self.buckets.len());
                self.buckets.push(TypeBucket::new(name, typ.range));
            }
        }
    }

    fn bucket(&mut self, name: Option<&str>) -> Option<&mut TypeBucket> {
        let index = *self.index.get(name?)?;
        self.buckets.get_mut(index)
    }

    fn classify(&mut self, decl: &Declaration) {
        let entry = Entry::of(decl);

        match decl {
            Declaration::Import(_) => self.imports.push(entry),
            Declaration::Const(value) | Declaration::Var(value) => {
                let owner = if value.grouped && value.leading_names == 1 {
                    value.leading_type.as_deref()
                } else {
                    None
                };
                match self.bucket(owner) {
                    Some(bucket) => bucket.values.push(entry),
                    None => self.values.push(entry),
                }
            }
            Declaration::Type(typ) => {
                if typ.grouped {
                    self.values.push(entry);
                }
            }
            Declaration::Function(func) => {
                let owner = func
                    .results
                    .iter()
                    .find(|result| self.index.contains_key(result.as_str()))
                    .cloned();
                match self.bucket(owner.as_deref()) {
                    Some(bucket) => bucket.functions.push(entry),
                    None => self.functions.push(entry),
                }
            }
            Declaration::Method(method) => match self.bucket(method.receiver.as_deref()) {
                Some(bucket) => bucket.methods.push(entry),
                None => {
                    debug!(
                        method = %method.name,
                        receiver = ?method.receiver,
                        "no bucket for receiver, keeping method with functions"
                    );
                    self.functions.push(entry);
                }
            },
        }
    }

    fn write(mut self, layout: &FileLayout, writer: &mut SourceWriter) {
        writer.copy(layout.header);
        writer.end_line();

        write_sorted(&mut self.imports, writer);
        write_sorted(&mut self.values, writer);
        write_sorted(&mut self.functions, writer);

        sort_by_name(&mut self.buckets, |bucket| bucket.name.as_str());
        for bucket in self.buckets {
            bucket.write(writer);
        }

        if let Some(trailer) = layout.trailer {
            writer.paragraph(trailer);
        }
    }
}

/// Reassembles the file in grouped order, copying every declaration's
/// bytes verbatim.
pub fn group_declarations(layout: &FileLayout, source: &[u8]) -> Vec<u8> {
    let mut organizer = Organizer::default();
    organizer.index_types(layout);
    for decl in &layout.declarations {
        organizer.classify(decl);
    }

    debug!(
        imports = organizer.imports.len(),
        values = organizer.values.len(),
        functions = organizer.functions.len(),
        buckets = organizer.buckets.len(),
        "classified declarations"
    );

    let mut writer = SourceWriter::new(source);
    organizer.write(layout, &mut writer);
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::TypeResolver;
    use crate::syntax::parser::Parser;

    fn group(source: &str) -> String {
        let parsed = Parser::new()
            .parse("test.go", source.as_bytes().to_vec())
            .unwrap();
        let resolver = TypeResolver::new(parsed.source_bytes(), None);
        let layout = FileLayout::extract("test.go", &parsed, &resolver).unwrap();
        String::from_utf8(group_declarations(&layout, parsed.source_bytes())).unwrap()
    }

    #[test]
    fn test_method_moves_after_its_type() {
        let source = r#"package p

func (f *Foo) Bar() {}

func helper() {}

type Foo struct{}
"#;
        let want = r#"package p

func helper() {}

type Foo struct{}

func (f *Foo) Bar() {}
"#;
        assert_eq!(group(source), want);
    }

    #[test]
    fn test_constructor_follows_type() {
        let source = r#"package p

func NewFoo() (*Foo, error) { return nil, nil }

type Foo struct{}
"#;
        let want = r#"package p

type Foo struct{}

func NewFoo() (*Foo, error) { return nil, nil }
"#;
        assert_eq!(group(source), want);
    }

    #[test]
    fn test_method_without_type_stays_with_functions() {
        let source = r#"package p

func (o *Other) Method() {}

func alpha() {}
"#;
        let want = r#"package p

func alpha() {}

func (o *Other) Method() {}
"#;
        assert_eq!(group(source), want);
    }

    #[test]
    fn test_typed_block_joins_bucket() {
        let source = r#"package p

const (
	KindA Kind = iota
	KindB
)

var unrelated = 1

type Kind int
"#;
        let want = r#"package p

var unrelated = 1

type Kind int

const (
	KindA Kind = iota
	KindB
)
"#;
        assert_eq!(group(source), want);
    }

    #[test]
    fn test_unparenthesized_value_stays_default() {
        let source = "package p\n\ntype Kind int\n\nvar k Kind = 1\n";
        let want = "package p\n\nvar k Kind = 1\n\ntype Kind int\n";
        assert_eq!(group(source), want);
    }

    #[test]
    fn test_grouped_types_are_not_bucketed() {
        let source = r#"package p

func (a A) String() string { return "" }

type (
	A int
	B int
)
"#;
        let want = r#"package p

type (
	A int
	B int
)

func (a A) String() string { return "" }
"#;
        assert_eq!(group(source), want);
    }

    #[test]
    fn test_buckets_and_methods_sorted() {
        let source = r#"package p

type b struct{}

func (x b) Zed() {}

func (x b) alpha() {}

type A struct{}
"#;
        let want = r#"package p

type A struct{}

type b struct{}

func (x b) alpha() {}

func (x b) Zed() {}
"#;
        assert_eq!(group(source), want);
    }

    #[test]
    fn test_header_imports_and_trailer() {
        let source = r#"// Package p does things.
package p

import "os"

func f() { os.Exit(0) }

// trailing note
"#;
        assert_eq!(group(source), source);
    }

    #[test]
    fn test_extra_blank_lines_collapse() {
        let source = "package p\n\n\n\nfunc a() {}\n\n\n\nfunc b() {}\n";
        assert_eq!(group(source), "package p\n\nfunc a() {}\n\nfunc b() {}\n");
    }

    #[test]
    fn test_crlf_line_endings_are_kept() {
        let source = "package p\r\n\r\nfunc b() {}\r\n\r\nfunc a() {} // a\r\n";
        assert_eq!(
            group(source),
            "package p\r\n\r\nfunc a() {} // a\r\n\r\nfunc b() {}\r\n"
        );
    }
}
