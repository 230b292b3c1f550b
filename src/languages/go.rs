use once_cell::sync::OnceCell;
use tree_sitter::Query;

pub struct GoGrammar;

// Static query caches for Go
static GO_TYPES_QUERY: OnceCell<Query> = OnceCell::new();
static GO_FUNCTIONS_QUERY: OnceCell<Query> = OnceCell::new();

impl GoGrammar {
    pub fn name(&self) -> &'static str {
        "go"
    }

    pub fn file_extensions(&self) -> &[&'static str] {
        &["go"]
    }

    pub fn language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    /// Every named type, grouped or not.
    pub fn types_query(&self) -> &str {
        r#"
        (type_declaration
            (type_spec
                name: (type_identifier) @name
            )
        ) @type

        (type_declaration
            (type_alias
                name: (type_identifier) @name
            )
        ) @alias
        "#
    }

    /// Free functions that declare a result.
    pub fn functions_query(&self) -> &str {
        r#"
        (function_declaration
            name: (identifier) @name
            result: (_) @result
        ) @function
        "#
    }

    pub fn cached_types_query(&self) -> Option<&'static Query> {
        GO_TYPES_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.types_query()))
            .ok()
    }

    pub fn cached_functions_query(&self) -> Option<&'static Query> {
        GO_FUNCTIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.functions_query()))
            .ok()
    }
}
