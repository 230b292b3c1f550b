use thiserror::Error;

#[derive(Error, Debug)]
pub enum GorgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{id}: file already registered")]
    AlreadyExists { id: String },

    #[error("{id}: file not registered")]
    NotRegistered { id: String },

    #[error("{id}:{line}:{column}: syntax error: {message}")]
    Syntax {
        id: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("package mismatch: {first} declares package {first_package}, {second} declares package {second_package}")]
    PackageMismatch {
        first: String,
        first_package: String,
        second: String,
        second_package: String,
    },

    #[error("{id}:{line}: unknown declaration node {kind}")]
    UnknownDeclaration { id: String, line: usize, kind: String },

    /// Canonicalization failed; `output` holds the raw, unformatted buffer.
    #[error("{id}: unexpected formatting error: {message}")]
    Format {
        id: String,
        message: String,
        output: Vec<u8>,
    },

    #[error("Language error: {0}")]
    Language(String),

    #[error("failed to write {id}: {source}")]
    Write {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

impl GorgError {
    pub(crate) fn syntax(id: &str, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            id: id.to_string(),
            line,
            column,
            message: message.into(),
        }
    }

    /// The identifier of the file the error is about, if any.
    pub fn file_id(&self) -> Option<&str> {
        match self {
            Self::AlreadyExists { id }
            | Self::NotRegistered { id }
            | Self::Syntax { id, .. }
            | Self::UnknownDeclaration { id, .. }
            | Self::Format { id, .. }
            | Self::Write { id, .. } => Some(id),
            Self::PackageMismatch { second, .. } => Some(second),
            Self::Io(_) | Self::Language(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GorgError>;
