pub mod error;
pub mod languages;
pub mod organize;
pub mod resolve;
pub mod session;
pub mod syntax;

pub use error::{GorgError, Result};
pub use languages::GoGrammar;
pub use organize::{group_declarations, split_values, Canonicalize, Declaration, FileLayout, Gofmt, Tidy};
pub use resolve::{PackageScope, TypeResolver};
pub use session::{Change, Session};
pub use syntax::{FileWalker, ParsedFile, Parser, SourceFile, SourceStore};
