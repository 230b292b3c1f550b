pub mod nodes;
pub mod parser;
pub mod store;
pub mod walker;

pub use parser::{ParsedFile, Parser};
pub use store::{SourceFile, SourceStore};
pub use walker::FileWalker;
