//! The declaration reorganization engine.

pub mod canonical;
pub mod decl;
pub mod group;
pub mod order;
pub mod split;
pub mod writer;

pub use canonical::{Canonicalize, Gofmt, Tidy};
pub use decl::{Declaration, FileLayout, SourceRange};
pub use group::group_declarations;
pub use order::{compare_names, sort_by_name};
pub use split::split_values;
pub use writer::SourceWriter;
