pub mod go;

pub use go::GoGrammar;
