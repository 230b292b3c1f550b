//! Session and change tracking
//!
//! A session owns the registered files of one package, runs the
//! reorganization pipeline over them and remembers what changed.

pub mod manager;

pub use manager::{Change, Session};
