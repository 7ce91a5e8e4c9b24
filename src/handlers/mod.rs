//! HTTP handlers for entity reads.

pub mod find;
pub use find::*;
