//! Dynamic query engine: field resolution, predicates, ordering, and assembly.

mod assemble;
mod filter;
mod path;
mod predicate;
mod sort;

pub use assemble::*;
pub use filter::*;
pub use path::*;
pub use predicate::*;
pub use sort::*;
