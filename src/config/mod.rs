pub mod types;
pub mod loader;
pub mod validator;
pub mod resolved;
pub mod inventory;

pub use types::*;
pub use loader::*;
pub use validator::*;
pub use resolved::*;
