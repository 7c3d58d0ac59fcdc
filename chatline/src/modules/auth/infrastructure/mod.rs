// Auth Infrastructure Layer

mod in_memory_auth;
mod nhost_auth;
mod session_store;

pub use in_memory_auth::*;
pub use nhost_auth::*;
pub use session_store::*;
