// Auth Domain Layer

mod session;
mod status;

pub use session::*;
pub use status::*;
