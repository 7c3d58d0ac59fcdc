// Auth Ports Layer

mod auth_port;

pub use auth_port::*;
