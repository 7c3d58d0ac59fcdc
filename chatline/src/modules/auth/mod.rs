// Auth Module - 认证模块
//
// - domain: 认证状态、用户标识、会话
// - ports: 认证提供方端口
// - infrastructure: Nhost 适配器和内存实现

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{AuthMode, AuthSession, AuthStatus, UserId};
pub use infrastructure::{AuthCall, InMemoryAuthProvider, NhostAuthAdapter, SessionStore};
pub use ports::{AuthError, AuthPort};
