use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::modules::auth::domain::{AuthStatus, UserId};

/// 认证错误类型
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Auth API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Not authenticated")]
    NotAuthenticated,
}

/// 认证提供方端口
///
/// 成功的注册 / 登录 / 登出通过 `status()` 通道广播状态变化
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// 邮箱密码注册
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// 邮箱密码登录
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// 登出
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// 认证状态信号
    fn status(&self) -> watch::Receiver<AuthStatus>;

    /// 当前用户 ID，未认证时为 None
    fn user_id(&self) -> Option<UserId>;

    /// 当前访问令牌，供 GraphQL 请求携带
    ///
    /// 令牌即将过期时实现方可以先刷新再返回
    async fn access_token(&self) -> Option<String>;
}
