use thiserror::Error;

use crate::modules::auth::AuthError;
use crate::modules::chat::{ApplicationError, GraphqlError};
use crate::modules::config::ConfigError;

/// 启动和运行阶段的顶层错误
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Auth error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Chat error: {0}")]
    ChatError(#[from] ApplicationError),

    #[error("Backend error: {0}")]
    BackendError(#[from] GraphqlError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
