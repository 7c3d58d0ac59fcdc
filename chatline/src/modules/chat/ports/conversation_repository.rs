use async_trait::async_trait;
use thiserror::Error;

use super::super::domain::{ConversationId, ConversationSummary};
use crate::modules::auth::UserId;

/// 仓储错误类型
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("GraphQL error: {0}")]
    GraphqlError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

/// 会话仓储端口
///
/// 会话的持久化和排序由托管后端负责，客户端只发起查询和插入
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// 当前用户的全部会话，按创建时间降序，附带最近一条消息内容
    async fn list_for_current_user(&self) -> Result<Vec<ConversationSummary>, RepositoryError>;

    /// 为指定用户创建会话，返回新会话 ID
    async fn create(&self, owner: &UserId) -> Result<ConversationId, RepositoryError>;
}
