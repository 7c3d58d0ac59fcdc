use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::super::domain::ConversationId;

/// 机器人动作错误
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Action rejected: {0}")]
    Rejected(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

/// 动作返回的载荷，界面只关心成功与否
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    pub response: Option<String>,
}

/// 机器人动作端口
///
/// 动作由后端执行，机器人的回复通过消息订阅回到客户端
#[async_trait]
pub trait BotPort: Send + Sync {
    async fn trigger_reply(
        &self,
        conversation_id: ConversationId,
        message: &str,
    ) -> Result<BotReply, BotError>;
}
