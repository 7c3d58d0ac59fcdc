use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use super::super::domain::{ConversationId, Message, MessageId};
use super::conversation_repository::RepositoryError;

/// 消息推送流：每一项是该会话当前的完整消息快照
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Vec<Message>, RepositoryError>> + Send>>;

/// 消息仓储端口
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 插入一条用户消息，发送方固定为 `user`
    async fn insert_user_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<MessageId, RepositoryError>;

    /// 订阅会话消息，按创建时间升序推送
    ///
    /// 丢弃返回的流即取消订阅
    async fn subscribe(&self, conversation_id: ConversationId)
        -> Result<MessageStream, RepositoryError>;
}
