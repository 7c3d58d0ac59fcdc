use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler};
use crate::modules::chat::domain::ConversationId;
use crate::modules::chat::ports::{MessageRepository, MessageStream};

/// 订阅会话消息
#[derive(Debug, Clone)]
pub struct SubscribeMessagesQuery {
    pub conversation_id: ConversationId,
}

impl SubscribeMessagesQuery {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self { conversation_id }
    }
}

/// 订阅消息查询处理器
pub struct SubscribeMessagesHandler {
    message_repository: Arc<dyn MessageRepository>,
}

impl SubscribeMessagesHandler {
    pub fn new(message_repository: Arc<dyn MessageRepository>) -> Self {
        Self { message_repository }
    }
}

#[async_trait]
impl QueryHandler<SubscribeMessagesQuery, MessageStream> for SubscribeMessagesHandler {
    async fn handle(&self, query: SubscribeMessagesQuery) -> Result<MessageStream, ApplicationError> {
        tracing::debug!(conversation_id = %query.conversation_id, "subscribing to messages");
        let stream = self
            .message_repository
            .subscribe(query.conversation_id)
            .await?;
        Ok(stream)
    }
}
