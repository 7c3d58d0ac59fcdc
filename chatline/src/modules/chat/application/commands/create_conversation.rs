use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler};
use crate::infrastructure::EventBus;
use crate::modules::auth::UserId;
use crate::modules::chat::domain::{ChatEvent, ConversationCreatedEvent, ConversationId};
use crate::modules::chat::ports::ConversationRepository;

/// 创建会话命令
#[derive(Debug, Clone)]
pub struct CreateConversationCommand {
    /// 会话所属用户
    pub owner: UserId,
}

impl CreateConversationCommand {
    pub fn new(owner: UserId) -> Self {
        Self { owner }
    }
}

/// 创建会话命令响应
#[derive(Debug, Clone)]
pub struct CreateConversationResponse {
    pub conversation_id: ConversationId,
}

/// 创建会话命令处理器
pub struct CreateConversationHandler {
    conversation_repository: Arc<dyn ConversationRepository>,
    event_bus: Arc<EventBus>,
}

impl CreateConversationHandler {
    pub fn new(
        conversation_repository: Arc<dyn ConversationRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            conversation_repository,
            event_bus,
        }
    }
}

#[async_trait]
impl CommandHandler<CreateConversationCommand, CreateConversationResponse>
    for CreateConversationHandler
{
    async fn handle(
        &self,
        command: CreateConversationCommand,
    ) -> Result<CreateConversationResponse, ApplicationError> {
        let conversation_id = self.conversation_repository.create(&command.owner).await?;

        tracing::info!(%conversation_id, owner = %command.owner, "conversation created");
        self.event_bus
            .publish(ChatEvent::ConversationCreated(ConversationCreatedEvent {
                conversation_id,
                timestamp: Utc::now(),
            }));

        Ok(CreateConversationResponse { conversation_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::infrastructure::InMemoryChatBackend;

    #[tokio::test]
    async fn test_create_conversation_for_owner() {
        let owner = UserId::new("user-1");
        let backend = Arc::new(InMemoryChatBackend::new());
        backend.set_current_user(Some(owner.clone())).await;
        let bus = Arc::new(EventBus::new());
        let mut events = bus.subscribe();
        let handler = CreateConversationHandler::new(backend.clone(), bus);

        let response = handler
            .handle(CreateConversationCommand::new(owner.clone()))
            .await
            .unwrap();

        let conversations = backend.conversations().await;
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id(), response.conversation_id);
        assert_eq!(conversations[0].owner(), &owner);

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type(), "conversation.created");
        assert_eq!(event.conversation_id(), response.conversation_id);
    }
}
