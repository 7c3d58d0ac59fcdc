use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler};
use crate::infrastructure::EventBus;
use crate::modules::chat::domain::{
    BotTriggerFailedEvent, BotTriggeredEvent, ChatEvent, ConversationId, MessageId,
    UserMessagePersistedEvent,
};
use crate::modules::chat::ports::{BotPort, BotReply, MessageRepository};

/// 发送消息命令
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub conversation_id: ConversationId,
    /// 原样发送，不做 trim
    pub content: String,
}

impl SendMessageCommand {
    pub fn new(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            content: content.into(),
        }
    }
}

/// 发送消息响应
#[derive(Debug, Clone)]
pub struct SendMessageResponse {
    pub message_id: MessageId,
    pub bot_reply: BotReply,
}

/// 发送消息命令处理器
///
/// 两步顺序执行：先持久化用户消息，再触发机器人动作。
/// 两步之间没有事务：第二步失败时第一步的消息保留，不重试也不回滚
pub struct SendMessageHandler {
    message_repository: Arc<dyn MessageRepository>,
    bot: Arc<dyn BotPort>,
    event_bus: Arc<EventBus>,
}

impl SendMessageHandler {
    pub fn new(
        message_repository: Arc<dyn MessageRepository>,
        bot: Arc<dyn BotPort>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            message_repository,
            bot,
            event_bus,
        }
    }
}

#[async_trait]
impl CommandHandler<SendMessageCommand, SendMessageResponse> for SendMessageHandler {
    async fn handle(
        &self,
        command: SendMessageCommand,
    ) -> Result<SendMessageResponse, ApplicationError> {
        if command.content.trim().is_empty() {
            return Err(ApplicationError::ValidationError(
                "Message content cannot be empty".to_string(),
            ));
        }

        let conversation_id = command.conversation_id;

        // 1. 保存用户消息
        let message_id = self
            .message_repository
            .insert_user_message(conversation_id, &command.content)
            .await?;

        tracing::debug!(%conversation_id, %message_id, "user message persisted");
        self.event_bus
            .publish(ChatEvent::UserMessagePersisted(UserMessagePersistedEvent {
                conversation_id,
                message_id,
                content: command.content.clone(),
                timestamp: Utc::now(),
            }));

        // 2. 触发机器人回复
        let bot_reply = match self.bot.trigger_reply(conversation_id, &command.content).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(%conversation_id, %message_id, "bot trigger failed: {}", e);
                self.event_bus
                    .publish(ChatEvent::BotTriggerFailed(BotTriggerFailedEvent {
                        conversation_id,
                        message_id,
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    }));
                return Err(e.into());
            }
        };

        self.event_bus
            .publish(ChatEvent::BotTriggered(BotTriggeredEvent {
                conversation_id,
                timestamp: Utc::now(),
            }));

        Ok(SendMessageResponse {
            message_id,
            bot_reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::Sender;
    use crate::modules::chat::infrastructure::{BackendCall, InMemoryChatBackend};

    fn handler_for(backend: &Arc<InMemoryChatBackend>, bus: Arc<EventBus>) -> SendMessageHandler {
        SendMessageHandler::new(backend.clone(), backend.clone(), bus)
    }

    #[tokio::test]
    async fn test_persists_then_triggers_bot() {
        let backend = Arc::new(InMemoryChatBackend::new());
        let conversation_id = ConversationId::new();
        let handler = handler_for(&backend, Arc::new(EventBus::new()));

        handler
            .handle(SendMessageCommand::new(conversation_id, "hello"))
            .await
            .unwrap();

        let messages = backend.messages(conversation_id).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender(), Sender::User);
        assert_eq!(messages[0].content(), "hello");

        assert_eq!(
            backend.calls().await,
            vec![
                BackendCall::InsertMessage {
                    conversation_id,
                    content: "hello".to_string(),
                },
                BackendCall::TriggerBot {
                    conversation_id,
                    message: "hello".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected_without_calls() {
        let backend = Arc::new(InMemoryChatBackend::new());
        let handler = handler_for(&backend, Arc::new(EventBus::new()));

        let result = handler
            .handle(SendMessageCommand::new(ConversationId::new(), "  \n\t "))
            .await;

        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_bot_failure_keeps_user_message() {
        let backend = Arc::new(InMemoryChatBackend::new());
        backend.fail_bot(true);
        let bus = Arc::new(EventBus::new());
        let mut events = bus.subscribe();
        let conversation_id = ConversationId::new();
        let handler = handler_for(&backend, bus);

        let result = handler
            .handle(SendMessageCommand::new(conversation_id, "hello"))
            .await;

        assert!(matches!(result, Err(ApplicationError::BotError(_))));
        assert_eq!(backend.messages(conversation_id).await.len(), 1);

        assert_eq!(events.recv().await.unwrap().event_type(), "message.persisted");
        assert_eq!(events.recv().await.unwrap().event_type(), "bot.failed");
    }

    #[tokio::test]
    async fn test_insert_failure_skips_bot() {
        let backend = Arc::new(InMemoryChatBackend::new());
        backend.fail_inserts(true);
        let handler = handler_for(&backend, Arc::new(EventBus::new()));

        let result = handler
            .handle(SendMessageCommand::new(ConversationId::new(), "hello"))
            .await;

        assert!(matches!(result, Err(ApplicationError::RepositoryError(_))));
        assert!(backend
            .calls()
            .await
            .iter()
            .all(|call| !matches!(call, BackendCall::TriggerBot { .. })));
    }
}
