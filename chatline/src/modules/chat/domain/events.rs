use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{ConversationId, MessageId};

/// 领域事件基础 trait
pub trait DomainEvent: Clone + Send + Sync {
    fn event_type(&self) -> &'static str;
    fn timestamp(&self) -> DateTime<Utc>;
}

/// 会话创建事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationCreatedEvent {
    pub conversation_id: ConversationId,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for ConversationCreatedEvent {
    fn event_type(&self) -> &'static str {
        "conversation.created"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// 用户消息已持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessagePersistedEvent {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for UserMessagePersistedEvent {
    fn event_type(&self) -> &'static str {
        "message.persisted"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// 机器人动作已触发
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotTriggeredEvent {
    pub conversation_id: ConversationId,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for BotTriggeredEvent {
    fn event_type(&self) -> &'static str {
        "bot.triggered"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// 机器人动作失败；用户消息仍保留，不重试也不回滚
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotTriggerFailedEvent {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for BotTriggerFailedEvent {
    fn event_type(&self) -> &'static str {
        "bot.failed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// 聊天领域事件枚举
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatEvent {
    ConversationCreated(ConversationCreatedEvent),
    UserMessagePersisted(UserMessagePersistedEvent),
    BotTriggered(BotTriggeredEvent),
    BotTriggerFailed(BotTriggerFailedEvent),
}

impl ChatEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ChatEvent::ConversationCreated(e) => e.event_type(),
            ChatEvent::UserMessagePersisted(e) => e.event_type(),
            ChatEvent::BotTriggered(e) => e.event_type(),
            ChatEvent::BotTriggerFailed(e) => e.event_type(),
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        match self {
            ChatEvent::ConversationCreated(e) => e.conversation_id,
            ChatEvent::UserMessagePersisted(e) => e.conversation_id,
            ChatEvent::BotTriggered(e) => e.conversation_id,
            ChatEvent::BotTriggerFailed(e) => e.conversation_id,
        }
    }
}
