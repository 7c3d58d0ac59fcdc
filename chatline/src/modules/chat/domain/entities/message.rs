use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::value_objects::{ConversationId, MessageId, Sender};

/// 消息实体
///
/// 由用户提交或由后端机器人动作创建，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    conversation_id: ConversationId,
    sender: Sender,
    content: String,
    created_at: DateTime<Utc>,
}

impl Message {
    /// 从存储恢复
    pub fn from_parts(
        id: MessageId,
        conversation_id: ConversationId,
        sender: Sender,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender,
            content: content.into(),
            created_at,
        }
    }

    /// 创建用户消息
    pub fn new_user(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::from_parts(
            MessageId::new(),
            conversation_id,
            Sender::User,
            content,
            Utc::now(),
        )
    }

    /// 创建机器人消息
    pub fn new_bot(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::from_parts(
            MessageId::new(),
            conversation_id,
            Sender::Bot,
            content,
            Utc::now(),
        )
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// 单个会话的消息快照
///
/// 订阅每次推送一份完整快照；快照内按创建时间升序排列。
/// 排序是稳定的，后端已排好序时保持原顺序不变
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFeed {
    messages: Vec<Message>,
}

impl MessageFeed {
    pub fn new(mut messages: Vec<Message>) -> Self {
        messages.sort_by_key(|m| m.created_at());
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
