use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::value_objects::ConversationId;
use crate::modules::auth::UserId;

/// 没有任何消息时会话列表项显示的标签
pub const FALLBACK_TITLE: &str = "New Chat";

/// 会话实体
///
/// 由用户显式创建，客户端从不删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    id: ConversationId,
    owner: UserId,
    created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(owner: UserId) -> Self {
        Self {
            id: ConversationId::new(),
            owner,
            created_at: Utc::now(),
        }
    }

    pub fn from_parts(id: ConversationId, owner: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            created_at,
        }
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// 会话列表项：会话 + 最近一条消息的内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub created_at: DateTime<Utc>,
    pub last_message: Option<String>,
}

impl ConversationSummary {
    pub fn new(id: ConversationId, created_at: DateTime<Utc>, last_message: Option<String>) -> Self {
        Self {
            id,
            created_at,
            last_message,
        }
    }

    /// 列表中显示的标题，空内容同样回退到默认标签
    pub fn title(&self) -> &str {
        match self.last_message.as_deref() {
            Some(content) if !content.is_empty() => content,
            _ => FALLBACK_TITLE,
        }
    }
}

/// 会话列表，按创建时间降序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationList {
    items: Vec<ConversationSummary>,
}

impl ConversationList {
    pub fn new(mut items: Vec<ConversationSummary>) -> Self {
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { items }
    }

    pub fn items(&self) -> &[ConversationSummary] {
        &self.items
    }

    pub fn contains(&self, id: ConversationId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&ConversationSummary> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
