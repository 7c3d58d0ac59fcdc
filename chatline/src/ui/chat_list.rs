use tokio::sync::RwLock;

use crate::infrastructure::AppState;
use crate::modules::chat::{
    ApplicationError, ConversationId, ConversationList, CreateConversationCommand,
    ListConversationsQuery,
};

/// 列表加载中的占位文字
pub const LOADING_CHATS: &str = "Loading chats...";

#[derive(Debug)]
struct ListState {
    conversations: ConversationList,
    active: Option<ConversationId>,
    loading: bool,
}

/// 列表项渲染数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListItem {
    pub id: ConversationId,
    pub title: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListView {
    pub loading: bool,
    pub items: Vec<ChatListItem>,
}

/// 会话列表
///
/// 按创建时间倒序显示当前用户的会话，选中状态只在本地保存
pub struct ChatList {
    app: AppState,
    state: RwLock<ListState>,
}

impl ChatList {
    /// 挂载时立即加载一次，加载失败只记录日志
    pub async fn mount(app: AppState) -> Self {
        let list = Self {
            app,
            state: RwLock::new(ListState {
                conversations: ConversationList::default(),
                active: None,
                loading: true,
            }),
        };
        if let Err(e) = list.refresh().await {
            tracing::warn!("failed to load conversations: {}", e);
        }
        list
    }

    pub async fn refresh(&self) -> Result<(), ApplicationError> {
        let result = self.app.chat.list_conversations(ListConversationsQuery).await;

        let mut state = self.state.write().await;
        state.loading = false;
        let response = result?;
        state.conversations = response.conversations;
        Ok(())
    }

    /// 为当前用户创建会话，刷新列表并选中新会话
    pub async fn new_chat(&self) -> Result<ConversationId, ApplicationError> {
        let owner = self
            .app
            .auth
            .user_id()
            .ok_or(ApplicationError::NotAuthenticated)?;

        let response = self
            .app
            .chat
            .create_conversation(CreateConversationCommand::new(owner))
            .await?;
        let conversation_id = response.conversation_id;

        if let Err(e) = self.refresh().await {
            tracing::warn!("failed to refresh conversations: {}", e);
        }
        self.state.write().await.active = Some(conversation_id);

        Ok(conversation_id)
    }

    /// 选中列表中的会话，不在列表中时返回 false
    pub async fn select(&self, conversation_id: ConversationId) -> bool {
        let mut state = self.state.write().await;
        if !state.conversations.contains(conversation_id) {
            return false;
        }
        state.active = Some(conversation_id);
        true
    }

    /// 按显示位置选中（从 0 开始）
    pub async fn select_index(&self, index: usize) -> Option<ConversationId> {
        let mut state = self.state.write().await;
        let conversation_id = state.conversations.get(index)?.id;
        state.active = Some(conversation_id);
        Some(conversation_id)
    }

    pub async fn active(&self) -> Option<ConversationId> {
        self.state.read().await.active
    }

    pub async fn view(&self) -> ChatListView {
        let state = self.state.read().await;
        ChatListView {
            loading: state.loading,
            items: state
                .conversations
                .items()
                .iter()
                .map(|summary| ChatListItem {
                    id: summary.id,
                    title: summary.title().to_string(),
                    active: state.active == Some(summary.id),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::{AuthPort, InMemoryAuthProvider};
    use crate::modules::chat::{Message, MessageId, Sender};
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    async fn signed_in() -> (AppState, Arc<crate::modules::chat::InMemoryChatBackend>) {
        let auth = Arc::new(InMemoryAuthProvider::new());
        auth.register("a@example.com", "pw").await;
        auth.sign_in("a@example.com", "pw").await.unwrap();
        AppState::in_memory(auth)
    }

    #[tokio::test]
    async fn test_newest_first_with_latest_content() {
        let (app, backend) = signed_in().await;
        let owner = app.auth.user_id().unwrap();
        let a = backend.seed_conversation(&owner, at(1)).await;
        let b = backend.seed_conversation(&owner, at(2)).await;
        backend
            .seed_message(Message::from_parts(
                MessageId::new(),
                a,
                Sender::User,
                "first",
                at(3),
            ))
            .await;
        backend
            .seed_message(Message::from_parts(
                MessageId::new(),
                a,
                Sender::Bot,
                "latest",
                at(4),
            ))
            .await;

        let list = ChatList::mount(app).await;
        let view = list.view().await;

        assert!(!view.loading);
        let rows: Vec<(ConversationId, &str)> = view
            .items
            .iter()
            .map(|item| (item.id, item.title.as_str()))
            .collect();
        assert_eq!(rows, vec![(b, "New Chat"), (a, "latest")]);
    }

    #[tokio::test]
    async fn test_new_chat_is_listed_and_active() {
        let (app, backend) = signed_in().await;
        let owner = app.auth.user_id().unwrap();
        let list = ChatList::mount(app).await;
        assert!(list.view().await.items.is_empty());

        let created = list.new_chat().await.unwrap();

        let conversations = backend.conversations().await;
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id(), created);
        assert_eq!(conversations[0].owner(), &owner);

        let view = list.view().await;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].id, created);
        assert!(view.items[0].active);
        assert_eq!(list.active().await, Some(created));
    }

    #[tokio::test]
    async fn test_new_chat_requires_user() {
        let (app, backend) = AppState::in_memory(Arc::new(InMemoryAuthProvider::new()));
        let list = ChatList::mount(app).await;

        assert!(matches!(
            list.new_chat().await,
            Err(ApplicationError::NotAuthenticated)
        ));
        assert!(backend.conversations().await.is_empty());
    }

    #[tokio::test]
    async fn test_select_marks_active() {
        let (app, backend) = signed_in().await;
        let owner = app.auth.user_id().unwrap();
        let a = backend.seed_conversation(&owner, at(1)).await;
        let b = backend.seed_conversation(&owner, at(2)).await;
        let list = ChatList::mount(app).await;

        assert!(list.select(a).await);
        assert!(!list.select(ConversationId::new()).await);
        assert_eq!(list.active().await, Some(a));

        assert_eq!(list.select_index(0).await, Some(b));
        let view = list.view().await;
        assert!(view.items[0].active);
        assert!(!view.items[1].active);
    }
}
