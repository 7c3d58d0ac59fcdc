use std::sync::Arc;
use tokio::sync::RwLock;

use super::chat_list::{ChatList, ChatListView};
use super::message_view::{MessageView, MessageViewSnapshot};
use crate::infrastructure::AppState;
use crate::modules::auth::AuthError;
use crate::modules::chat::{ApplicationError, ConversationId};

/// 未选中会话时的提示
pub const EMPTY_SELECTION: &str = "Select a chat or start a new one";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceView {
    pub list: ChatListView,
    pub conversation: Option<MessageViewSnapshot>,
}

/// 已认证状态下的界面：会话列表、当前会话的消息视图和登出
pub struct ChatWorkspace {
    app: AppState,
    list: ChatList,
    active_view: RwLock<Option<Arc<MessageView>>>,
}

impl ChatWorkspace {
    pub async fn mount(app: AppState) -> Self {
        let list = ChatList::mount(app.clone()).await;
        Self {
            app,
            list,
            active_view: RwLock::new(None),
        }
    }

    pub fn list(&self) -> &ChatList {
        &self.list
    }

    pub async fn message_view(&self) -> Option<Arc<MessageView>> {
        self.active_view.read().await.clone()
    }

    pub async fn select(&self, conversation_id: ConversationId) -> bool {
        if !self.list.select(conversation_id).await {
            return false;
        }
        self.bind(conversation_id).await;
        true
    }

    pub async fn select_index(&self, index: usize) -> Option<ConversationId> {
        let conversation_id = self.list.select_index(index).await?;
        self.bind(conversation_id).await;
        Some(conversation_id)
    }

    pub async fn new_chat(&self) -> Result<ConversationId, ApplicationError> {
        let conversation_id = self.list.new_chat().await?;
        self.bind(conversation_id).await;
        Ok(conversation_id)
    }

    pub async fn refresh(&self) -> Result<(), ApplicationError> {
        self.list.refresh().await
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.active_view.write().await.take();
        self.app.auth.sign_out().await.map_err(|e| {
            tracing::warn!("sign out failed: {}", e);
            e
        })
    }

    /// 切换到另一个会话时替换消息视图，旧视图的订阅随之结束
    async fn bind(&self, conversation_id: ConversationId) {
        let mut active = self.active_view.write().await;
        if let Some(view) = active.as_ref() {
            if view.conversation_id() == conversation_id {
                return;
            }
        }
        *active = Some(Arc::new(MessageView::mount(
            self.app.chat.clone(),
            conversation_id,
        )));
    }

    pub async fn view(&self) -> WorkspaceView {
        let conversation = match self.message_view().await {
            Some(view) => Some(view.snapshot().await),
            None => None,
        };
        WorkspaceView {
            list: self.list.view().await,
            conversation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::{AuthPort, AuthStatus, InMemoryAuthProvider};
    use crate::modules::chat::InMemoryChatBackend;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    async fn signed_in() -> (AppState, Arc<InMemoryChatBackend>) {
        let auth = Arc::new(InMemoryAuthProvider::new());
        auth.register("a@example.com", "pw").await;
        auth.sign_in("a@example.com", "pw").await.unwrap();
        AppState::in_memory(auth)
    }

    /// 订阅任务的建立和中止都是异步的，轮询到期望值为止
    async fn wait_for_subscribers(
        backend: &InMemoryChatBackend,
        conversation_id: ConversationId,
        expected: usize,
    ) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while backend.subscribers(conversation_id).await != expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("expected {} subscribers on {}", expected, conversation_id));
    }

    #[tokio::test]
    async fn test_no_selection_shows_empty_state() {
        let (app, _backend) = signed_in().await;
        let workspace = ChatWorkspace::mount(app).await;

        let view = workspace.view().await;
        assert!(view.conversation.is_none());
        assert!(view.list.items.is_empty());
    }

    #[tokio::test]
    async fn test_new_chat_opens_message_view() {
        let (app, backend) = signed_in().await;
        let workspace = ChatWorkspace::mount(app).await;

        let created = workspace.new_chat().await.unwrap();

        assert_eq!(backend.conversations().await.len(), 1);
        let view = workspace.view().await;
        assert_eq!(view.list.items.len(), 1);
        assert!(view.list.items[0].active);
        assert_eq!(view.conversation.unwrap().conversation_id, created);
    }

    #[tokio::test]
    async fn test_select_rebinds_message_view() {
        let (app, backend) = signed_in().await;
        let owner = app.auth.user_id().unwrap();
        let a = backend
            .seed_conversation(&owner, Utc.timestamp_opt(1, 0).unwrap())
            .await;
        let b = backend
            .seed_conversation(&owner, Utc.timestamp_opt(2, 0).unwrap())
            .await;
        let workspace = ChatWorkspace::mount(app).await;

        assert!(workspace.select(a).await);
        let first = workspace.message_view().await.unwrap();
        wait_for_subscribers(&backend, a, 1).await;
        assert!(workspace.select(a).await);
        assert!(Arc::ptr_eq(&first, &workspace.message_view().await.unwrap()));
        drop(first);

        assert_eq!(workspace.select_index(0).await, Some(b));
        assert_eq!(
            workspace.message_view().await.unwrap().conversation_id(),
            b
        );

        // 旧会话的订阅随视图一起结束
        wait_for_subscribers(&backend, b, 1).await;
        wait_for_subscribers(&backend, a, 0).await;
    }

    #[tokio::test]
    async fn test_sign_out_drops_view_and_clears_session() {
        let (app, backend) = signed_in().await;
        let status = app.auth.status();
        let workspace = ChatWorkspace::mount(app).await;
        let conversation_id = workspace.new_chat().await.unwrap();
        wait_for_subscribers(&backend, conversation_id, 1).await;

        workspace.sign_out().await.unwrap();

        assert!(workspace.message_view().await.is_none());
        assert_eq!(*status.borrow(), AuthStatus::Unauthenticated);
        wait_for_subscribers(&backend, conversation_id, 0).await;
    }
}
