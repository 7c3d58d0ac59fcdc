use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

use crate::modules::chat::{
    ApplicationError, ChatModule, ConversationId, MessageFeed, SendMessageCommand,
    SubscribeMessagesQuery,
};

/// 首个快照到达前的占位文字
pub const LOADING_MESSAGES: &str = "Loading messages...";

/// 发送结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// 输入为空或只有空白
    Ignored,
}

/// 消息视图渲染数据，`feed` 为 None 表示首个快照尚未到达
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageViewSnapshot {
    pub conversation_id: ConversationId,
    pub feed: Option<MessageFeed>,
    pub composer: String,
}

/// 单个会话的消息视图
///
/// 挂载时启动订阅任务，任务把每个快照写入 watch 通道。
/// 视图被丢弃时中止订阅任务
pub struct MessageView {
    conversation_id: ConversationId,
    chat: Arc<ChatModule>,
    feed: watch::Receiver<Option<MessageFeed>>,
    composer: RwLock<String>,
    subscription: JoinHandle<()>,
}

impl MessageView {
    pub fn mount(chat: Arc<ChatModule>, conversation_id: ConversationId) -> Self {
        let (tx, rx) = watch::channel(None);
        let subscription = tokio::spawn(pump_feed(chat.clone(), conversation_id, tx));

        Self {
            conversation_id,
            chat,
            feed: rx,
            composer: RwLock::new(String::new()),
            subscription,
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// 最新快照
    pub fn feed(&self) -> Option<MessageFeed> {
        self.feed.borrow().clone()
    }

    /// 快照变化通知
    pub fn watch_feed(&self) -> watch::Receiver<Option<MessageFeed>> {
        self.feed.clone()
    }

    pub async fn set_composer(&self, text: impl Into<String>) {
        *self.composer.write().await = text.into();
    }

    pub async fn composer(&self) -> String {
        self.composer.read().await.clone()
    }

    /// 发送输入框内容
    ///
    /// 输入框在请求发出前清空，失败时不恢复
    pub async fn send(&self) -> Result<SendOutcome, ApplicationError> {
        match self.take_composer().await {
            Some(content) => {
                self.deliver(content).await?;
                Ok(SendOutcome::Sent)
            }
            None => Ok(SendOutcome::Ignored),
        }
    }

    /// 清空输入框并取出内容；只有空白时不清空，返回 None
    pub async fn take_composer(&self) -> Option<String> {
        let mut composer = self.composer.write().await;
        if composer.trim().is_empty() {
            return None;
        }
        Some(std::mem::take(&mut *composer))
    }

    /// 保存用户消息并触发机器人
    pub async fn deliver(&self, content: String) -> Result<(), ApplicationError> {
        self.chat
            .send_message(SendMessageCommand::new(self.conversation_id, content))
            .await
            .map_err(|e| {
                tracing::warn!("send to {} failed: {}", self.conversation_id, e);
                e
            })?;
        Ok(())
    }

    pub async fn snapshot(&self) -> MessageViewSnapshot {
        MessageViewSnapshot {
            conversation_id: self.conversation_id,
            feed: self.feed(),
            composer: self.composer().await,
        }
    }
}

impl Drop for MessageView {
    fn drop(&mut self) {
        tracing::debug!("tearing down subscription for {}", self.conversation_id);
        self.subscription.abort();
    }
}

/// 订阅失败或流结束后保留最后一个快照
async fn pump_feed(
    chat: Arc<ChatModule>,
    conversation_id: ConversationId,
    tx: watch::Sender<Option<MessageFeed>>,
) {
    let mut stream = match chat
        .subscribe_messages(SubscribeMessagesQuery::new(conversation_id))
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("subscribe to {} failed: {}", conversation_id, e);
            return;
        }
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(messages) => {
                tracing::debug!("{} messages in {}", messages.len(), conversation_id);
                tx.send_replace(Some(MessageFeed::new(messages)));
            }
            Err(e) => {
                tracing::error!("subscription for {} ended: {}", conversation_id, e);
                return;
            }
        }
    }
    tracing::debug!("subscription for {} completed", conversation_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::EventBus;
    use crate::modules::auth::UserId;
    use crate::modules::chat::{BackendCall, InMemoryChatBackend, Message, MessageId, Sender};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    async fn setup() -> (Arc<InMemoryChatBackend>, Arc<ChatModule>, ConversationId) {
        let owner = UserId::new("user-1");
        let backend = Arc::new(InMemoryChatBackend::new());
        backend.set_current_user(Some(owner.clone())).await;
        let conversation_id = backend.seed_conversation(&owner, at(1)).await;
        let chat = Arc::new(ChatModule::in_memory(
            backend.clone(),
            Arc::new(EventBus::new()),
        ));
        (backend, chat, conversation_id)
    }

    async fn wait_for_feed(view: &MessageView, len: usize) -> MessageFeed {
        let mut rx = view.watch_feed();
        let feed = rx
            .wait_for(|feed| feed.as_ref().map(|f| f.len()) == Some(len))
            .await
            .unwrap();
        feed.clone().unwrap()
    }

    #[tokio::test]
    async fn test_send_clears_composer_then_persists_and_triggers() {
        let (backend, chat, conversation_id) = setup().await;
        let view = MessageView::mount(chat, conversation_id);

        view.set_composer("hello").await;
        assert_eq!(view.send().await.unwrap(), SendOutcome::Sent);
        assert_eq!(view.composer().await, "");

        let messages = backend.messages(conversation_id).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender(), Sender::User);
        assert_eq!(messages[0].content(), "hello");

        let calls: Vec<BackendCall> = backend
            .calls()
            .await
            .into_iter()
            .filter(|call| !matches!(call, BackendCall::Subscribe { .. }))
            .collect();
        assert_eq!(
            calls,
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
    async fn test_blank_input_is_ignored() {
        let (backend, chat, conversation_id) = setup().await;
        let view = MessageView::mount(chat, conversation_id);

        for input in ["", "   ", "\n\t"] {
            view.set_composer(input).await;
            assert_eq!(view.send().await.unwrap(), SendOutcome::Ignored);
        }

        assert!(backend.messages(conversation_id).await.is_empty());
        assert!(!backend
            .calls()
            .await
            .iter()
            .any(|call| matches!(
                call,
                BackendCall::InsertMessage { .. } | BackendCall::TriggerBot { .. }
            )));
    }

    #[tokio::test]
    async fn test_bot_failure_keeps_message_and_clears_composer() {
        let (backend, chat, conversation_id) = setup().await;
        backend.fail_bot(true);
        let view = MessageView::mount(chat, conversation_id);

        view.set_composer("hello").await;
        assert!(view.send().await.is_err());

        assert_eq!(view.composer().await, "");
        assert_eq!(backend.messages(conversation_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_failure_skips_trigger() {
        let (backend, chat, conversation_id) = setup().await;
        backend.fail_inserts(true);
        let view = MessageView::mount(chat, conversation_id);

        view.set_composer("hello").await;
        assert!(view.send().await.is_err());

        assert!(!backend
            .calls()
            .await
            .iter()
            .any(|call| matches!(call, BackendCall::TriggerBot { .. })));
    }

    #[tokio::test]
    async fn test_feed_is_ordered_ascending() {
        let (backend, chat, conversation_id) = setup().await;
        for (content, secs) in [("m3", 3), ("m1", 1), ("m2", 2)] {
            backend
                .seed_message(Message::from_parts(
                    MessageId::new(),
                    conversation_id,
                    Sender::User,
                    content,
                    at(secs),
                ))
                .await;
        }

        let view = MessageView::mount(chat, conversation_id);
        let feed = wait_for_feed(&view, 3).await;

        let contents: Vec<&str> = feed.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_feed_follows_pushes() {
        let (backend, chat, conversation_id) = setup().await;
        backend.echo_bot(true);
        let view = MessageView::mount(chat, conversation_id);
        wait_for_feed(&view, 0).await;

        view.set_composer("ping").await;
        view.send().await.unwrap();

        let feed = wait_for_feed(&view, 2).await;
        assert_eq!(feed.messages()[0].content(), "ping");
        assert_eq!(feed.messages()[1].sender(), Sender::Bot);
    }
}
