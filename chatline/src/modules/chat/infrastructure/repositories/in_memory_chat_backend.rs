use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};

use crate::modules::auth::{AuthPort, UserId};
use crate::modules::chat::domain::{
    Conversation, ConversationId, ConversationSummary, Message, MessageId,
};
use crate::modules::chat::ports::{
    BotError, BotPort, BotReply, ConversationRepository, MessageRepository, MessageStream,
    RepositoryError,
};

/// 后端调用记录，按发生顺序保存
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ListConversations,
    CreateConversation {
        owner: UserId,
    },
    InsertMessage {
        conversation_id: ConversationId,
        content: String,
    },
    TriggerBot {
        conversation_id: ConversationId,
        message: String,
    },
    Subscribe {
        conversation_id: ConversationId,
    },
}

/// 内存聊天后端
///
/// 同时实现会话仓储、消息仓储和机器人端口，用于测试和离线模式。
/// 每个会话一个 watch 通道，插入消息后推送完整快照
pub struct InMemoryChatBackend {
    auth: Option<Arc<dyn AuthPort>>,
    current_user: RwLock<Option<UserId>>,
    conversations: RwLock<Vec<Conversation>>,
    messages: RwLock<HashMap<ConversationId, Vec<Message>>>,
    feeds: Mutex<HashMap<ConversationId, watch::Sender<Vec<Message>>>>,
    calls: Mutex<Vec<BackendCall>>,
    fail_bot: AtomicBool,
    fail_inserts: AtomicBool,
    echo_bot: AtomicBool,
}

impl InMemoryChatBackend {
    /// 当前用户由 `set_current_user` 指定
    pub fn new() -> Self {
        Self {
            auth: None,
            current_user: RwLock::new(None),
            conversations: RwLock::new(Vec::new()),
            messages: RwLock::new(HashMap::new()),
            feeds: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_bot: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            echo_bot: AtomicBool::new(false),
        }
    }

    /// 当前用户跟随认证端口
    pub fn with_auth(auth: Arc<dyn AuthPort>) -> Self {
        Self {
            auth: Some(auth),
            ..Self::new()
        }
    }

    pub async fn set_current_user(&self, user: Option<UserId>) {
        *self.current_user.write().await = user;
    }

    /// 机器人动作返回错误
    pub fn fail_bot(&self, fail: bool) {
        self.fail_bot.store(fail, Ordering::SeqCst);
    }

    /// 插入消息返回错误
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// 机器人动作成功时追加一条回显回复
    pub fn echo_bot(&self, enabled: bool) {
        self.echo_bot.store(enabled, Ordering::SeqCst);
    }

    /// 直接写入一个会话，不记录调用
    pub async fn seed_conversation(&self, owner: &UserId, created_at: DateTime<Utc>) -> ConversationId {
        let conversation = Conversation::from_parts(ConversationId::new(), owner.clone(), created_at);
        let id = conversation.id();
        self.conversations.write().await.push(conversation);
        id
    }

    /// 直接写入一条消息并推送快照，不记录调用
    pub async fn seed_message(&self, message: Message) {
        let conversation_id = message.conversation_id();
        self.messages
            .write()
            .await
            .entry(conversation_id)
            .or_default()
            .push(message);
        self.publish(conversation_id).await;
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.conversations.read().await.clone()
    }

    pub async fn messages(&self, conversation_id: ConversationId) -> Vec<Message> {
        self.messages
            .read()
            .await
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().await.clone()
    }

    /// 会话当前仍在接收推送的订阅数
    pub async fn subscribers(&self, conversation_id: ConversationId) -> usize {
        self.feeds
            .lock()
            .await
            .get(&conversation_id)
            .map(|feed| feed.receiver_count())
            .unwrap_or(0)
    }

    async fn record(&self, call: BackendCall) {
        self.calls.lock().await.push(call);
    }

    async fn current_user(&self) -> Option<UserId> {
        match &self.auth {
            Some(auth) => auth.user_id(),
            None => self.current_user.read().await.clone(),
        }
    }

    async fn snapshot(&self, conversation_id: ConversationId) -> Vec<Message> {
        let mut snapshot = self.messages(conversation_id).await;
        snapshot.sort_by_key(|m| m.created_at());
        snapshot
    }

    async fn publish(&self, conversation_id: ConversationId) {
        let snapshot = self.snapshot(conversation_id).await;
        if let Some(feed) = self.feeds.lock().await.get(&conversation_id) {
            feed.send_replace(snapshot);
        }
    }

    async fn append(&self, message: Message) {
        let conversation_id = message.conversation_id();
        self.messages
            .write()
            .await
            .entry(conversation_id)
            .or_default()
            .push(message);
        self.publish(conversation_id).await;
    }
}

impl Default for InMemoryChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryChatBackend {
    async fn list_for_current_user(&self) -> Result<Vec<ConversationSummary>, RepositoryError> {
        self.record(BackendCall::ListConversations).await;
        let user = self
            .current_user()
            .await
            .ok_or(RepositoryError::NotAuthenticated)?;

        let conversations = self.conversations.read().await;
        let messages = self.messages.read().await;

        let mut summaries: Vec<ConversationSummary> = conversations
            .iter()
            .filter(|c| c.owner() == &user)
            .map(|c| {
                let last = messages
                    .get(&c.id())
                    .and_then(|msgs| msgs.iter().max_by_key(|m| m.created_at()))
                    .map(|m| m.content().to_string());
                ConversationSummary::new(c.id(), c.created_at(), last)
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(summaries)
    }

    async fn create(&self, owner: &UserId) -> Result<ConversationId, RepositoryError> {
        self.record(BackendCall::CreateConversation {
            owner: owner.clone(),
        })
        .await;

        let conversation = Conversation::new(owner.clone());
        let id = conversation.id();
        self.conversations.write().await.push(conversation);
        Ok(id)
    }
}

#[async_trait]
impl MessageRepository for InMemoryChatBackend {
    async fn insert_user_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<MessageId, RepositoryError> {
        self.record(BackendCall::InsertMessage {
            conversation_id,
            content: content.to_string(),
        })
        .await;

        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::NetworkError(
                "insert rejected by in-memory backend".to_string(),
            ));
        }

        let message = Message::new_user(conversation_id, content);
        let id = message.id();
        self.append(message).await;
        Ok(id)
    }

    async fn subscribe(
        &self,
        conversation_id: ConversationId,
    ) -> Result<MessageStream, RepositoryError> {
        self.record(BackendCall::Subscribe { conversation_id }).await;

        let rx = {
            let mut feeds = self.feeds.lock().await;
            match feeds.get(&conversation_id) {
                Some(feed) => feed.subscribe(),
                None => {
                    let snapshot = self.snapshot(conversation_id).await;
                    let (tx, rx) = watch::channel(snapshot);
                    feeds.insert(conversation_id, tx);
                    rx
                }
            }
        };

        // 先推送当前快照，之后每次变化推送一次
        let stream = stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let snapshot = rx.borrow_and_update().clone();
            Some((Ok(snapshot), (rx, false)))
        });
        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl BotPort for InMemoryChatBackend {
    async fn trigger_reply(
        &self,
        conversation_id: ConversationId,
        message: &str,
    ) -> Result<BotReply, BotError> {
        self.record(BackendCall::TriggerBot {
            conversation_id,
            message: message.to_string(),
        })
        .await;

        if self.fail_bot.load(Ordering::SeqCst) {
            return Err(BotError::Rejected("bot unavailable".to_string()));
        }

        let response = format!("You said: {}", message);
        if self.echo_bot.load(Ordering::SeqCst) {
            self.append(Message::new_bot(conversation_id, response.clone()))
                .await;
        }

        Ok(BotReply {
            response: Some(response),
        })
    }
}
