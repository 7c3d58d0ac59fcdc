// Chat Module - 聊天模块
//
// 实现六边形架构（Hexagonal Architecture）：
// - domain: 领域层，包含会话、消息实体、值对象和领域事件
// - ports: 端口层，定义与托管后端之间的抽象接口
// - infrastructure: 基础设施层，GraphQL 适配器和内存后端
// - application: 应用层，实现 CQRS 命令和查询处理器

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// 重新导出常用类型
pub use application::{
    // Traits
    ApplicationError,
    CommandHandler,
    // Commands
    CreateConversationCommand,
    CreateConversationHandler,
    CreateConversationResponse,
    // Queries
    ListConversationsHandler,
    ListConversationsQuery,
    ListConversationsResponse,
    QueryHandler,
    SendMessageCommand,
    SendMessageHandler,
    SendMessageResponse,
    SubscribeMessagesHandler,
    SubscribeMessagesQuery,
};

pub use domain::{
    ChatEvent, Conversation, ConversationId, ConversationList, ConversationSummary, Message,
    MessageFeed, MessageId, Sender, FALLBACK_TITLE,
};

pub use infrastructure::{
    BackendCall, GraphqlChatRepository, GraphqlClient, GraphqlError, InMemoryChatBackend,
};

pub use ports::{
    BotError, BotPort, BotReply, ConversationRepository, MessageRepository, MessageStream,
    RepositoryError,
};

use std::sync::Arc;

use crate::infrastructure::EventBus;

/// Chat 模块容器
///
/// 管理模块内的依赖注入
pub struct ChatModule {
    event_bus: Arc<EventBus>,
    // Handlers
    create_conversation_handler: CreateConversationHandler,
    send_message_handler: SendMessageHandler,
    list_conversations_handler: ListConversationsHandler,
    subscribe_messages_handler: SubscribeMessagesHandler,
}

impl ChatModule {
    /// 使用内存后端创建（测试和离线模式）
    pub fn in_memory(backend: Arc<InMemoryChatBackend>, event_bus: Arc<EventBus>) -> Self {
        Self::with_ports(backend.clone(), backend.clone(), backend, event_bus)
    }

    /// 使用 GraphQL 后端创建
    pub fn with_graphql(repository: Arc<GraphqlChatRepository>, event_bus: Arc<EventBus>) -> Self {
        Self::with_ports(repository.clone(), repository.clone(), repository, event_bus)
    }

    /// 使用自定义端口创建 ChatModule
    pub fn with_ports(
        conversation_repository: Arc<dyn ConversationRepository>,
        message_repository: Arc<dyn MessageRepository>,
        bot: Arc<dyn BotPort>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let create_conversation_handler =
            CreateConversationHandler::new(conversation_repository.clone(), event_bus.clone());
        let send_message_handler =
            SendMessageHandler::new(message_repository.clone(), bot, event_bus.clone());
        let list_conversations_handler = ListConversationsHandler::new(conversation_repository);
        let subscribe_messages_handler = SubscribeMessagesHandler::new(message_repository);

        Self {
            event_bus,
            create_conversation_handler,
            send_message_handler,
            list_conversations_handler,
            subscribe_messages_handler,
        }
    }

    // Command handlers

    /// 创建会话
    pub async fn create_conversation(
        &self,
        command: CreateConversationCommand,
    ) -> Result<CreateConversationResponse, ApplicationError> {
        self.create_conversation_handler.handle(command).await
    }

    /// 发送消息并触发机器人回复
    pub async fn send_message(
        &self,
        command: SendMessageCommand,
    ) -> Result<SendMessageResponse, ApplicationError> {
        self.send_message_handler.handle(command).await
    }

    // Query handlers

    /// 列出当前用户的会话
    pub async fn list_conversations(
        &self,
        query: ListConversationsQuery,
    ) -> Result<ListConversationsResponse, ApplicationError> {
        self.list_conversations_handler.handle(query).await
    }

    /// 订阅会话消息
    pub async fn subscribe_messages(
        &self,
        query: SubscribeMessagesQuery,
    ) -> Result<MessageStream, ApplicationError> {
        self.subscribe_messages_handler.handle(query).await
    }

    // Accessors

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}
