// Chat Domain Layer
// 领域层包含会话、消息实体和值对象，以及领域事件

pub mod entities;
pub mod events;
pub mod value_objects;

pub use entities::{
    Conversation, ConversationList, ConversationSummary, Message, MessageFeed, FALLBACK_TITLE,
};
pub use events::*;
pub use value_objects::{ConversationId, MessageId, Sender};
