// Chat Queries - 查询定义和处理器

mod list_conversations;
mod subscribe_messages;

pub use list_conversations::*;
pub use subscribe_messages::*;
