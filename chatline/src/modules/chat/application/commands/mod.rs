// Chat Commands - 命令定义和处理器

mod create_conversation;
mod send_message;

pub use create_conversation::*;
pub use send_message::*;
