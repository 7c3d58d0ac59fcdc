// Chat Ports Layer
// 端口定义了模块与托管后端之间的接口

mod bot_port;
mod conversation_repository;
mod message_repository;

pub use bot_port::*;
pub use conversation_repository::*;
pub use message_repository::*;
