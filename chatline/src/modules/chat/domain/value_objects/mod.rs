// Chat Domain - Value Objects
// 值对象是不可变的，通过值而非标识来比较

mod conversation_id;
mod message_id;
mod sender;

pub use conversation_id::*;
pub use message_id::*;
pub use sender::*;
