// Chat Infrastructure Layer
// 基础设施层包含端口的具体实现

pub mod adapters;
pub mod repositories;

pub use adapters::graphql::{GraphqlClient, GraphqlError, GraphqlSubscription};
pub use repositories::{BackendCall, GraphqlChatRepository, InMemoryChatBackend};
