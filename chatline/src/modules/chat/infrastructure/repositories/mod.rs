// Chat Infrastructure - Repositories
//
// 仓储实现：
// - GraphqlChatRepository: 托管 GraphQL 后端
// - InMemoryChatBackend: 内存后端，用于测试和离线模式

mod graphql_chat_repository;
mod in_memory_chat_backend;

pub use graphql_chat_repository::*;
pub use in_memory_chat_backend::*;
