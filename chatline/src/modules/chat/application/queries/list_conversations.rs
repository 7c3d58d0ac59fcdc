use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler};
use crate::modules::chat::domain::ConversationList;
use crate::modules::chat::ports::ConversationRepository;

/// 列出当前用户的会话
#[derive(Debug, Clone, Default)]
pub struct ListConversationsQuery;

/// 列出会话响应
#[derive(Debug, Clone)]
pub struct ListConversationsResponse {
    pub conversations: ConversationList,
}

/// 列出会话查询处理器
pub struct ListConversationsHandler {
    conversation_repository: Arc<dyn ConversationRepository>,
}

impl ListConversationsHandler {
    pub fn new(conversation_repository: Arc<dyn ConversationRepository>) -> Self {
        Self {
            conversation_repository,
        }
    }
}

#[async_trait]
impl QueryHandler<ListConversationsQuery, ListConversationsResponse> for ListConversationsHandler {
    async fn handle(
        &self,
        _query: ListConversationsQuery,
    ) -> Result<ListConversationsResponse, ApplicationError> {
        let summaries = self.conversation_repository.list_for_current_user().await?;
        tracing::debug!("loaded {} conversations", summaries.len());

        Ok(ListConversationsResponse {
            conversations: ConversationList::new(summaries),
        })
    }
}
