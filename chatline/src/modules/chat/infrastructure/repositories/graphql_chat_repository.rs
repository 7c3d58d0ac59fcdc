// GraphQL 聊天仓储
//
// 会话、消息和机器人动作都通过托管 GraphQL 引擎访问；
// 权限和用户过滤由后端根据访问令牌完成

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use url::Url;

use crate::modules::auth::{AuthPort, UserId};
use crate::modules::chat::domain::{
    ConversationId, ConversationSummary, Message, MessageId, Sender,
};
use crate::modules::chat::infrastructure::adapters::graphql::{
    documents, GraphqlClient, GraphqlSubscription,
};
use crate::modules::chat::ports::{
    BotError, BotPort, BotReply, ConversationRepository, MessageRepository, MessageStream,
    RepositoryError,
};

#[derive(Debug, Deserialize)]
struct ChatsData {
    chats: Vec<ChatRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRow {
    id: ConversationId,
    created_at: DateTime<Utc>,
    #[serde(default)]
    messages: Vec<PreviewRow>,
}

#[derive(Debug, Deserialize)]
struct PreviewRow {
    content: String,
}

#[derive(Debug, Deserialize)]
struct InsertChatData {
    insert_chats_one: IdRow<ConversationId>,
}

#[derive(Debug, Deserialize)]
struct InsertMessageData {
    insert_messages_one: IdRow<MessageId>,
}

#[derive(Debug, Deserialize)]
struct IdRow<T> {
    id: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageData {
    send_message: Option<BotReply>,
}

#[derive(Debug, Deserialize)]
struct MessagesData {
    messages: Vec<MessageRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRow {
    id: MessageId,
    content: String,
    sender: Sender,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self, conversation_id: ConversationId) -> Message {
        Message::from_parts(
            self.id,
            conversation_id,
            self.sender,
            self.content,
            self.created_at,
        )
    }
}

fn decode_messages(
    conversation_id: ConversationId,
    data: serde_json::Value,
) -> Result<Vec<Message>, RepositoryError> {
    let data: MessagesData =
        serde_json::from_value(data).map_err(|e| RepositoryError::DecodeError(e.to_string()))?;
    Ok(data
        .messages
        .into_iter()
        .map(|row| row.into_message(conversation_id))
        .collect())
}

/// 基于 GraphQL 的聊天后端
pub struct GraphqlChatRepository {
    client: GraphqlClient,
    ws_url: Url,
    auth: Arc<dyn AuthPort>,
}

impl GraphqlChatRepository {
    pub fn new(client: GraphqlClient, ws_url: Url, auth: Arc<dyn AuthPort>) -> Self {
        Self {
            client,
            ws_url,
            auth,
        }
    }
}

#[async_trait]
impl ConversationRepository for GraphqlChatRepository {
    async fn list_for_current_user(&self) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let data: ChatsData = self.client.execute(documents::GET_CHATS, json!({})).await?;

        Ok(data
            .chats
            .into_iter()
            .map(|row| {
                let last = row.messages.into_iter().next().map(|m| m.content);
                ConversationSummary::new(row.id, row.created_at, last)
            })
            .collect())
    }

    async fn create(&self, owner: &UserId) -> Result<ConversationId, RepositoryError> {
        let data: InsertChatData = self
            .client
            .execute(documents::INSERT_CHAT, json!({ "userId": owner }))
            .await?;
        Ok(data.insert_chats_one.id)
    }
}

#[async_trait]
impl MessageRepository for GraphqlChatRepository {
    async fn insert_user_message(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<MessageId, RepositoryError> {
        let data: InsertMessageData = self
            .client
            .execute(
                documents::INSERT_MESSAGE,
                json!({ "chatId": conversation_id, "content": content }),
            )
            .await?;
        Ok(data.insert_messages_one.id)
    }

    async fn subscribe(
        &self,
        conversation_id: ConversationId,
    ) -> Result<MessageStream, RepositoryError> {
        let token = self
            .auth
            .access_token()
            .await
            .ok_or(RepositoryError::NotAuthenticated)?;

        let raw = GraphqlSubscription::start(
            &self.ws_url,
            &token,
            documents::GET_MESSAGES,
            json!({ "chatId": conversation_id }),
        )
        .await?;

        let stream = raw.map(move |item| {
            item.map_err(RepositoryError::from)
                .and_then(|data| decode_messages(conversation_id, data))
        });
        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl BotPort for GraphqlChatRepository {
    async fn trigger_reply(
        &self,
        conversation_id: ConversationId,
        message: &str,
    ) -> Result<BotReply, BotError> {
        let data: SendMessageData = self
            .client
            .execute(
                documents::SEND_MESSAGE_ACTION,
                json!({ "chatId": conversation_id, "message": message }),
            )
            .await?;

        Ok(data.send_message.unwrap_or(BotReply { response: None }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_chats_with_and_without_preview() {
        let data: ChatsData = serde_json::from_value(json!({
            "chats": [
                {
                    "id": "550e8400-e29b-41d4-a716-446655440001",
                    "createdAt": "2024-05-02T10:00:00.123456+00:00",
                    "messages": []
                },
                {
                    "id": "550e8400-e29b-41d4-a716-446655440000",
                    "createdAt": "2024-05-01T10:00:00+00:00",
                    "messages": [{ "content": "latest" }]
                }
            ]
        }))
        .unwrap();

        assert_eq!(data.chats.len(), 2);
        assert!(data.chats[0].messages.is_empty());
        assert_eq!(data.chats[1].messages[0].content, "latest");
        assert!(data.chats[0].created_at > data.chats[1].created_at);
    }

    #[test]
    fn test_decode_subscription_snapshot() {
        let conversation_id = ConversationId::new();
        let messages = decode_messages(
            conversation_id,
            json!({
                "messages": [
                    {
                        "id": "550e8400-e29b-41d4-a716-446655440010",
                        "content": "hello",
                        "sender": "user",
                        "createdAt": "2024-05-01T10:00:00+00:00"
                    },
                    {
                        "id": "550e8400-e29b-41d4-a716-446655440011",
                        "content": "hi there",
                        "sender": "bot",
                        "createdAt": "2024-05-01T10:00:02+00:00"
                    }
                ]
            }),
        )
        .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender(), Sender::User);
        assert_eq!(messages[1].sender(), Sender::Bot);
        assert!(messages
            .iter()
            .all(|m| m.conversation_id() == conversation_id));
    }

    #[test]
    fn test_decode_rejects_malformed_snapshot() {
        let result = decode_messages(ConversationId::new(), json!({ "messages": [{ "id": 1 }] }));
        assert!(matches!(result, Err(RepositoryError::DecodeError(_))));
    }

    #[test]
    fn test_decode_action_without_payload() {
        let data: SendMessageData = serde_json::from_value(json!({ "sendMessage": null })).unwrap();
        assert!(data.send_message.is_none());

        let data: SendMessageData =
            serde_json::from_value(json!({ "sendMessage": { "response": "ok" } })).unwrap();
        assert_eq!(data.send_message.unwrap().response.as_deref(), Some("ok"));
    }
}
