// GraphQL Adapters
//
// - client: HTTP 查询 / 变更
// - subscription: graphql-transport-ws 订阅
// - documents: 后端 schema 上使用的 GraphQL 文档

mod client;
pub mod documents;
mod subscription;

pub use client::*;
pub use subscription::*;

use serde::Deserialize;
use thiserror::Error;

use crate::modules::chat::ports::{BotError, RepositoryError};

/// GraphQL 错误类型
#[derive(Debug, Error)]
pub enum GraphqlError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error: {status} - {body}")]
    HttpError { status: u16, body: String },

    #[error("GraphQL errors: {}", .0.join("; "))]
    ResponseErrors(Vec<String>),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),
}

impl From<GraphqlError> for RepositoryError {
    fn from(err: GraphqlError) -> Self {
        match err {
            GraphqlError::NotAuthenticated => RepositoryError::NotAuthenticated,
            GraphqlError::NetworkError(e) | GraphqlError::ProtocolError(e) => {
                RepositoryError::NetworkError(e)
            }
            GraphqlError::DecodeError(e) => RepositoryError::DecodeError(e),
            other => RepositoryError::GraphqlError(other.to_string()),
        }
    }
}

impl From<GraphqlError> for BotError {
    fn from(err: GraphqlError) -> Self {
        match err {
            GraphqlError::NotAuthenticated => BotError::NotAuthenticated,
            GraphqlError::NetworkError(e) | GraphqlError::ProtocolError(e) => {
                BotError::NetworkError(e)
            }
            other => BotError::Rejected(other.to_string()),
        }
    }
}

/// 标准 GraphQL 响应体
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
}

impl<T> GraphqlResponse<T> {
    /// 有错误时返回错误，否则要求 data 存在
    pub fn into_result(self) -> Result<T, GraphqlError> {
        if !self.errors.is_empty() {
            return Err(GraphqlError::ResponseErrors(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        self.data
            .ok_or_else(|| GraphqlError::DecodeError("response has no data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_take_precedence_over_data() {
        let response: GraphqlResponse<serde_json::Value> = serde_json::from_str(
            r#"{"data": null, "errors": [{"message": "field 'chats' not found"}, {"message": "second"}]}"#,
        )
        .unwrap();

        match response.into_result() {
            Err(GraphqlError::ResponseErrors(errors)) => {
                assert_eq!(errors, vec!["field 'chats' not found", "second"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_data_is_a_decode_error() {
        let response: GraphqlResponse<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            response.into_result(),
            Err(GraphqlError::DecodeError(_))
        ));
    }

    #[test]
    fn test_error_mapping_into_ports() {
        let repo: RepositoryError = GraphqlError::NotAuthenticated.into();
        assert!(matches!(repo, RepositoryError::NotAuthenticated));

        let bot: BotError = GraphqlError::ResponseErrors(vec!["boom".to_string()]).into();
        assert!(matches!(bot, BotError::Rejected(_)));
    }
}
