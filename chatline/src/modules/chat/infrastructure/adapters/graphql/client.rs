use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::{GraphqlError, GraphqlResponse};
use crate::modules::auth::AuthPort;

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

/// GraphQL HTTP 客户端
///
/// 每次请求都从认证端口读取当前访问令牌
pub struct GraphqlClient {
    http: Client,
    endpoint: Url,
    auth: Arc<dyn AuthPort>,
}

impl GraphqlClient {
    pub fn new(
        endpoint: Url,
        auth: Arc<dyn AuthPort>,
        timeout_secs: u64,
    ) -> Result<Self, GraphqlError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GraphqlError::NetworkError(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            auth,
        })
    }

    /// 执行查询或变更
    pub async fn execute<V, T>(&self, document: &str, variables: V) -> Result<T, GraphqlError>
    where
        V: Serialize + Send,
        T: DeserializeOwned,
    {
        let token = self
            .auth
            .access_token()
            .await
            .ok_or(GraphqlError::NotAuthenticated)?;

        debug!("GraphQL request to {}", self.endpoint);

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .json(&GraphqlRequest {
                query: document,
                variables,
            })
            .send()
            .await
            .map_err(|e| GraphqlError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("GraphQL HTTP error: {} - {}", status, body);
            return Err(GraphqlError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        let body: GraphqlResponse<T> = response
            .json()
            .await
            .map_err(|e| GraphqlError::DecodeError(e.to_string()))?;

        body.into_result()
    }
}
