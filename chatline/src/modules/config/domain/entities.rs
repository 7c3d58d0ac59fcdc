// Config Domain Entities
//
// 后端连接配置

use serde::{Deserialize, Serialize};
use url::Url;

use crate::modules::config::ports::ConfigError;

fn default_timeout_secs() -> u64 {
    30
}

/// 托管后端配置
///
/// 默认按子域名和区域推导服务地址，也可以分别覆盖（例如本地开发环境）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphql_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 使用内存后端，不访问网络
    #[serde(default)]
    pub offline: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            subdomain: String::new(),
            region: String::new(),
            auth_url: None,
            graphql_url: None,
            request_timeout_secs: default_timeout_secs(),
            offline: false,
        }
    }
}

impl BackendConfig {
    pub fn new(subdomain: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }

    /// 认证服务地址
    pub fn auth_url(&self) -> Result<Url, ConfigError> {
        self.service_url(self.auth_url.as_deref(), "auth")
    }

    /// GraphQL HTTP 地址
    pub fn graphql_url(&self) -> Result<Url, ConfigError> {
        self.service_url(self.graphql_url.as_deref(), "graphql")
    }

    /// GraphQL 订阅地址：与 HTTP 地址相同，协议换成 ws / wss
    pub fn graphql_ws_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.graphql_url()?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unsupported GraphQL scheme: {}",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| ConfigError::Invalid(format!("cannot switch scheme to {}", scheme)))?;
        Ok(url)
    }

    /// 校验配置，返回所有错误
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.offline {
            return Ok(());
        }

        let mut errors = Vec::new();
        if let Err(e) = self.auth_url() {
            errors.push(e.to_string());
        }
        if let Err(e) = self.graphql_ws_url() {
            errors.push(e.to_string());
        }
        if self.request_timeout_secs == 0 {
            errors.push("requestTimeoutSecs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationError { errors })
        }
    }

    fn service_url(&self, explicit: Option<&str>, service: &str) -> Result<Url, ConfigError> {
        let raw = match explicit {
            Some(url) => url.to_string(),
            None => {
                if self.subdomain.trim().is_empty() || self.region.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "{} url requires subdomain and region",
                        service
                    )));
                }
                format!(
                    "https://{}.{}.{}.nhost.run/v1",
                    self.subdomain, service, self.region
                )
            }
        };

        Url::parse(&raw).map_err(|e| ConfigError::Invalid(format!("{}: {}", raw, e)))
    }
}
