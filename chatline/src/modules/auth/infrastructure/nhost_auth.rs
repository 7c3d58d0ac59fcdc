// Nhost 认证适配器
//
// 调用托管认证服务的邮箱密码接口，会话只保存在内存中

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use super::SessionStore;
use crate::modules::auth::domain::{AuthSession, AuthStatus, UserId};
use crate::modules::auth::ports::{AuthError, AuthPort};

/// 访问令牌剩余有效期低于该值时先刷新
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct EmailPasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// 登出和刷新令牌共用的请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenRequest<'a> {
    refresh_token: &'a str,
}

/// 注册和登录共用的响应格式；需要邮箱验证时 session 为 null
#[derive(Debug, Deserialize)]
struct SessionPayload {
    session: Option<NhostSession>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NhostSession {
    access_token: String,
    access_token_expires_in: Option<i64>,
    refresh_token: Option<String>,
    user: NhostUser,
}

impl NhostSession {
    fn into_session(self) -> AuthSession {
        let mut session = AuthSession::new(UserId::new(self.user.id), self.access_token);
        if let Some(token) = self.refresh_token {
            session = session.with_refresh_token(token);
        }
        if let Some(secs) = self.access_token_expires_in {
            session = session.with_expiry(Utc::now() + chrono::Duration::seconds(secs));
        }
        session
    }
}

#[derive(Debug, Deserialize)]
struct NhostUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct NhostErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Nhost 认证适配器
pub struct NhostAuthAdapter {
    client: Client,
    base_url: String,
    store: SessionStore,
    refresh_lock: Mutex<()>,
}

impl NhostAuthAdapter {
    /// 创建适配器，状态初始为 Loading，调用 `start()` 后确定
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            store: SessionStore::new(AuthStatus::Loading),
            refresh_lock: Mutex::new(()),
        })
    }

    /// 启动检查
    ///
    /// 会话不落盘，进程启动时没有可恢复的刷新令牌，直接进入未认证状态
    pub fn start(&self) {
        self.store.resolve();
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    async fn post_credentials(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthSession>, AuthError> {
        debug!("POST {}", endpoint);

        let response = self
            .client
            .post(self.api_url(endpoint))
            .json(&EmailPasswordRequest { email, password })
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(status, response).await);
        }

        let payload: SessionPayload = response
            .json()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        Ok(payload.session.map(NhostSession::into_session))
    }

    /// 用刷新令牌换取新会话
    async fn post_refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        debug!("POST token");

        let response = self
            .client
            .post(self.api_url("token"))
            .json(&RefreshTokenRequest { refresh_token })
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(status, response).await);
        }

        let session: NhostSession = response
            .json()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;
        Ok(session.into_session())
    }

    /// 令牌即将过期时刷新会话，返回可用的访问令牌
    ///
    /// 刷新令牌被拒绝时会话作废；网络错误时继续用旧令牌
    async fn fresh_access_token(&self) -> Option<String> {
        let margin = chrono::Duration::seconds(REFRESH_MARGIN_SECS);
        let session = self.store.session()?;
        if !session.expires_within(margin, Utc::now()) {
            return Some(session.access_token);
        }

        let _guard = self.refresh_lock.lock().await;
        // 等锁期间其他请求可能已经刷新过
        let session = self.store.session()?;
        if !session.expires_within(margin, Utc::now()) {
            return Some(session.access_token);
        }
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            return Some(session.access_token);
        };

        match self.post_refresh(refresh_token).await {
            Ok(next) => {
                let token = next.access_token.clone();
                if self.store.renew(&session, next) {
                    Some(token)
                } else {
                    self.store.access_token()
                }
            }
            Err(AuthError::InvalidCredentials) => {
                warn!("refresh token rejected, signing out");
                if self.store.session().and_then(|s| s.refresh_token) == session.refresh_token {
                    self.store.clear();
                }
                None
            }
            Err(e) => {
                warn!("token refresh failed: {}", e);
                Some(session.access_token)
            }
        }
    }

    async fn error_from_response(status: StatusCode, response: reqwest::Response) -> AuthError {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<NhostErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or(text);

        warn!("auth API error: {} - {}", status, message);

        if status == StatusCode::UNAUTHORIZED {
            AuthError::InvalidCredentials
        } else {
            AuthError::ApiError {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[async_trait]
impl AuthPort for NhostAuthAdapter {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        match self
            .post_credentials("signup/email-password", email, password)
            .await?
        {
            Some(session) => self.store.establish(session),
            None => debug!("sign-up accepted, waiting for email verification"),
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let session = self
            .post_credentials("signin/email-password", email, password)
            .await?
            .ok_or_else(|| AuthError::ApiError {
                status: 200,
                message: "sign-in returned no session".to_string(),
            })?;
        self.store.establish(session);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // 本地会话总是清除，远端失败只影响刷新令牌的吊销
        let previous = self.store.clear();
        let Some(refresh_token) = previous.and_then(|s| s.refresh_token) else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.api_url("signout"))
            .json(&RefreshTokenRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(status, response).await);
        }
        Ok(())
    }

    fn status(&self) -> watch::Receiver<AuthStatus> {
        self.store.subscribe()
    }

    fn user_id(&self) -> Option<UserId> {
        self.store.user_id()
    }

    async fn access_token(&self) -> Option<String> {
        self.fresh_access_token().await
    }
}
