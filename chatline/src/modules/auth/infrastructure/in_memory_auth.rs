use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use super::SessionStore;
use crate::modules::auth::domain::{AuthSession, AuthStatus, UserId};
use crate::modules::auth::ports::{AuthError, AuthPort};

/// 认证调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCall {
    SignUp { email: String, password: String },
    SignIn { email: String, password: String },
    SignOut,
}

/// 内存认证提供方
///
/// 用于测试和离线模式；注册成功后直接登录（不需要邮箱验证）
pub struct InMemoryAuthProvider {
    store: SessionStore,
    accounts: Mutex<HashMap<String, (String, UserId)>>,
    calls: Mutex<Vec<AuthCall>>,
}

impl InMemoryAuthProvider {
    /// 状态已确定为未认证
    pub fn new() -> Self {
        Self::with_status(AuthStatus::Unauthenticated)
    }

    /// 状态停留在 Loading，直到调用 `resolve()`
    pub fn pending() -> Self {
        Self::with_status(AuthStatus::Loading)
    }

    fn with_status(status: AuthStatus) -> Self {
        Self {
            store: SessionStore::new(status),
            accounts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn resolve(&self) {
        self.store.resolve();
    }

    /// 预置账户
    pub async fn register(&self, email: &str, password: &str) -> UserId {
        let user_id = UserId::new(Uuid::new_v4().to_string());
        self.accounts
            .lock()
            .await
            .insert(email.to_string(), (password.to_string(), user_id.clone()));
        user_id
    }

    pub async fn calls(&self) -> Vec<AuthCall> {
        self.calls.lock().await.clone()
    }

    fn open_session(&self, user_id: UserId) {
        let token = format!("memory-{}", Uuid::new_v4());
        self.store.establish(AuthSession::new(user_id, token));
    }
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthPort for InMemoryAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.calls.lock().await.push(AuthCall::SignUp {
            email: email.to_string(),
            password: password.to_string(),
        });

        let user_id = {
            let mut accounts = self.accounts.lock().await;
            if accounts.contains_key(email) {
                return Err(AuthError::ApiError {
                    status: 409,
                    message: "email-already-in-use".to_string(),
                });
            }
            let user_id = UserId::new(Uuid::new_v4().to_string());
            accounts.insert(email.to_string(), (password.to_string(), user_id.clone()));
            user_id
        };

        self.open_session(user_id);
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.calls.lock().await.push(AuthCall::SignIn {
            email: email.to_string(),
            password: password.to_string(),
        });

        let user_id = {
            let accounts = self.accounts.lock().await;
            match accounts.get(email) {
                Some((stored, user_id)) if stored == password => user_id.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };

        self.open_session(user_id);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.calls.lock().await.push(AuthCall::SignOut);
        self.store.clear();
        Ok(())
    }

    fn status(&self) -> watch::Receiver<AuthStatus> {
        self.store.subscribe()
    }

    fn user_id(&self) -> Option<UserId> {
        self.store.user_id()
    }

    async fn access_token(&self) -> Option<String> {
        self.store.access_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = InMemoryAuthProvider::new();

        provider.sign_up("a@example.com", "secret").await.unwrap();
        assert_eq!(*provider.status().borrow(), AuthStatus::Authenticated);
        let first_id = provider.user_id().unwrap();

        provider.sign_out().await.unwrap();
        assert_eq!(*provider.status().borrow(), AuthStatus::Unauthenticated);
        assert!(provider.user_id().is_none());

        provider.sign_in("a@example.com", "secret").await.unwrap();
        assert_eq!(provider.user_id(), Some(first_id));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let provider = InMemoryAuthProvider::new();
        provider.register("a@example.com", "secret").await;

        let result = provider.sign_in("a@example.com", "nope").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(*provider.status().borrow(), AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_fails() {
        let provider = InMemoryAuthProvider::new();
        provider.register("a@example.com", "secret").await;

        let result = provider.sign_up("a@example.com", "other").await;

        assert!(matches!(result, Err(AuthError::ApiError { status: 409, .. })));
    }

    #[tokio::test]
    async fn test_pending_provider_starts_loading() {
        let provider = InMemoryAuthProvider::pending();
        assert_eq!(*provider.status().borrow(), AuthStatus::Loading);

        provider.resolve();
        assert_eq!(*provider.status().borrow(), AuthStatus::Unauthenticated);
    }
}
