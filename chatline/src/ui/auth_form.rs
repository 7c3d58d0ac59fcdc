use std::sync::Arc;
use tokio::sync::RwLock;

use crate::modules::auth::{AuthError, AuthMode, AuthPort};

/// 提交中的按钮文字
pub const LOADING_LABEL: &str = "Loading...";

/// 提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// 已有请求在进行中
    Ignored,
}

/// 已占用提交状态的请求，由 `finish_submit` 发出
#[derive(Debug)]
pub struct SubmitRequest {
    mode: AuthMode,
    email: String,
    password: String,
}

#[derive(Debug, Default)]
struct FormState {
    email: String,
    password: String,
    mode: AuthMode,
    submitting: bool,
    last_error: Option<String>,
}

/// 表单渲染数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFormView {
    pub title: &'static str,
    pub email: String,
    pub password_len: usize,
    pub action_label: &'static str,
    pub action_enabled: bool,
    pub toggle_prompt: &'static str,
}

/// 登录 / 注册表单
pub struct AuthForm {
    auth: Arc<dyn AuthPort>,
    state: RwLock<FormState>,
}

impl AuthForm {
    pub fn new(auth: Arc<dyn AuthPort>) -> Self {
        Self {
            auth,
            state: RwLock::new(FormState::default()),
        }
    }

    pub async fn set_email(&self, email: impl Into<String>) {
        self.state.write().await.email = email.into();
    }

    pub async fn set_password(&self, password: impl Into<String>) {
        self.state.write().await.password = password.into();
    }

    /// 切换模式，不清空字段
    pub async fn toggle_mode(&self) -> AuthMode {
        let mut state = self.state.write().await;
        state.mode = state.mode.toggled();
        state.mode
    }

    pub async fn mode(&self) -> AuthMode {
        self.state.read().await.mode
    }

    pub async fn is_submitting(&self) -> bool {
        self.state.read().await.submitting
    }

    /// 最近一次失败的描述，不参与渲染
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    /// 以当前字段调用对应的认证操作
    pub async fn submit(&self) -> Result<SubmitOutcome, AuthError> {
        match self.begin_submit().await {
            Some(request) => {
                self.finish_submit(request).await?;
                Ok(SubmitOutcome::Submitted)
            }
            None => Ok(SubmitOutcome::Ignored),
        }
    }

    /// 进入提交状态并取出当前字段；已有请求在进行中时返回 None
    pub async fn begin_submit(&self) -> Option<SubmitRequest> {
        let mut state = self.state.write().await;
        if state.submitting {
            tracing::debug!("auth request already in flight, ignoring submit");
            return None;
        }
        state.submitting = true;
        Some(SubmitRequest {
            mode: state.mode,
            email: state.email.clone(),
            password: state.password.clone(),
        })
    }

    /// 发出认证请求并退出提交状态
    pub async fn finish_submit(&self, request: SubmitRequest) -> Result<(), AuthError> {
        let SubmitRequest {
            mode,
            email,
            password,
        } = request;
        let result = match mode {
            AuthMode::SignUp => self.auth.sign_up(&email, &password).await,
            AuthMode::SignIn => self.auth.sign_in(&email, &password).await,
        };

        let mut state = self.state.write().await;
        state.submitting = false;
        match result {
            Ok(()) => {
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", mode.title(), e);
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn view(&self) -> AuthFormView {
        let state = self.state.read().await;
        AuthFormView {
            title: state.mode.title(),
            email: state.email.clone(),
            password_len: state.password.chars().count(),
            action_label: if state.submitting {
                LOADING_LABEL
            } else {
                state.mode.title()
            },
            action_enabled: !state.submitting,
            toggle_prompt: state.mode.toggle_prompt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::{
        AuthCall, AuthSession, AuthStatus, InMemoryAuthProvider, SessionStore, UserId,
    };
    use async_trait::async_trait;
    use tokio::sync::{watch, Notify};

    /// 登录请求挂起，直到测试放行
    struct SlowAuth {
        store: SessionStore,
        release: Notify,
    }

    #[async_trait]
    impl AuthPort for SlowAuth {
        async fn sign_up(&self, _email: &str, _password: &str) -> Result<(), AuthError> {
            self.release.notified().await;
            Ok(())
        }

        async fn sign_in(&self, _email: &str, _password: &str) -> Result<(), AuthError> {
            self.release.notified().await;
            self.store
                .establish(AuthSession::new(UserId::new("slow-user"), "token"));
            Ok(())
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
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

    #[tokio::test]
    async fn test_submit_uses_mode_and_current_fields() {
        let auth = Arc::new(InMemoryAuthProvider::new());
        let form = AuthForm::new(auth.clone());

        form.set_email("a@example.com").await;
        form.set_password("secret").await;
        assert_eq!(form.toggle_mode().await, AuthMode::SignUp);
        form.submit().await.unwrap();

        assert_eq!(
            auth.calls().await,
            vec![AuthCall::SignUp {
                email: "a@example.com".to_string(),
                password: "secret".to_string(),
            }]
        );
        assert_eq!(auth.status().borrow().clone(), AuthStatus::Authenticated);
    }

    #[tokio::test]
    async fn test_toggle_keeps_fields() {
        let form = AuthForm::new(Arc::new(InMemoryAuthProvider::new()));
        form.set_email("a@example.com").await;
        form.set_password("secret").await;

        form.toggle_mode().await;
        form.toggle_mode().await;

        let view = form.view().await;
        assert_eq!(view.email, "a@example.com");
        assert_eq!(view.password_len, 6);
        assert_eq!(view.title, "Sign In");
        assert_eq!(view.toggle_prompt, "Don't have an account? Sign Up");
    }

    #[tokio::test]
    async fn test_sign_in_failure_is_recorded_not_rendered() {
        let auth = Arc::new(InMemoryAuthProvider::new());
        auth.register("a@example.com", "right").await;
        let form = AuthForm::new(auth.clone());
        form.set_email("a@example.com").await;
        form.set_password("wrong").await;

        let result = form.submit().await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(form.last_error().await.is_some());
        let view = form.view().await;
        assert!(view.action_enabled);
        assert_eq!(view.action_label, "Sign In");
    }

    #[tokio::test]
    async fn test_duplicate_submit_is_ignored() {
        let auth = Arc::new(SlowAuth {
            store: SessionStore::new(AuthStatus::Unauthenticated),
            release: Notify::new(),
        });
        let form = Arc::new(AuthForm::new(auth.clone()));
        form.set_email("a@example.com").await;
        form.set_password("secret").await;

        let first = tokio::spawn({
            let form = form.clone();
            async move { form.submit().await }
        });
        while !form.is_submitting().await {
            tokio::task::yield_now().await;
        }

        let view = form.view().await;
        assert_eq!(view.action_label, LOADING_LABEL);
        assert!(!view.action_enabled);
        assert_eq!(form.submit().await.unwrap(), SubmitOutcome::Ignored);

        auth.release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), SubmitOutcome::Submitted);
        assert!(!form.is_submitting().await);
        assert_eq!(*auth.status().borrow(), AuthStatus::Authenticated);
    }

    #[tokio::test]
    async fn test_begin_submit_shows_loading_until_finished() {
        let auth = Arc::new(InMemoryAuthProvider::new());
        auth.register("a@example.com", "pw").await;
        let form = AuthForm::new(auth.clone());
        form.set_email("a@example.com").await;
        form.set_password("pw").await;

        let request = form.begin_submit().await.unwrap();
        assert_eq!(form.view().await.action_label, LOADING_LABEL);
        assert!(form.begin_submit().await.is_none());
        assert!(auth.calls().await.is_empty());

        form.finish_submit(request).await.unwrap();
        assert!(form.view().await.action_enabled);
        assert_eq!(*auth.status().borrow(), AuthStatus::Authenticated);
    }
}
