use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

use crate::modules::auth::domain::{AuthSession, AuthStatus, UserId};

/// 认证会话存储
///
/// 状态信号和当前会话放在一起，保证两者同步更新
pub struct SessionStore {
    status: watch::Sender<AuthStatus>,
    session: RwLock<Option<AuthSession>>,
}

impl SessionStore {
    pub fn new(initial: AuthStatus) -> Self {
        let (status, _) = watch::channel(initial);
        Self {
            status,
            session: RwLock::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    pub fn current(&self) -> AuthStatus {
        *self.status.borrow()
    }

    /// 启动检查结束且没有会话：Loading -> Unauthenticated
    pub fn resolve(&self) {
        self.status.send_if_modified(|status| {
            if *status == AuthStatus::Loading {
                *status = AuthStatus::Unauthenticated;
                true
            } else {
                false
            }
        });
    }

    pub fn establish(&self, session: AuthSession) {
        tracing::debug!(user_id = %session.user_id, "auth session established");
        *self.write() = Some(session);
        self.mark_authenticated();
    }

    /// 用刷新后的会话替换 `previous`；期间已登出或换了会话时不生效
    pub fn renew(&self, previous: &AuthSession, next: AuthSession) -> bool {
        let mut session = self.write();
        match session.as_ref() {
            Some(current) if current.refresh_token == previous.refresh_token => {
                tracing::debug!(user_id = %next.user_id, "auth session renewed");
                *session = Some(next);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&self) -> Option<AuthSession> {
        let previous = self.write().take();
        self.status.send_replace(AuthStatus::Unauthenticated);
        previous
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.read().as_ref().map(|s| s.user_id.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.read().clone()
    }

    fn mark_authenticated(&self) {
        self.status.send_if_modified(|status| {
            let changed = *status != AuthStatus::Authenticated;
            *status = AuthStatus::Authenticated;
            changed
        });
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<AuthSession>> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<AuthSession>> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}
