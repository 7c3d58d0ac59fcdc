use std::sync::Arc;

use crate::infrastructure::EventBus;
use crate::modules::auth::{AuthPort, InMemoryAuthProvider};
use crate::modules::chat::{ChatModule, InMemoryChatBackend};

/// 应用全局状态
///
/// 组件共享的依赖：认证端口和聊天模块。
/// 各组件自己的界面状态不放在这里
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthPort>,
    pub chat: Arc<ChatModule>,
}

impl AppState {
    pub fn new(auth: Arc<dyn AuthPort>, chat: Arc<ChatModule>) -> Self {
        Self { auth, chat }
    }

    /// 内存认证加内存后端，当前用户跟随认证状态
    pub fn in_memory(auth: Arc<InMemoryAuthProvider>) -> (Self, Arc<InMemoryChatBackend>) {
        let auth: Arc<dyn AuthPort> = auth;
        let backend = Arc::new(InMemoryChatBackend::with_auth(auth.clone()));
        let chat = Arc::new(ChatModule::in_memory(
            backend.clone(),
            Arc::new(EventBus::new()),
        ));
        (Self::new(auth, chat), backend)
    }
}
