use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};

use super::auth_form::{AuthForm, AuthFormView};
use super::workspace::{ChatWorkspace, WorkspaceView};
use crate::infrastructure::AppState;
use crate::modules::auth::AuthStatus;

/// 当前挂载的界面
#[derive(Clone)]
pub enum GateView {
    Loading,
    Auth(Arc<AuthForm>),
    Workspace(Arc<ChatWorkspace>),
}

impl GateView {
    /// 该界面对应的认证状态
    fn status(&self) -> AuthStatus {
        match self {
            GateView::Loading => AuthStatus::Loading,
            GateView::Auth(_) => AuthStatus::Unauthenticated,
            GateView::Workspace(_) => AuthStatus::Authenticated,
        }
    }
}

/// 界面渲染数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Auth(AuthFormView),
    Workspace(WorkspaceView),
}

/// 认证门
///
/// 跟随认证状态在占位、表单和工作区之间切换。
/// 状态不变时保留已挂载的组件
pub struct SessionGate {
    app: AppState,
    status: Mutex<watch::Receiver<AuthStatus>>,
    view: RwLock<GateView>,
}

impl SessionGate {
    pub async fn mount(app: AppState) -> Self {
        let status = app.auth.status();
        let gate = Self {
            app,
            status: Mutex::new(status),
            view: RwLock::new(GateView::Loading),
        };
        gate.sync().await;
        gate
    }

    /// 读取最新状态并切换界面
    pub async fn sync(&self) -> AuthStatus {
        let status = *self.status.lock().await.borrow_and_update();

        let mut view = self.view.write().await;
        if view.status() == status {
            return status;
        }
        match status {
            AuthStatus::Loading => {
                *view = GateView::Loading;
            }
            AuthStatus::Unauthenticated => {
                tracing::debug!("showing auth form");
                *view = GateView::Auth(Arc::new(AuthForm::new(self.app.auth.clone())));
            }
            AuthStatus::Authenticated => {
                tracing::debug!("mounting chat workspace");
                *view = GateView::Workspace(Arc::new(
                    ChatWorkspace::mount(self.app.clone()).await,
                ));
            }
        }
        status
    }

    pub async fn view(&self) -> GateView {
        self.view.read().await.clone()
    }

    pub async fn screen(&self) -> Screen {
        match self.view().await {
            GateView::Loading => Screen::Loading,
            GateView::Auth(form) => Screen::Auth(form.view().await),
            GateView::Workspace(workspace) => Screen::Workspace(workspace.view().await),
        }
    }
}
