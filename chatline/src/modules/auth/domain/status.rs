use serde::{Deserialize, Serialize};

/// 认证状态
///
/// 三值信号：启动时为 `Loading`，认证提供方确定会话后变为另外两者之一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// 表单模式：注册或登录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthMode {
    SignUp,
    #[default]
    SignIn,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::SignUp => AuthMode::SignIn,
            AuthMode::SignIn => AuthMode::SignUp,
        }
    }

    /// 表单标题和提交按钮文字
    pub fn title(&self) -> &'static str {
        match self {
            AuthMode::SignUp => "Sign Up",
            AuthMode::SignIn => "Sign In",
        }
    }

    /// 切换模式的提示文字
    pub fn toggle_prompt(&self) -> &'static str {
        match self {
            AuthMode::SignUp => "Already have an account? Sign In",
            AuthMode::SignIn => "Don't have an account? Sign Up",
        }
    }
}
