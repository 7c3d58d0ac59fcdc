// UI - 无界面组件
//
// 组件只保存自己的界面状态，通过 AppState 访问认证端口和聊天模块：
// - session_gate: 根据认证状态选择界面
// - auth_form: 登录 / 注册表单
// - workspace: 会话列表加当前会话
// - render / shell: 终端渲染和行命令外壳

pub mod auth_form;
pub mod chat_list;
pub mod message_view;
pub mod render;
pub mod session_gate;
pub mod shell;
pub mod workspace;

pub use auth_form::{AuthForm, AuthFormView, SubmitOutcome};
pub use chat_list::{ChatList, ChatListItem, ChatListView};
pub use message_view::{MessageView, MessageViewSnapshot, SendOutcome};
pub use render::render;
pub use session_gate::{GateView, Screen, SessionGate};
pub use shell::{Command, Shell};
pub use workspace::{ChatWorkspace, WorkspaceView};
