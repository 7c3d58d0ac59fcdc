// Modules Layer - 业务模块
//
// 按照六边形架构组织的业务模块：
// - auth: 认证模块，处理登录状态和会话
// - chat: 聊天模块，处理会话列表、消息订阅和发送
// - config: 配置模块，处理后端连接设置

pub mod auth;
pub mod chat;
pub mod config;

pub use auth::AuthPort;
pub use chat::ChatModule;
pub use config::ConfigModule;
