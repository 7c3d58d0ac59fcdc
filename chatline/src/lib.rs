pub mod infrastructure;
pub mod modules;
pub mod shared;
pub mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use infrastructure::{AppState, EventBus};
use modules::auth::{AuthPort, InMemoryAuthProvider, NhostAuthAdapter};
use modules::chat::{GraphqlChatRepository, GraphqlClient};
use modules::config::BackendConfig;
use modules::{ChatModule, ConfigModule};
use shared::AppResult;
use ui::Shell;

/// 配置文件路径的环境变量
pub const CONFIG_ENV: &str = "CHATLINE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "chatline.json";

pub async fn run() -> AppResult<()> {
    // 初始化日志，输出到 stderr，避免和界面混在一起
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatline=info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("chatline starting...");

    let offline_flag = std::env::args().skip(1).any(|arg| arg == "--offline");
    let config = if offline_flag {
        BackendConfig::offline()
    } else {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        tracing::info!("loading config from {:?}", path);
        let module = ConfigModule::new_with_file(path.clone());
        if module.ensure_template().await? {
            tracing::warn!("wrote config template to {:?}, fill in subdomain and region", path);
        }
        module.load().await?
    };

    let app = if config.offline {
        offline_state()
    } else {
        connect(&config)?
    };

    Shell::new(app)
        .await
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}

/// 连接托管后端
fn connect(config: &BackendConfig) -> AppResult<AppState> {
    let auth_url = config.auth_url()?;
    let graphql_url = config.graphql_url()?;
    let ws_url = config.graphql_ws_url()?;
    tracing::info!("auth: {}, graphql: {}", auth_url, graphql_url);

    let adapter = NhostAuthAdapter::new(auth_url.as_str(), config.request_timeout_secs)?;
    adapter.start();
    let auth: Arc<dyn AuthPort> = Arc::new(adapter);

    let client = GraphqlClient::new(graphql_url, auth.clone(), config.request_timeout_secs)?;
    let repository = Arc::new(GraphqlChatRepository::new(client, ws_url, auth.clone()));
    let chat = Arc::new(ChatModule::with_graphql(
        repository,
        Arc::new(EventBus::new()),
    ));

    Ok(AppState::new(auth, chat))
}

/// 离线演示：内存认证和内存后端，机器人回显消息
fn offline_state() -> AppState {
    tracing::info!("running offline with an in-memory backend");
    let auth = Arc::new(InMemoryAuthProvider::new());
    let (app, backend) = AppState::in_memory(auth);
    backend.echo_bot(true);
    app
}
