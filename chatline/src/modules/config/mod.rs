// Config Module
//
// 后端连接配置，采用与聊天模块相同的分层:
// - domain: BackendConfig 及地址推导
// - ports: 配置仓储端口
// - infrastructure: 文件和内存仓储

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::BackendConfig;
pub use infrastructure::{FileConfigRepository, InMemoryConfigRepository};
pub use ports::{ConfigError, ConfigRepository};

use std::sync::Arc;

/// Config 模块容器
pub struct ConfigModule {
    repository: Arc<dyn ConfigRepository>,
}

impl ConfigModule {
    /// 使用内存仓储创建（用于测试）
    pub fn new_in_memory(config: BackendConfig) -> Self {
        Self::with_repository(Arc::new(InMemoryConfigRepository::with_config(config)))
    }

    /// 使用文件存储创建
    pub fn new_with_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_repository(Arc::new(FileConfigRepository::new(path)))
    }

    pub fn with_repository(repository: Arc<dyn ConfigRepository>) -> Self {
        Self { repository }
    }

    /// 加载并校验配置
    pub async fn load(&self) -> Result<BackendConfig, ConfigError> {
        let config = self.repository.load().await?;
        config.validate()?;
        Ok(config)
    }

    /// 配置不存在时写入默认模板，返回是否写入
    pub async fn ensure_template(&self) -> Result<bool, ConfigError> {
        if self.repository.exists().await? {
            return Ok(false);
        }
        self.repository.save(&BackendConfig::default()).await?;
        Ok(true)
    }
}
