// In-Memory Config Repository
//
// 基于内存的配置仓储实现（用于测试和离线模式）

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::modules::config::domain::BackendConfig;
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 内存配置仓储
pub struct InMemoryConfigRepository {
    config: RwLock<BackendConfig>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::with_config(BackendConfig::default())
    }

    pub fn with_config(config: BackendConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

impl Default for InMemoryConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn load(&self) -> Result<BackendConfig, ConfigError> {
        Ok(self.config.read().await.clone())
    }

    async fn save(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        *self.config.write().await = config.clone();
        Ok(())
    }

    async fn exists(&self) -> Result<bool, ConfigError> {
        // 内存仓储总是存在
        Ok(true)
    }
}
