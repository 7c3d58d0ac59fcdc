// File-based Config Repository
//
// JSON 文件配置仓储，带内存缓存

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::modules::config::domain::BackendConfig;
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 文件配置仓储
pub struct FileConfigRepository {
    /// 配置文件路径
    config_path: PathBuf,
    /// 内存缓存
    cache: RwLock<Option<BackendConfig>>,
}

impl FileConfigRepository {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            cache: RwLock::new(None),
        }
    }

    async fn load_from_file(&self) -> Result<Option<BackendConfig>, ConfigError> {
        if !tokio::fs::try_exists(&self.config_path)
            .await
            .map_err(|e| ConfigError::StorageError(e.to_string()))?
        {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| ConfigError::StorageError(e.to_string()))?;

        let config: BackendConfig = serde_json::from_str(&content)?;
        Ok(Some(config))
    }

    async fn save_to_file(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ConfigError::StorageError(e.to_string()))?;
            }
        }

        let content = serde_json::to_string_pretty(config)?;

        tokio::fs::write(&self.config_path, content)
            .await
            .map_err(|e| ConfigError::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ConfigRepository for FileConfigRepository {
    async fn load(&self) -> Result<BackendConfig, ConfigError> {
        {
            let cache = self.cache.read().await;
            if let Some(ref config) = *cache {
                return Ok(config.clone());
            }
        }

        let config = match self.load_from_file().await? {
            Some(config) => config,
            None => {
                tracing::info!(
                    "No config file at {:?}, using defaults",
                    self.config_path
                );
                BackendConfig::default()
            }
        };

        *self.cache.write().await = Some(config.clone());
        Ok(config)
    }

    async fn save(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        self.save_to_file(config).await?;
        *self.cache.write().await = Some(config.clone());
        Ok(())
    }

    async fn exists(&self) -> Result<bool, ConfigError> {
        tokio::fs::try_exists(&self.config_path)
            .await
            .map_err(|e| ConfigError::StorageError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("chatline-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let repo = FileConfigRepository::new(temp_path("missing.json"));

        assert!(!repo.exists().await.unwrap());
        assert_eq!(repo.load().await.unwrap(), BackendConfig::default());
    }

    #[tokio::test]
    async fn test_save_then_load_from_fresh_repository() {
        let path = temp_path("chatline.json");
        let repo = FileConfigRepository::new(path.clone());
        let config = BackendConfig::new("abc", "eu-central-1");

        repo.save(&config).await.unwrap();

        let fresh = FileConfigRepository::new(path.clone());
        assert!(fresh.exists().await.unwrap());
        assert_eq!(fresh.load().await.unwrap(), config);

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }

    #[tokio::test]
    async fn test_malformed_file_is_a_serialization_error() {
        let path = temp_path("broken.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let repo = FileConfigRepository::new(path.clone());
        let result = repo.load().await;

        assert!(matches!(result, Err(ConfigError::SerializationError(_))));
        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
