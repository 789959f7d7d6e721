//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::application::commands::GenerationOptions;
use crate::application::managers::BatchGeneratorConfig;
use crate::infrastructure::adapters::HttpNovelApiClientConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 后端 API 配置
    #[serde(default)]
    pub api: ApiConfig,

    /// 章节生成默认参数
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 批量生成配置
    #[serde(default)]
    pub batch: BatchConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 后端 API 配置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// 基础 URL，包含 `/api` 前缀
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 请求超时时间（秒），0 表示不设超时
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: 0,
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> HttpNovelApiClientConfig {
        HttpNovelApiClientConfig::new(self.base_url.clone()).with_timeout(self.timeout_secs)
    }
}

/// 章节生成默认参数
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 生成模型
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// 状态更新模型，未设置时使用生成模型
    #[serde(default)]
    pub update_model_name: Option<String>,

    #[serde(default = "default_true")]
    pub use_state: bool,

    #[serde(default = "default_true")]
    pub use_world_bible: bool,

    #[serde(default = "default_true")]
    pub update_state: bool,

    #[serde(default = "default_true")]
    pub use_previous_chapters: bool,

    /// 参考的前文章节数
    #[serde(default = "default_previous_chapters")]
    pub previous_chapters_count: u32,
}

fn default_model_name() -> String {
    "deepseek-chat".to_string()
}

fn default_true() -> bool {
    true
}

fn default_previous_chapters() -> u32 {
    1
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            update_model_name: None,
            use_state: true,
            use_world_bible: true,
            update_state: true,
            use_previous_chapters: true,
            previous_chapters_count: default_previous_chapters(),
        }
    }
}

impl From<&GenerationConfig> for GenerationOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            model_name: config.model_name.clone(),
            update_model_name: config.update_model_name.clone(),
            use_state: config.use_state,
            use_world_bible: config.use_world_bible,
            update_state: config.update_state,
            use_previous_chapters: config.use_previous_chapters,
            previous_chapters_count: Some(config.previous_chapters_count),
        }
    }
}

/// 批量生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// 完成状态自动清空的延迟（秒）
    #[serde(default = "default_status_clear")]
    pub status_clear_secs: u64,
}

fn default_status_clear() -> u64 {
    3
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            status_clear_secs: default_status_clear(),
        }
    }
}

impl From<&BatchConfig> for BatchGeneratorConfig {
    fn from(config: &BatchConfig) -> Self {
        Self {
            status_clear_after: Duration::from_secs(config.status_clear_secs),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.timeout_secs, 0);
        assert_eq!(config.generation.model_name, "deepseek-chat");
        assert_eq!(config.batch.status_clear_secs, 3);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_generation_options_from_config() {
        let mut config = GenerationConfig::default();
        config.use_world_bible = false;
        config.update_model_name = Some("qwen".to_string());
        config.previous_chapters_count = 3;

        let options = GenerationOptions::from(&config);
        assert!(!options.use_world_bible);
        assert_eq!(options.update_model(), Some("qwen"));
        assert_eq!(options.previous_chapters_count(), 3);
    }

    #[test]
    fn test_batch_generator_config() {
        let config = BatchGeneratorConfig::from(&BatchConfig::default());
        assert_eq!(config.status_clear_after, Duration::from_secs(3));
    }
}
