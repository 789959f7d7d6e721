//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（novelgen.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["novelgen", "novelgen.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `NOVELGEN_`，层级分隔符 `__`）
/// 2. 配置文件（novelgen.toml 或 novelgen.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `NOVELGEN_API__BASE_URL=http://backend:5000/api`
/// - `NOVELGEN_API__TIMEOUT_SECS=600`
/// - `NOVELGEN_GENERATION__MODEL_NAME=deepseek-chat`
/// - `NOVELGEN_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("api.base_url", "http://localhost:5000/api")?
        .set_default("api.timeout_secs", 0)?
        .set_default("generation.model_name", "deepseek-chat")?
        .set_default("generation.use_state", true)?
        .set_default("generation.use_world_bible", true)?
        .set_default("generation.update_state", true)?
        .set_default("generation.use_previous_chapters", true)?
        .set_default("generation.previous_chapters_count", 1)?
        .set_default("batch.status_clear_secs", 3)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: NOVELGEN_API__BASE_URL=http://backend:5000/api
    builder = builder.add_source(
        Environment::with_prefix("NOVELGEN")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "API base URL cannot be empty".to_string(),
        ));
    }

    if config.generation.model_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Model name cannot be empty".to_string(),
        ));
    }

    if config.generation.previous_chapters_count == 0 {
        return Err(ConfigError::ValidationError(
            "previous_chapters_count must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("API Base URL: {}", config.api.base_url);
    if config.api.timeout_secs > 0 {
        tracing::info!("API Timeout: {}s", config.api.timeout_secs);
    } else {
        tracing::info!("API Timeout: none");
    }
    tracing::info!("Model: {}", config.generation.model_name);
    if let Some(update_model) = &config.generation.update_model_name {
        tracing::info!("Update Model: {}", update_model);
    }
    tracing::info!(
        "Previous Chapters: {} (enabled: {})",
        config.generation.previous_chapters_count,
        config.generation.use_previous_chapters
    );
    tracing::info!("Status Clear: {}s", config.batch.status_clear_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
