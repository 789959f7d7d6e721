//! Novel API Port - 小说生成后端抽象
//!
//! 定义后端 REST API 的抽象接口，具体实现在 infrastructure/adapters 层。
//! 响应结构字段缺失时一律回落到默认值，不做严格校验。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::settings::{SettingsKind, SettingsVersion};
use crate::domain::template::Template;

/// 后端 API 错误
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    /// 非 2xx 响应，`message` 为响应体中的 `error` 字段
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("(no error message)"))]
    Status { status: u16, message: Option<String> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// 后端返回的错误说明
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }

    /// 非 2xx 响应取后端说明（缺省为 `fallback`），其余错误取自身描述
    pub fn reason_or(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { .. } => self.server_message().unwrap_or(fallback).to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_status(&self) -> bool {
        matches!(self, ApiError::Status { .. })
    }
}

// ============================================================================
// Templates
// ============================================================================

/// `GET /templates`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatesResponse {
    #[serde(default)]
    pub templates: BTreeMap<String, Template>,
}

// ============================================================================
// Novel info
// ============================================================================

/// `GET /novels/{id}/info`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NovelInfo {
    #[serde(default)]
    pub chapters: ChapterStats,
    #[serde(default)]
    pub summary: SummaryStats,
    #[serde(default)]
    pub memory: MemoryStats,
}

impl NovelInfo {
    /// 已生成的最大章节号
    pub fn max_chapter(&self) -> u32 {
        self.chapters.latest_chapter_file
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChapterStats {
    #[serde(default)]
    pub latest_chapter_file: u32,
    #[serde(default)]
    pub total_chapters: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SummaryStats {
    /// 后端可能返回字符串或其他 JSON 值
    #[serde(default)]
    pub sync_status: serde_json::Value,
}

impl SummaryStats {
    pub fn sync_status_text(&self) -> String {
        match &self.sync_status {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MemoryStats {
    #[serde(default)]
    pub total_chunks: u32,
}

// ============================================================================
// Generation
// ============================================================================

/// `POST /read-outline`
#[derive(Debug, Clone, Serialize)]
pub struct ReadOutlineRequest {
    pub novel_id: String,
    pub chapter_index: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadOutlineResponse {
    #[serde(default)]
    pub outline: Option<String>,
}

/// `POST /generate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateChapterRequest {
    pub template_id: String,
    pub chapter_outline: String,
    pub model_name: String,
    pub update_model_name: Option<String>,
    pub use_state: bool,
    pub use_world_bible: bool,
    pub update_state: bool,
    pub session_id: String,
    pub novel_id: String,
    pub use_previous_chapters: bool,
    pub previous_chapters_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateChapterResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub word_count: u64,
}

/// `POST /save-chapter`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveChapterRequest {
    pub content: String,
    pub novel_id: String,
    pub chapter_index: u32,
    pub auto_save: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveChapterResponse {
    #[serde(default)]
    pub filename: String,
}

/// `POST /update-state`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateStateRequest {
    pub novel_id: String,
    pub chapter_index: u32,
    pub model_name: String,
    pub force_update: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStateResponse {
    #[serde(default)]
    pub summary: Option<String>,
}

// ============================================================================
// Settings
// ============================================================================

/// `GET /settings/{novelId}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsListing {
    #[serde(default)]
    pub character_versions: Vec<SettingsVersion>,
    #[serde(default)]
    pub world_versions: Vec<SettingsVersion>,
}

impl SettingsListing {
    pub fn versions(&self, kind: SettingsKind) -> &[SettingsVersion] {
        match kind {
            SettingsKind::Character => &self.character_versions,
            SettingsKind::World => &self.world_versions,
        }
    }
}

/// `GET /settings/{novelId}/{kind}/{version}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub content: serde_json::Value,
}

/// `POST /settings/{novelId}/{kind}/new`
#[derive(Debug, Clone, Serialize)]
pub struct NewSettingsVersionRequest {
    pub content: serde_json::Value,
    pub base_version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSettingsVersionResponse {
    /// 后端可能返回数字或已补零的字符串
    #[serde(default)]
    pub new_version: serde_json::Value,
}

impl NewSettingsVersionResponse {
    /// 规范化为可直接用于 URL 的版本 ID
    pub fn version_id(&self, kind: SettingsKind) -> Option<String> {
        match &self.new_version {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(|v| kind.format_version(v)),
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

/// `PUT /settings/{novelId}/{kind}/{version}`
#[derive(Debug, Clone, Serialize)]
pub struct SaveSettingsRequest {
    pub content: serde_json::Value,
}

// ============================================================================
// Port
// ============================================================================

/// Novel API Port
///
/// 后端 REST API（base path `/api`）的抽象接口
#[async_trait]
pub trait NovelApiPort: Send + Sync {
    /// `GET /health`
    async fn health_check(&self) -> bool;

    /// `GET /templates`
    async fn list_templates(&self) -> Result<TemplatesResponse, ApiError>;

    /// `POST /templates`
    async fn save_template(&self, template: &Template) -> Result<(), ApiError>;

    /// `GET /template-file/{filename}`，返回纯文本
    async fn template_file(&self, filename: &str) -> Result<String, ApiError>;

    /// `GET /novels/{id}/info`
    async fn novel_info(&self, novel_id: &str) -> Result<NovelInfo, ApiError>;

    /// `POST /read-outline`
    async fn read_outline(&self, request: &ReadOutlineRequest)
        -> Result<ReadOutlineResponse, ApiError>;

    /// `POST /generate`
    async fn generate_chapter(
        &self,
        request: &GenerateChapterRequest,
    ) -> Result<GenerateChapterResponse, ApiError>;

    /// `POST /save-chapter`
    async fn save_chapter(&self, request: &SaveChapterRequest)
        -> Result<SaveChapterResponse, ApiError>;

    /// `POST /update-state`
    async fn update_state(&self, request: &UpdateStateRequest)
        -> Result<UpdateStateResponse, ApiError>;

    /// `GET /settings/{novelId}`
    async fn list_settings(&self, novel_id: &str) -> Result<SettingsListing, ApiError>;

    /// `GET /settings/{novelId}/{kind}/{version}`
    async fn get_settings(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        version: &str,
    ) -> Result<SettingsDocument, ApiError>;

    /// `POST /settings/{novelId}/{kind}/new`
    async fn create_settings_version(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        request: &NewSettingsVersionRequest,
    ) -> Result<NewSettingsVersionResponse, ApiError>;

    /// `PUT /settings/{novelId}/{kind}/{version}`
    async fn save_settings(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        version: &str,
        request: &SaveSettingsRequest,
    ) -> Result<(), ApiError>;
}
