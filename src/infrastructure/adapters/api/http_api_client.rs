//! HTTP Novel API Client - 调用小说生成后端
//!
//! 实现 NovelApiPort trait，通过 HTTP/JSON 调用后端 REST API
//!
//! 后端约定:
//! - 所有接口位于 base path `/api` 下
//! - 失败响应体为 `{"error": "..."}`（可能缺失）
//! - `GET /template-file/{filename}` 返回纯文本

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    ApiError, GenerateChapterRequest, GenerateChapterResponse, NewSettingsVersionRequest,
    NewSettingsVersionResponse, NovelApiPort, NovelInfo, ReadOutlineRequest, ReadOutlineResponse,
    SaveChapterRequest, SaveChapterResponse, SaveSettingsRequest, SettingsDocument,
    SettingsListing, TemplatesResponse, UpdateStateRequest, UpdateStateResponse,
};
use crate::domain::settings::SettingsKind;
use crate::domain::template::Template;

/// 失败响应体
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP 客户端配置
#[derive(Debug, Clone)]
pub struct HttpNovelApiClientConfig {
    /// API 基础 URL（包含 `/api` 前缀）
    pub base_url: String,
    /// 请求超时时间（秒），0 表示不设超时
    pub timeout_secs: u64,
}

impl Default for HttpNovelApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 0,
        }
    }
}

impl HttpNovelApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 后端客户端
pub struct HttpNovelApiClient {
    client: Client,
    base_url: String,
}

impl HttpNovelApiClient {
    /// 创建新的客户端
    pub fn new(config: HttpNovelApiClientConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, ApiError> {
        Self::new(HttpNovelApiClientConfig::default())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn settings_url(&self, novel_id: &str, kind: SettingsKind, tail: &str) -> String {
        self.url(&format!("/settings/{}/{}/{}", novel_id, kind.as_str(), tail))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(&url).send().await.map_err(map_send_error)?;
        read_json(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;
        read_json(response).await
    }
}

fn map_send_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_connect() {
        ApiError::NetworkError(format!("Cannot connect to API service: {}", e))
    } else {
        ApiError::NetworkError(e.to_string())
    }
}

/// 非 2xx 时解析 `{error}` 并转为 ApiError::Status
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error);

    tracing::debug!(status = %status, body = %body, "API request rejected");

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// 只关心状态码的接口，响应体忽略
async fn read_empty(response: Response) -> Result<(), ApiError> {
    ensure_success(response).await.map(|_| ())
}

#[async_trait]
impl NovelApiPort for HttpNovelApiClient {
    async fn health_check(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Health check failed");
                false
            }
        }
    }

    async fn list_templates(&self) -> Result<TemplatesResponse, ApiError> {
        self.get_json("/templates").await
    }

    async fn save_template(&self, template: &Template) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/templates"))
            .json(template)
            .send()
            .await
            .map_err(map_send_error)?;
        read_empty(response).await?;

        tracing::info!(template_id = %template.id, "Template saved");
        Ok(())
    }

    async fn template_file(&self, filename: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/template-file/{}", filename)))
            .send()
            .await
            .map_err(map_send_error)?;
        let response = ensure_success(response).await?;
        response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read file: {}", e)))
    }

    async fn novel_info(&self, novel_id: &str) -> Result<NovelInfo, ApiError> {
        self.get_json(&format!("/novels/{}/info", novel_id)).await
    }

    async fn read_outline(
        &self,
        request: &ReadOutlineRequest,
    ) -> Result<ReadOutlineResponse, ApiError> {
        self.post_json("/read-outline", request).await
    }

    async fn generate_chapter(
        &self,
        request: &GenerateChapterRequest,
    ) -> Result<GenerateChapterResponse, ApiError> {
        tracing::debug!(
            novel_id = %request.novel_id,
            template_id = %request.template_id,
            model = %request.model_name,
            outline_len = request.chapter_outline.chars().count(),
            "Sending generate request"
        );
        self.post_json("/generate", request).await
    }

    async fn save_chapter(
        &self,
        request: &SaveChapterRequest,
    ) -> Result<SaveChapterResponse, ApiError> {
        self.post_json("/save-chapter", request).await
    }

    async fn update_state(
        &self,
        request: &UpdateStateRequest,
    ) -> Result<UpdateStateResponse, ApiError> {
        self.post_json("/update-state", request).await
    }

    async fn list_settings(&self, novel_id: &str) -> Result<SettingsListing, ApiError> {
        self.get_json(&format!("/settings/{}", novel_id)).await
    }

    async fn get_settings(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        version: &str,
    ) -> Result<SettingsDocument, ApiError> {
        let url = self.settings_url(novel_id, kind, version);
        let response = self.client.get(&url).send().await.map_err(map_send_error)?;
        read_json(response).await
    }

    async fn create_settings_version(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        request: &NewSettingsVersionRequest,
    ) -> Result<NewSettingsVersionResponse, ApiError> {
        let url = self.settings_url(novel_id, kind, "new");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_send_error)?;
        read_json(response).await
    }

    async fn save_settings(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        version: &str,
        request: &SaveSettingsRequest,
    ) -> Result<(), ApiError> {
        let url = self.settings_url(novel_id, kind, version);
        let response = self
            .client
            .put(&url)
            .json(request)
            .send()
            .await
            .map_err(map_send_error)?;
        read_empty(response).await
    }
}
