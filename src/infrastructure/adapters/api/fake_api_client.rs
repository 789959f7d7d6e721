//! Fake Novel API - 内存中的后端实现
//!
//! 不发网络请求，用于离线演示和测试。
//! 生成请求本身不带章节号，按最近一次读取细纲的章节归属。

use async_trait::async_trait;
use chrono::Local;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::{Mutex, Notify};

use crate::application::ports::{
    ApiError, ChapterStats, GenerateChapterRequest, GenerateChapterResponse, MemoryStats,
    NewSettingsVersionRequest, NewSettingsVersionResponse, NovelApiPort, NovelInfo,
    ReadOutlineRequest, ReadOutlineResponse, SaveChapterRequest, SaveChapterResponse,
    SaveSettingsRequest, SettingsDocument, SettingsListing, SummaryStats, TemplatesResponse,
    UpdateStateRequest, UpdateStateResponse,
};
use crate::domain::parse_leading_int;
use crate::domain::settings::{SettingsKind, SettingsVersion};
use crate::domain::template::Template;

#[derive(Debug, Default)]
struct FakeNovel {
    chapters: BTreeMap<u32, String>,
    memory_chunks: u32,
    /// 覆盖 `latest_chapter_file` 的上报值
    reported_latest: Option<u32>,
}

impl FakeNovel {
    fn latest(&self) -> u32 {
        self.reported_latest
            .unwrap_or_else(|| self.chapters.keys().next_back().copied().unwrap_or(0))
    }
}

#[derive(Debug, Default)]
struct FakeState {
    templates: BTreeMap<String, Template>,
    template_files: HashMap<String, String>,
    novels: HashMap<String, FakeNovel>,
    outlines: HashMap<(String, u32), String>,
    settings: HashMap<(String, SettingsKind), BTreeMap<u32, serde_json::Value>>,
    pending_chapter: Option<u32>,
    generated_chapters: Vec<u32>,
    sent_outlines: Vec<String>,
    saved_chapters: Vec<u32>,
    state_updates: Vec<UpdateStateRequest>,
    generation_failures: HashMap<u32, String>,
    missing_files: HashSet<String>,
    outline_endpoint_missing: bool,
    outline_unreachable: bool,
    auto_save_broken: bool,
    unhealthy: bool,
}

/// 暂停点：生成指定章节时等待外部放行
#[derive(Debug, Default)]
struct Gate {
    chapter: std::sync::atomic::AtomicU32,
    reached: Notify,
    release: Notify,
}

/// 内存后端
#[derive(Debug, Default)]
pub struct FakeNovelApi {
    state: Mutex<FakeState>,
    gate: Gate,
}

impl FakeNovelApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带示例数据的后端（离线模式使用）
    pub async fn with_demo_data() -> Self {
        let api = Self::new();
        api.insert_template(Template {
            id: "001".to_string(),
            name: "玄幻升级流".to_string(),
            category: "玄幻".to_string(),
            word_count_range: crate::domain::template::WordCountRange {
                min: 2000,
                max: 3000,
            },
            files: crate::domain::template::TemplateFiles::for_id("001"),
            contents: Default::default(),
            created_date: Some("2024-01-01".to_string()),
        })
        .await;
        api.add_novel("demo", 0).await;
        api.insert_settings("demo", SettingsKind::Character, 1, serde_json::json!({"主角": "林动"}))
            .await;
        api.insert_settings("demo", SettingsKind::World, 1, serde_json::json!({"世界": "天玄大陆"}))
            .await;
        api
    }

    pub async fn insert_template(&self, template: Template) {
        let mut state = self.state.lock().await;
        state.templates.insert(template.id.clone(), template);
    }

    pub async fn insert_template_file(&self, filename: &str, text: &str) {
        let mut state = self.state.lock().await;
        state
            .template_files
            .insert(filename.to_string(), text.to_string());
    }

    /// 让某个模版文件的读取失败
    pub async fn remove_template_file(&self, filename: &str) {
        let mut state = self.state.lock().await;
        state.template_files.remove(filename);
        state.missing_files.insert(filename.to_string());
    }

    /// 注册小说，`latest_chapter` 之前的章节视为已生成
    pub async fn add_novel(&self, novel_id: &str, latest_chapter: u32) {
        let mut state = self.state.lock().await;
        let novel = state.novels.entry(novel_id.to_string()).or_default();
        for index in 1..=latest_chapter {
            novel
                .chapters
                .entry(index)
                .or_insert_with(|| format!("第{}章", index));
        }
    }

    pub async fn set_outline(&self, novel_id: &str, chapter_index: u32, outline: &str) {
        let mut state = self.state.lock().await;
        state
            .outlines
            .insert((novel_id.to_string(), chapter_index), outline.to_string());
    }

    /// 细纲接口返回 404
    pub async fn disable_outline_endpoint(&self) {
        self.state.lock().await.outline_endpoint_missing = true;
    }

    /// 细纲接口连接失败
    pub async fn break_outline_connection(&self) {
        self.state.lock().await.outline_unreachable = true;
    }

    /// 只改上报的最新章节号，不生成章节内容
    pub async fn report_latest_chapter(&self, novel_id: &str, chapter_index: u32) {
        let mut state = self.state.lock().await;
        state
            .novels
            .entry(novel_id.to_string())
            .or_default()
            .reported_latest = Some(chapter_index);
    }

    pub async fn fail_generation(&self, chapter_index: u32, error: &str) {
        let mut state = self.state.lock().await;
        state
            .generation_failures
            .insert(chapter_index, error.to_string());
    }

    pub async fn break_auto_save(&self) {
        self.state.lock().await.auto_save_broken = true;
    }

    pub async fn set_healthy(&self, healthy: bool) {
        self.state.lock().await.unhealthy = !healthy;
    }

    pub async fn insert_settings(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        version: u32,
        content: serde_json::Value,
    ) {
        let mut state = self.state.lock().await;
        state
            .settings
            .entry((novel_id.to_string(), kind))
            .or_default()
            .insert(version, content);
    }

    /// 按调用顺序记录的生成章节
    pub async fn generated_chapters(&self) -> Vec<u32> {
        self.state.lock().await.generated_chapters.clone()
    }

    /// 生成请求里带的细纲
    pub async fn sent_outlines(&self) -> Vec<String> {
        self.state.lock().await.sent_outlines.clone()
    }

    /// 按调用顺序记录的保存章节
    pub async fn saved_chapters(&self) -> Vec<u32> {
        self.state.lock().await.saved_chapters.clone()
    }

    pub async fn state_updates(&self) -> Vec<UpdateStateRequest> {
        self.state.lock().await.state_updates.clone()
    }

    pub async fn settings_content(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        version: u32,
    ) -> Option<serde_json::Value> {
        let state = self.state.lock().await;
        state
            .settings
            .get(&(novel_id.to_string(), kind))
            .and_then(|versions| versions.get(&version).cloned())
    }

    /// 生成 `chapter_index` 时暂停，直到 `release_chapter` 被调用
    pub fn pause_on_chapter(&self, chapter_index: u32) {
        self.gate
            .chapter
            .store(chapter_index, std::sync::atomic::Ordering::SeqCst);
    }

    /// 等待暂停章节开始生成
    pub async fn wait_until_paused(&self) {
        self.gate.reached.notified().await;
    }

    pub fn release_chapter(&self) {
        self.gate.release.notify_one();
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            message: Some(format!("{} not found", what)),
        }
    }
}

#[async_trait]
impl NovelApiPort for FakeNovelApi {
    async fn health_check(&self) -> bool {
        !self.state.lock().await.unhealthy
    }

    async fn list_templates(&self) -> Result<TemplatesResponse, ApiError> {
        let state = self.state.lock().await;
        Ok(TemplatesResponse {
            templates: state.templates.clone(),
        })
    }

    async fn save_template(&self, template: &Template) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        let files = &template.files;
        let contents = &template.contents;
        for (filename, text) in [
            (&files.writer_role, &contents.writer_role),
            (&files.writing_rules, &contents.writing_rules),
            (&files.update_state_rules, &contents.update_state_rules),
        ] {
            state.template_files.insert(filename.clone(), text.clone());
            state.missing_files.remove(filename);
        }

        let mut stored = template.clone();
        stored.contents = Default::default();
        stored.created_date = Some(Local::now().format("%Y-%m-%d").to_string());
        state.templates.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn template_file(&self, filename: &str) -> Result<String, ApiError> {
        let state = self.state.lock().await;
        if state.missing_files.contains(filename) {
            return Err(Self::not_found(filename));
        }
        Ok(state
            .template_files
            .get(filename)
            .cloned()
            .unwrap_or_default())
    }

    async fn novel_info(&self, novel_id: &str) -> Result<NovelInfo, ApiError> {
        let state = self.state.lock().await;
        let novel = state
            .novels
            .get(novel_id)
            .ok_or_else(|| Self::not_found(novel_id))?;

        Ok(NovelInfo {
            chapters: ChapterStats {
                latest_chapter_file: novel.latest(),
                total_chapters: novel.chapters.len() as u32,
            },
            summary: SummaryStats {
                sync_status: serde_json::Value::String("已同步".to_string()),
            },
            memory: MemoryStats {
                total_chunks: novel.memory_chunks,
            },
        })
    }

    async fn read_outline(
        &self,
        request: &ReadOutlineRequest,
    ) -> Result<ReadOutlineResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.pending_chapter = Some(request.chapter_index);
        if state.outline_unreachable {
            return Err(ApiError::NetworkError("connection refused".to_string()));
        }
        if state.outline_endpoint_missing {
            return Err(Self::not_found("read-outline"));
        }

        let outline = state
            .outlines
            .get(&(request.novel_id.clone(), request.chapter_index))
            .cloned()
            .unwrap_or_else(|| format!("第{}章细纲", request.chapter_index));
        Ok(ReadOutlineResponse {
            outline: Some(outline),
        })
    }

    async fn generate_chapter(
        &self,
        request: &GenerateChapterRequest,
    ) -> Result<GenerateChapterResponse, ApiError> {
        let chapter = {
            let mut state = self.state.lock().await;
            let chapter = state.pending_chapter.take().unwrap_or(0);
            state.generated_chapters.push(chapter);
            state.sent_outlines.push(request.chapter_outline.clone());
            chapter
        };

        if chapter != 0
            && self.gate.chapter.load(std::sync::atomic::Ordering::SeqCst) == chapter
        {
            self.gate.reached.notify_one();
            self.gate.release.notified().await;
        }

        let state = self.state.lock().await;
        if let Some(error) = state.generation_failures.get(&chapter) {
            return Err(ApiError::Status {
                status: 500,
                message: Some(error.clone()),
            });
        }

        let content = format!("第{}章\n\n{}", chapter, request.chapter_outline);
        Ok(GenerateChapterResponse {
            word_count: content.chars().count() as u64,
            content,
        })
    }

    async fn save_chapter(
        &self,
        request: &SaveChapterRequest,
    ) -> Result<SaveChapterResponse, ApiError> {
        let mut state = self.state.lock().await;
        if state.auto_save_broken {
            return Err(ApiError::Status {
                status: 500,
                message: None,
            });
        }

        state.saved_chapters.push(request.chapter_index);
        state
            .novels
            .entry(request.novel_id.clone())
            .or_default()
            .chapters
            .insert(request.chapter_index, request.content.clone());

        Ok(SaveChapterResponse {
            filename: format!("{}_chapter_{:03}.txt", request.novel_id, request.chapter_index),
        })
    }

    async fn update_state(
        &self,
        request: &UpdateStateRequest,
    ) -> Result<UpdateStateResponse, ApiError> {
        let mut state = self.state.lock().await;
        let novel = state
            .novels
            .get_mut(&request.novel_id)
            .ok_or_else(|| Self::not_found(&request.novel_id))?;
        novel.memory_chunks += 1;
        state.state_updates.push(request.clone());

        Ok(UpdateStateResponse {
            summary: Some(format!("第{}章状态已更新", request.chapter_index)),
        })
    }

    async fn list_settings(&self, novel_id: &str) -> Result<SettingsListing, ApiError> {
        let state = self.state.lock().await;
        let listing = |kind: SettingsKind| -> Vec<SettingsVersion> {
            state
                .settings
                .get(&(novel_id.to_string(), kind))
                .map(|versions| {
                    versions
                        .keys()
                        .map(|&version| SettingsVersion {
                            version,
                            filename: format!("{}_v{}.json", kind, kind.format_version(version)),
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        Ok(SettingsListing {
            character_versions: listing(SettingsKind::Character),
            world_versions: listing(SettingsKind::World),
        })
    }

    async fn get_settings(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        version: &str,
    ) -> Result<SettingsDocument, ApiError> {
        let state = self.state.lock().await;
        let content = parse_version(version)
            .and_then(|v| {
                state
                    .settings
                    .get(&(novel_id.to_string(), kind))
                    .and_then(|versions| versions.get(&v).cloned())
            })
            .ok_or_else(|| Self::not_found(version))?;
        Ok(SettingsDocument { content })
    }

    async fn create_settings_version(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        request: &NewSettingsVersionRequest,
    ) -> Result<NewSettingsVersionResponse, ApiError> {
        let mut state = self.state.lock().await;
        let versions = state
            .settings
            .entry((novel_id.to_string(), kind))
            .or_default();
        let next = versions.keys().next_back().copied().unwrap_or(0) + 1;
        versions.insert(next, request.content.clone());

        Ok(NewSettingsVersionResponse {
            new_version: serde_json::Value::String(kind.format_version(next)),
        })
    }

    async fn save_settings(
        &self,
        novel_id: &str,
        kind: SettingsKind,
        version: &str,
        request: &SaveSettingsRequest,
    ) -> Result<(), ApiError> {
        let Some(number) = parse_version(version) else {
            return Err(Self::not_found(version));
        };

        let mut state = self.state.lock().await;
        let slot = state
            .settings
            .get_mut(&(novel_id.to_string(), kind))
            .and_then(|versions| versions.get_mut(&number))
            .ok_or_else(|| Self::not_found(version))?;
        *slot = request.content.clone();
        Ok(())
    }
}

fn parse_version(version: &str) -> Option<u32> {
    parse_leading_int(version).and_then(|v| u32::try_from(v).ok())
}
