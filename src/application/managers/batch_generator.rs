//! Batch Generator - 批量章节生成
//!
//! 顺序生成若干连续章节，逐章写日志、更新进度。
//! 停止是协作式的：只在两章之间检查取消令牌，不打断进行中的请求。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::commands::{
    BatchPlan, GenerationOptions, ManualUpdateState, StartBatchGeneration,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    GenerateChapterRequest, NovelApiPort, NovelInfo, Panel, PanelEvent, PanelEventSink,
    ReadOutlineRequest, SaveChapterRequest, UpdateStateRequest,
};
use crate::domain::batch::{
    placeholder_outline, BatchLog, BatchPhase, BatchSession, ControlState, LogEntry, Progress,
    Severity,
};
use crate::domain::template::{TemplateOption, TemplateStore};

/// 完成状态的默认展示时长
pub const DEFAULT_STATUS_CLEAR: Duration = Duration::from_secs(3);

/// 批量生成器配置
#[derive(Debug, Clone)]
pub struct BatchGeneratorConfig {
    /// 成功/失败状态自动清空的延迟
    pub status_clear_after: Duration,
}

impl Default for BatchGeneratorConfig {
    fn default() -> Self {
        Self {
            status_clear_after: DEFAULT_STATUS_CLEAR,
        }
    }
}

/// 小说当前进度
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub novel_id: String,
    pub max_chapter: u32,
    pub next_chapter: u32,
    pub chapter_files: u32,
    pub sync_status: String,
    pub memory_chunks: u32,
}

impl ProgressReport {
    fn from_info(novel_id: &str, info: &NovelInfo) -> Self {
        let max_chapter = info.max_chapter();
        Self {
            novel_id: novel_id.to_string(),
            max_chapter,
            next_chapter: max_chapter.saturating_add(1),
            chapter_files: info.chapters.total_chapters,
            sync_status: info.summary.sync_status_text(),
            memory_chunks: info.memory.total_chunks,
        }
    }
}

impl std::fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "📊 当前进度: 已生成 {} 章", self.max_chapter)?;
        writeln!(f, "➡️ 下一章: 第 {} 章", self.next_chapter)?;
        writeln!(f, "📁 章节文件: {} 个", self.chapter_files)?;
        writeln!(f, "💾 状态同步: {}", self.sync_status)?;
        write!(f, "🧠 记忆分片: {} 个", self.memory_chunks)
    }
}

/// 单章生成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedChapter {
    pub chapter_index: u32,
    pub word_count: u64,
    /// 自动保存失败时为 None
    pub saved_as: Option<String>,
}

/// 批量循环的结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchTermination {
    Completed,
    /// 用户停止，`next_chapter` 未开始
    Stopped { next_chapter: u32 },
    /// 第 `chapter` 章失败，循环中止
    Failed { chapter: u32, reason: String },
}

/// 一轮批量生成的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub start_chapter: u32,
    pub requested: u32,
    pub chapters: Vec<GeneratedChapter>,
    pub termination: BatchTermination,
}

impl BatchReport {
    pub fn completed(&self) -> u32 {
        self.chapters.len() as u32
    }
}

/// 会话快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: BatchPhase,
    pub current_chapter: u32,
    pub total_chapters: u32,
    pub controls: ControlState,
}

/// 本轮首章序号；末章序号超出 u32 时为 None
fn chapter_range_start(max_chapter: u32, chapter_count: u32) -> Option<u32> {
    let start = max_chapter.checked_add(1)?;
    start.checked_add(chapter_count.saturating_sub(1))?;
    Some(start)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 无论循环如何结束都把会话恢复为 Idle
struct FinishOnDrop<'a>(&'a Mutex<BatchSession>);

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        lock(self.0).finish();
    }
}

/// 批量生成器
pub struct BatchGenerator {
    api: Arc<dyn NovelApiPort>,
    events: Arc<dyn PanelEventSink>,
    config: BatchGeneratorConfig,
    session: Mutex<BatchSession>,
    log: Mutex<BatchLog>,
    progress: Mutex<Progress>,
}

impl BatchGenerator {
    pub fn new(
        api: Arc<dyn NovelApiPort>,
        events: Arc<dyn PanelEventSink>,
        config: BatchGeneratorConfig,
    ) -> Self {
        Self {
            api,
            events,
            config,
            session: Mutex::new(BatchSession::new()),
            log: Mutex::new(BatchLog::new()),
            progress: Mutex::new(Progress::default()),
        }
    }

    // ========================================================================
    // 状态与日志
    // ========================================================================

    pub fn session(&self) -> SessionSnapshot {
        let session = lock(&self.session);
        SessionSnapshot {
            phase: session.phase(),
            current_chapter: session.current_chapter(),
            total_chapters: session.total_chapters(),
            controls: session.controls(),
        }
    }

    pub fn controls(&self) -> ControlState {
        lock(&self.session).controls()
    }

    pub fn progress(&self) -> Progress {
        *lock(&self.progress)
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        lock(&self.log).entries().to_vec()
    }

    /// 追加一条日志，同时写入 tracing 并推送给展示层
    fn add_log(&self, severity: Severity, message: impl Into<String>) {
        let entry = lock(&self.log).append(severity, message);
        match severity {
            Severity::Error => tracing::error!(target: "novelgen::batch", "{}", entry.message),
            Severity::Warning => tracing::warn!(target: "novelgen::batch", "{}", entry.message),
            Severity::Info | Severity::Success => {
                tracing::info!(target: "novelgen::batch", "{}", entry.message)
            }
        }
        self.events.publish(PanelEvent::Log(entry));
    }

    fn set_status(&self, panel: Panel, severity: Severity, message: impl Into<String>) {
        self.events.publish(PanelEvent::status(panel, severity, message));
    }

    fn clear_status(&self, panel: Panel) {
        self.events.publish(PanelEvent::StatusCleared { panel });
    }

    /// 延迟清空状态栏
    fn schedule_status_clear(&self, panel: Panel) {
        let events = self.events.clone();
        let delay = self.config.status_clear_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            events.publish(PanelEvent::StatusCleared { panel });
        });
    }

    fn set_progress(&self, progress: Progress) {
        *lock(&self.progress) = progress;
        self.events.publish(PanelEvent::Progress(progress));
    }

    // ========================================================================
    // 模版与进度
    // ========================================================================

    /// 批量生成面板的模版下拉选项
    pub async fn load_templates_for_batch(&self) -> Result<Vec<TemplateOption>, ApplicationError> {
        match self.api.list_templates().await {
            Ok(response) => Ok(TemplateStore::new(response.templates).options()),
            Err(e) => {
                let err = ApplicationError::api("加载模版失败", e);
                self.add_log(Severity::Error, format!("模版加载失败: {}", err));
                Err(err)
            }
        }
    }

    /// 查询小说已生成的章节，只读
    pub async fn detect_progress(&self, novel_id: &str) -> Result<ProgressReport, ApplicationError> {
        let novel_id = novel_id.trim();
        if novel_id.is_empty() {
            return Err(ApplicationError::validation("请输入小说ID"));
        }

        self.set_status(Panel::BatchInfo, Severity::Info, "正在检测进度...");

        match self.api.novel_info(novel_id).await {
            Ok(info) => {
                let report = ProgressReport::from_info(novel_id, &info);
                self.set_status(Panel::BatchInfo, Severity::Success, report.to_string());
                self.add_log(
                    Severity::Info,
                    format!(
                        "检测到小说 {}，当前已生成 {} 章，下一章为第 {} 章",
                        novel_id, report.max_chapter, report.next_chapter
                    ),
                );
                Ok(report)
            }
            Err(e) => {
                let err = ApplicationError::api("获取小说信息失败", e);
                self.set_status(Panel::BatchInfo, Severity::Error, format!("检测失败: {}", err));
                self.add_log(Severity::Error, format!("进度检测失败: {}", err));
                Err(err)
            }
        }
    }

    // ========================================================================
    // 批量循环
    // ========================================================================

    /// 开始批量生成
    ///
    /// 返回时会话总是已恢复为 Idle。单章失败和用户停止都不算错误，
    /// 体现在 `BatchReport::termination` 里；只有拒绝、校验失败和初始化失败返回 Err。
    pub async fn start_batch_generation(
        &self,
        command: StartBatchGeneration,
    ) -> Result<BatchReport, ApplicationError> {
        let plan = self.claim(&command)?;
        let _finish = FinishOnDrop(&self.session);

        self.set_status(Panel::Batch, Severity::Info, "正在初始化...");

        let info = match self.api.novel_info(&plan.novel_id).await {
            Ok(info) => info,
            Err(e) => {
                let err = ApplicationError::api("获取小说信息失败", e);
                self.add_log(Severity::Error, format!("批量生成启动失败: {}", err));
                self.clear_status(Panel::Batch);
                return Err(err);
            }
        };

        let Some(start_chapter) = chapter_range_start(info.max_chapter(), plan.chapter_count) else {
            let err = ApplicationError::failed(format!(
                "章节序号超出范围: 已有 {} 章，无法再生成 {} 章",
                info.max_chapter(),
                plan.chapter_count
            ));
            self.add_log(Severity::Error, format!("批量生成启动失败: {}", err));
            self.clear_status(Panel::Batch);
            return Err(err);
        };
        let run_id = Uuid::new_v4();
        let token = lock(&self.session).begin(plan.chapter_count);

        tracing::info!(
            %run_id,
            novel_id = %plan.novel_id,
            template_id = %plan.template_id,
            start_chapter,
            chapter_count = plan.chapter_count,
            "Batch generation started"
        );

        self.set_progress(Progress::new(0, plan.chapter_count));
        self.set_status(Panel::Batch, Severity::Info, "正在生成中，请耐心等待约3分钟...");
        self.add_log(
            Severity::Info,
            format!(
                "开始批量生成 {} 章，从第 {} 章开始",
                plan.chapter_count, start_chapter
            ),
        );

        let (chapters, termination) = self
            .run_chapters(&plan, start_chapter, &command.options, &token)
            .await;

        if termination == BatchTermination::Completed {
            self.add_log(Severity::Success, "批量生成完成！");
            self.set_status(Panel::Batch, Severity::Success, "🎉 所有章节生成完成！");
            self.schedule_status_clear(Panel::Batch);
        }

        tracing::info!(
            %run_id,
            completed = chapters.len(),
            termination = ?termination,
            "Batch generation finished"
        );

        Ok(BatchReport {
            run_id,
            start_chapter,
            requested: plan.chapter_count,
            chapters,
            termination,
        })
    }

    /// 检查、校验、占用开始控件，在同一个临界区内完成
    fn claim(&self, command: &StartBatchGeneration) -> Result<BatchPlan, ApplicationError> {
        let mut session = lock(&self.session);
        if let Err(rejection) = session.check_can_start() {
            drop(session);
            self.add_log(Severity::Warning, rejection.to_string());
            return Err(rejection.into());
        }

        let plan = command.validate()?;
        session.claim()?;
        Ok(plan)
    }

    async fn run_chapters(
        &self,
        plan: &BatchPlan,
        start_chapter: u32,
        options: &GenerationOptions,
        token: &CancellationToken,
    ) -> (Vec<GeneratedChapter>, BatchTermination) {
        let total = plan.chapter_count;
        let mut chapters = Vec::new();

        for offset in 0..total {
            let chapter_index = start_chapter + offset;

            if token.is_cancelled() {
                self.add_log(Severity::Warning, "用户手动停止生成");
                self.set_status(Panel::Batch, Severity::Warning, "生成已停止");
                return (
                    chapters,
                    BatchTermination::Stopped {
                        next_chapter: chapter_index,
                    },
                );
            }

            let current = offset + 1;
            lock(&self.session).set_current_chapter(current);

            match self
                .generate_single_chapter(&plan.novel_id, &plan.template_id, chapter_index, options)
                .await
            {
                Ok(chapter) => {
                    chapters.push(chapter);
                    self.set_progress(Progress::new(current, total));
                    let tail = if current < total {
                        "继续生成中..."
                    } else {
                        "即将完成..."
                    };
                    self.set_status(
                        Panel::Batch,
                        Severity::Info,
                        format!("已完成 {}/{} 章，{}", current, total, tail),
                    );
                }
                Err(e) => {
                    let reason = e.to_string();
                    self.add_log(
                        Severity::Error,
                        format!("第 {} 章生成失败: {}", chapter_index, reason),
                    );
                    self.set_status(
                        Panel::Batch,
                        Severity::Error,
                        format!("第 {} 章生成失败，生成已停止", chapter_index),
                    );
                    return (
                        chapters,
                        BatchTermination::Failed {
                            chapter: chapter_index,
                            reason,
                        },
                    );
                }
            }
        }

        (chapters, BatchTermination::Completed)
    }

    /// 生成单章：细纲 -> 生成 -> 自动保存
    pub async fn generate_single_chapter(
        &self,
        novel_id: &str,
        template_id: &str,
        chapter_index: u32,
        options: &GenerationOptions,
    ) -> Result<GeneratedChapter, ApplicationError> {
        self.add_log(Severity::Info, format!("正在生成第 {} 章...", chapter_index));
        self.set_status(
            Panel::Batch,
            Severity::Info,
            format!("正在生成第 {} 章，请耐心等待...", chapter_index),
        );

        let outline = self
            .load_chapter_outline(novel_id, chapter_index)
            .await
            .filter(|outline| !outline.trim().is_empty())
            .ok_or_else(|| {
                ApplicationError::failed(format!("找不到第 {} 章的细纲文件", chapter_index))
            })?;

        let request = GenerateChapterRequest {
            template_id: template_id.to_string(),
            chapter_outline: outline,
            model_name: options.model_name.clone(),
            update_model_name: options.update_model().map(str::to_string),
            use_state: options.use_state,
            use_world_bible: options.use_world_bible,
            update_state: options.update_state,
            session_id: novel_id.to_string(),
            novel_id: novel_id.to_string(),
            use_previous_chapters: options.use_previous_chapters,
            previous_chapters_count: options.previous_chapters_count(),
        };

        let response = self
            .api
            .generate_chapter(&request)
            .await
            .map_err(|e| ApplicationError::failed(e.reason_or("生成失败")))?;

        let saved_as = self
            .auto_save_chapter(&response.content, novel_id, chapter_index)
            .await;

        self.add_log(
            Severity::Success,
            format!(
                "第 {} 章生成成功 ({} 字)，已自动保存",
                chapter_index, response.word_count
            ),
        );

        Ok(GeneratedChapter {
            chapter_index,
            word_count: response.word_count,
            saved_as,
        })
    }

    /// 读取细纲
    ///
    /// 非 2xx 响应和网络错误都回落到占位细纲；成功响应里没有细纲时返回 None。
    async fn load_chapter_outline(&self, novel_id: &str, chapter_index: u32) -> Option<String> {
        let request = ReadOutlineRequest {
            novel_id: novel_id.to_string(),
            chapter_index,
        };

        match self.api.read_outline(&request).await {
            Ok(response) => response.outline,
            Err(e) if e.is_status() => {
                tracing::debug!(chapter_index, error = %e, "Outline unavailable, using placeholder");
                Some(placeholder_outline(chapter_index))
            }
            Err(e) => {
                self.add_log(
                    Severity::Warning,
                    format!("读取第 {} 章细纲失败，使用默认细纲: {}", chapter_index, e),
                );
                Some(placeholder_outline(chapter_index))
            }
        }
    }

    /// 自动保存失败只记警告
    async fn auto_save_chapter(
        &self,
        content: &str,
        novel_id: &str,
        chapter_index: u32,
    ) -> Option<String> {
        let request = SaveChapterRequest {
            content: content.to_string(),
            novel_id: novel_id.to_string(),
            chapter_index,
            auto_save: true,
        };

        match self.api.save_chapter(&request).await {
            Ok(response) => {
                self.add_log(
                    Severity::Info,
                    format!("章节已保存为: {}", response.filename),
                );
                Some(response.filename)
            }
            Err(e) => {
                self.add_log(
                    Severity::Warning,
                    format!("自动保存失败: {}", e.reason_or("自动保存失败")),
                );
                None
            }
        }
    }

    /// 请求停止；非运行状态下什么也不做
    pub fn stop_batch_generation(&self) -> bool {
        let stopped = lock(&self.session).request_stop();
        if stopped {
            self.add_log(Severity::Warning, "正在停止批量生成...");
            self.clear_status(Panel::Batch);
        }
        stopped
    }

    // ========================================================================
    // 手动更新状态
    // ========================================================================

    /// 基于最新一章强制更新角色状态，返回后端摘要
    pub async fn manual_update_state(
        &self,
        command: ManualUpdateState,
    ) -> Result<String, ApplicationError> {
        let novel_id = command.novel_id.trim();
        if novel_id.is_empty() {
            return Err(ApplicationError::validation("请输入小说ID"));
        }

        self.set_status(Panel::Batch, Severity::Info, "正在手动更新角色设定...");
        self.add_log(Severity::Info, "开始手动更新角色设定...");

        match self.run_manual_update(novel_id, &command).await {
            Ok((latest, summary)) => {
                self.add_log(
                    Severity::Success,
                    format!("✅ 角色设定更新成功！基于第{}章内容", latest),
                );
                self.add_log(Severity::Info, format!("📊 更新内容：{}", summary));
                self.clear_status(Panel::Batch);
                Ok(summary)
            }
            Err(e) => {
                self.add_log(Severity::Error, format!("❌ 手动更新失败: {}", e));
                self.set_status(Panel::Batch, Severity::Error, format!("更新失败: {}", e));
                self.schedule_status_clear(Panel::Batch);
                Err(e)
            }
        }
    }

    async fn run_manual_update(
        &self,
        novel_id: &str,
        command: &ManualUpdateState,
    ) -> Result<(u32, String), ApplicationError> {
        let info = self
            .api
            .novel_info(novel_id)
            .await
            .map_err(|e| ApplicationError::api("获取小说信息失败", e))?;

        let latest = info.max_chapter();
        if latest == 0 {
            return Err(ApplicationError::failed(
                "没有找到可用的章节内容进行状态更新",
            ));
        }

        let request = UpdateStateRequest {
            novel_id: novel_id.to_string(),
            chapter_index: latest,
            model_name: command.effective_model().to_string(),
            force_update: true,
        };

        let response = self
            .api
            .update_state(&request)
            .await
            .map_err(|e| ApplicationError::failed(e.reason_or("状态更新失败")))?;

        let summary = response
            .summary
            .filter(|summary| !summary.is_empty())
            .unwrap_or_else(|| "状态已同步".to_string());
        Ok((latest, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::{Template, TemplateFiles};
    use crate::infrastructure::adapters::FakeNovelApi;
    use crate::infrastructure::events::EventPublisher;

    fn setup(api: &Arc<FakeNovelApi>) -> (Arc<EventPublisher>, Arc<BatchGenerator>) {
        let events = Arc::new(EventPublisher::new());
        let generator = Arc::new(BatchGenerator::new(
            api.clone(),
            events.clone(),
            BatchGeneratorConfig {
                status_clear_after: Duration::from_millis(10),
            },
        ));
        (events, generator)
    }

    fn start(novel: &str, count: u32) -> StartBatchGeneration {
        StartBatchGeneration {
            novel_id: novel.to_string(),
            template_id: "t1".to_string(),
            chapter_count: Some(count),
            options: GenerationOptions::new("deepseek-chat"),
        }
    }

    fn has_log(generator: &BatchGenerator, severity: Severity, needle: &str) -> bool {
        generator
            .log_entries()
            .iter()
            .any(|entry| entry.severity == severity && entry.message.contains(needle))
    }

    #[tokio::test]
    async fn test_generates_consecutive_chapters() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 5).await;
        let (_, generator) = setup(&api);

        let report = generator.start_batch_generation(start("n1", 2)).await.unwrap();

        assert_eq!(report.start_chapter, 6);
        assert_eq!(report.termination, BatchTermination::Completed);
        assert_eq!(report.completed(), 2);
        assert_eq!(report.chapters[0].saved_as.as_deref(), Some("n1_chapter_006.txt"));
        assert_eq!(api.generated_chapters().await, vec![6, 7]);
        assert_eq!(api.saved_chapters().await, vec![6, 7]);
        assert_eq!(generator.progress().to_string(), "进度: 2/2 (100.0%)");
        assert!(has_log(&generator, Severity::Success, "批量生成完成！"));

        let session = generator.session();
        assert_eq!(session.phase, BatchPhase::Idle);
        assert_eq!(session.controls, ControlState::default());
    }

    #[tokio::test]
    async fn test_attempts_exactly_n_chapters() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("fresh", 0).await;
        let (_, generator) = setup(&api);

        let report = generator
            .start_batch_generation(start("fresh", 4))
            .await
            .unwrap();

        assert_eq!(report.start_chapter, 1);
        assert_eq!(api.generated_chapters().await, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_stop_lets_current_chapter_finish() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 5).await;
        api.pause_on_chapter(7);
        let (_, generator) = setup(&api);

        let running = generator.clone();
        let handle = tokio::spawn(async move { running.start_batch_generation(start("n1", 4)).await });

        api.wait_until_paused().await;
        assert_eq!(generator.session().phase, BatchPhase::Running);
        assert!(generator.stop_batch_generation());
        assert_eq!(generator.session().phase, BatchPhase::Stopping);
        api.release_chapter();

        let report = handle.await.unwrap().unwrap();
        assert_eq!(
            report.termination,
            BatchTermination::Stopped { next_chapter: 8 }
        );
        assert_eq!(api.generated_chapters().await, vec![6, 7]);
        assert_eq!(api.saved_chapters().await, vec![6, 7]);
        assert_eq!(generator.progress(), Progress::new(2, 4));
        assert!(has_log(&generator, Severity::Warning, "用户手动停止生成"));
        assert!(!has_log(&generator, Severity::Success, "批量生成完成！"));
        assert_eq!(generator.session().phase, BatchPhase::Idle);
    }

    #[tokio::test]
    async fn test_rejects_second_start_while_running() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 0).await;
        api.pause_on_chapter(1);
        let (_, generator) = setup(&api);

        let running = generator.clone();
        let handle = tokio::spawn(async move { running.start_batch_generation(start("n1", 1)).await });
        api.wait_until_paused().await;

        let err = generator
            .start_batch_generation(start("n1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(_)));
        assert!(has_log(&generator, Severity::Warning, "生成已在进行中"));

        api.release_chapter();
        handle.await.unwrap().unwrap();
        assert_eq!(api.generated_chapters().await, vec![1]);
    }

    #[tokio::test]
    async fn test_failure_halts_loop() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 5).await;
        api.fail_generation(7, "模型超时").await;
        let (_, generator) = setup(&api);

        let report = generator.start_batch_generation(start("n1", 3)).await.unwrap();

        assert_eq!(
            report.termination,
            BatchTermination::Failed {
                chapter: 7,
                reason: "模型超时".to_string()
            }
        );
        assert_eq!(api.generated_chapters().await, vec![6, 7]);
        assert_eq!(api.saved_chapters().await, vec![6]);
        assert_eq!(generator.progress(), Progress::new(1, 3));
        assert!(has_log(&generator, Severity::Error, "第 7 章生成失败: 模型超时"));
        assert_eq!(generator.controls(), ControlState::default());
    }

    #[tokio::test]
    async fn test_validation_makes_no_requests() {
        let api = Arc::new(FakeNovelApi::new());
        let (_, generator) = setup(&api);

        let err = generator
            .start_batch_generation(start("  ", 2))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "请输入小说ID");

        let err = generator
            .start_batch_generation(StartBatchGeneration {
                chapter_count: None,
                ..start("n1", 1)
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "请输入有效的章节数量");

        assert!(api.generated_chapters().await.is_empty());
        assert_eq!(generator.controls(), ControlState::default());
    }

    #[tokio::test]
    async fn test_init_failure_restores_idle() {
        let api = Arc::new(FakeNovelApi::new());
        let (_, generator) = setup(&api);

        let err = generator
            .start_batch_generation(start("missing", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ApiFailure { .. }));
        assert!(has_log(&generator, Severity::Error, "批量生成启动失败"));
        assert_eq!(generator.session().phase, BatchPhase::Idle);
        assert!(generator.controls().start_enabled);
    }

    #[tokio::test]
    async fn test_placeholder_outline_when_endpoint_missing() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 0).await;
        api.disable_outline_endpoint().await;
        let (_, generator) = setup(&api);

        let chapter = generator
            .generate_single_chapter("n1", "t1", 1, &GenerationOptions::new("m"))
            .await
            .unwrap();
        assert_eq!(chapter.chapter_index, 1);
        assert_eq!(api.generated_chapters().await, vec![1]);
        assert_eq!(api.sent_outlines().await, vec![placeholder_outline(1)]);
        assert!(!has_log(&generator, Severity::Warning, "细纲"));
    }

    #[tokio::test]
    async fn test_placeholder_outline_on_network_error() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 0).await;
        api.break_outline_connection().await;
        let (_, generator) = setup(&api);

        let chapter = generator
            .generate_single_chapter("n1", "t1", 3, &GenerationOptions::new("m"))
            .await
            .unwrap();
        assert_eq!(chapter.chapter_index, 3);
        assert_eq!(api.sent_outlines().await, vec![placeholder_outline(3)]);
        assert!(has_log(
            &generator,
            Severity::Warning,
            "读取第 3 章细纲失败，使用默认细纲"
        ));
    }

    #[tokio::test]
    async fn test_success_status_clears_after_delay() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 0).await;
        let (events, generator) = setup(&api);
        let mut rx = events.subscribe();

        generator.start_batch_generation(start("n1", 1)).await.unwrap();

        let mut saw_success = false;
        let cleared = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                match rx.recv().await.unwrap() {
                    PanelEvent::Status {
                        panel: Panel::Batch,
                        severity: Severity::Success,
                        message,
                    } => {
                        assert_eq!(message, "🎉 所有章节生成完成！");
                        saw_success = true;
                    }
                    PanelEvent::StatusCleared {
                        panel: Panel::Batch,
                    } => break,
                    _ => {}
                }
            }
        })
        .await;
        assert!(cleared.is_ok());
        assert!(saw_success);
    }

    #[tokio::test]
    async fn test_huge_chapter_count_does_not_preallocate() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 0).await;
        api.fail_generation(1, "模型超时").await;
        let (_, generator) = setup(&api);

        let report = generator
            .start_batch_generation(start("n1", u32::MAX))
            .await
            .unwrap();
        assert_eq!(report.requested, u32::MAX);
        assert!(report.chapters.is_empty());
        assert_eq!(
            report.termination,
            BatchTermination::Failed {
                chapter: 1,
                reason: "模型超时".to_string()
            }
        );
        assert_eq!(generator.session().phase, BatchPhase::Idle);
    }

    #[tokio::test]
    async fn test_chapter_index_overflow_is_rejected() {
        let api = Arc::new(FakeNovelApi::new());
        api.report_latest_chapter("full", u32::MAX).await;
        api.report_latest_chapter("almost", u32::MAX - 1).await;
        let (_, generator) = setup(&api);

        let report = generator.detect_progress("full").await.unwrap();
        assert_eq!(report.max_chapter, u32::MAX);
        assert_eq!(report.next_chapter, u32::MAX);

        let err = generator
            .start_batch_generation(start("full", 1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("章节序号超出范围"));

        let err = generator
            .start_batch_generation(start("almost", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::OperationFailed(_)));
        assert!(api.generated_chapters().await.is_empty());
        assert!(generator.controls().start_enabled);

        let report = generator
            .start_batch_generation(start("almost", 1))
            .await
            .unwrap();
        assert_eq!(report.start_chapter, u32::MAX);
        assert_eq!(report.termination, BatchTermination::Completed);
    }

    #[test]
    fn test_chapter_range_start() {
        assert_eq!(chapter_range_start(5, 3), Some(6));
        assert_eq!(chapter_range_start(u32::MAX - 1, 1), Some(u32::MAX));
        assert_eq!(chapter_range_start(u32::MAX - 1, 2), None);
        assert_eq!(chapter_range_start(u32::MAX, 1), None);
    }

    #[tokio::test]
    async fn test_empty_outline_is_an_error() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 0).await;
        api.set_outline("n1", 1, "   ").await;
        let (_, generator) = setup(&api);

        let err = generator
            .generate_single_chapter("n1", "t1", 1, &GenerationOptions::new("m"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "找不到第 1 章的细纲文件");
        assert!(api.generated_chapters().await.is_empty());
    }

    #[tokio::test]
    async fn test_auto_save_failure_is_not_fatal() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 0).await;
        api.break_auto_save().await;
        let (_, generator) = setup(&api);

        let report = generator.start_batch_generation(start("n1", 2)).await.unwrap();
        assert_eq!(report.termination, BatchTermination::Completed);
        assert!(report.chapters.iter().all(|c| c.saved_as.is_none()));
        assert!(api.saved_chapters().await.is_empty());
        assert!(has_log(&generator, Severity::Warning, "自动保存失败"));
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 0).await;
        let (events, generator) = setup(&api);
        let mut rx = events.subscribe();

        generator.start_batch_generation(start("n1", 1)).await.unwrap();

        let mut saw_progress = false;
        while let Ok(event) = rx.try_recv() {
            if event == PanelEvent::Progress(Progress::new(1, 1)) {
                saw_progress = true;
            }
        }
        assert!(saw_progress);
    }

    #[tokio::test]
    async fn test_stop_when_idle() {
        let api = Arc::new(FakeNovelApi::new());
        let (_, generator) = setup(&api);
        assert!(!generator.stop_batch_generation());
        assert!(generator.log_entries().is_empty());
    }

    #[tokio::test]
    async fn test_detect_progress() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("n1", 5).await;
        let (_, generator) = setup(&api);

        let report = generator.detect_progress("n1").await.unwrap();
        assert_eq!(report.max_chapter, 5);
        assert_eq!(report.next_chapter, 6);
        assert_eq!(report.chapter_files, 5);
        assert!(report.to_string().contains("➡️ 下一章: 第 6 章"));

        assert!(generator.detect_progress("").await.unwrap_err().is_validation());
        assert!(generator.detect_progress("nope").await.is_err());
        assert!(has_log(&generator, Severity::Error, "进度检测失败"));
    }

    #[tokio::test]
    async fn test_manual_update_state() {
        let api = Arc::new(FakeNovelApi::new());
        api.add_novel("empty", 0).await;
        api.add_novel("n1", 3).await;
        let (_, generator) = setup(&api);

        let err = generator
            .manual_update_state(ManualUpdateState {
                novel_id: "empty".to_string(),
                model_name: "m".to_string(),
                update_model_name: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "没有找到可用的章节内容进行状态更新");

        let summary = generator
            .manual_update_state(ManualUpdateState {
                novel_id: "n1".to_string(),
                model_name: "m".to_string(),
                update_model_name: Some("updater".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(summary, "第3章状态已更新");

        let updates = api.state_updates().await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].chapter_index, 3);
        assert_eq!(updates[0].model_name, "updater");
        assert!(updates[0].force_update);
    }

    #[tokio::test]
    async fn test_batch_template_options() {
        let api = Arc::new(FakeNovelApi::new());
        api.insert_template(Template {
            id: "002".to_string(),
            name: "都市".to_string(),
            files: TemplateFiles::for_id("002"),
            ..Default::default()
        })
        .await;
        let (_, generator) = setup(&api);

        let options = generator.load_templates_for_batch().await.unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "都市 (002)");
    }
}
