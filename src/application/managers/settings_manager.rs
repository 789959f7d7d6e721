//! Settings Manager - 人物/世界设定版本管理
//!
//! 两个文档族结构相同，所有操作都按 `SettingsKind` 参数化，
//! 另外提供按族命名的便捷方法。

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::commands::{CreateSettingsVersion, SaveSettingsVersion};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    NewSettingsVersionRequest, NovelApiPort, Panel, PanelEvent, PanelEventSink,
    SaveSettingsRequest,
};
use crate::domain::batch::Severity;
use crate::domain::settings::{latest_version, SettingsContext, SettingsKind, SettingsVersion};

/// 已加载到编辑器的设定版本
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    pub kind: SettingsKind,
    pub version: String,
    pub content: serde_json::Value,
    /// 两空格缩进的 JSON，编辑器直接展示
    pub pretty: String,
}

/// 加载小说设定后的概览
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsOverview {
    pub novel_id: String,
    pub character_versions: Vec<SettingsVersion>,
    pub world_versions: Vec<SettingsVersion>,
    /// 自动加载的最新人物设定
    pub character: Option<LoadedSettings>,
    /// 自动加载的最新世界设定
    pub world: Option<LoadedSettings>,
}

impl SettingsOverview {
    pub fn versions(&self, kind: SettingsKind) -> &[SettingsVersion] {
        match kind {
            SettingsKind::Character => &self.character_versions,
            SettingsKind::World => &self.world_versions,
        }
    }

    pub fn loaded(&self, kind: SettingsKind) -> Option<&LoadedSettings> {
        match kind {
            SettingsKind::Character => self.character.as_ref(),
            SettingsKind::World => self.world.as_ref(),
        }
    }
}

impl std::fmt::Display for SettingsOverview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "✅ 找到小说 {}", self.novel_id)?;
        writeln!(f, "👤 人物设定: {}个版本", self.character_versions.len())?;
        write!(f, "🌍 世界设定: {}个版本", self.world_versions.len())
    }
}

/// 设定管理器
pub struct SettingsManager {
    api: Arc<dyn NovelApiPort>,
    events: Arc<dyn PanelEventSink>,
    context: RwLock<SettingsContext>,
}

impl SettingsManager {
    pub fn new(api: Arc<dyn NovelApiPort>, events: Arc<dyn PanelEventSink>) -> Self {
        Self {
            api,
            events,
            context: RwLock::new(SettingsContext::new()),
        }
    }

    /// 当前上下文快照
    pub async fn context(&self) -> SettingsContext {
        self.context.read().await.clone()
    }

    fn set_status(&self, severity: Severity, message: impl Into<String>) {
        self.events
            .publish(PanelEvent::status(Panel::Settings, severity, message));
    }

    /// 加载小说的两族版本列表，并自动加载各自最新版本
    pub async fn load_settings(&self, novel_id: &str) -> Result<SettingsOverview, ApplicationError> {
        let novel_id = novel_id.trim();
        if novel_id.is_empty() {
            self.set_status(Severity::Warning, "请输入小说ID");
            return Err(ApplicationError::validation("请输入小说ID"));
        }

        self.set_status(Severity::Info, "正在加载设定...");
        {
            let mut context = self.context.write().await;
            *context = SettingsContext::new();
            context.set_novel(novel_id);
        }

        let listing = match self.api.list_settings(novel_id).await {
            Ok(listing) => listing,
            Err(e) => {
                let err = ApplicationError::api("加载设定失败", e);
                self.set_status(Severity::Error, format!("❌ {}", err));
                return Err(err);
            }
        };

        {
            let mut context = self.context.write().await;
            for kind in SettingsKind::ALL {
                context.set_versions(kind, listing.versions(kind).to_vec());
            }
        }

        let character = self
            .auto_load_latest(SettingsKind::Character, &listing.character_versions)
            .await;
        let world = self
            .auto_load_latest(SettingsKind::World, &listing.world_versions)
            .await;

        let overview = SettingsOverview {
            novel_id: novel_id.to_string(),
            character_versions: listing.character_versions,
            world_versions: listing.world_versions,
            character,
            world,
        };

        tracing::info!(
            novel_id = %novel_id,
            character_versions = overview.character_versions.len(),
            world_versions = overview.world_versions.len(),
            "Settings loaded"
        );
        self.set_status(Severity::Success, overview.to_string());
        Ok(overview)
    }

    /// 自动加载失败只提示，不影响列表
    async fn auto_load_latest(
        &self,
        kind: SettingsKind,
        versions: &[SettingsVersion],
    ) -> Option<LoadedSettings> {
        let latest = latest_version(versions)?.padded(kind);
        match self.load_version(kind, &latest).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(kind = %kind, version = %latest, error = %e, "Auto-load failed");
                self.events.publish(PanelEvent::notice(Severity::Error, e.to_string()));
                None
            }
        }
    }

    /// 加载指定版本；版本或当前小说为空时什么也不做
    pub async fn load_version(
        &self,
        kind: SettingsKind,
        version: &str,
    ) -> Result<Option<LoadedSettings>, ApplicationError> {
        let version = version.trim();
        let novel_id = self.context.read().await.novel_id().to_string();
        if version.is_empty() || novel_id.is_empty() {
            return Ok(None);
        }

        let document = self
            .api
            .get_settings(&novel_id, kind, version)
            .await
            .map_err(|e| ApplicationError::api(format!("加载{}失败", kind.label()), e))?;

        let pretty = serde_json::to_string_pretty(&document.content)?;
        self.context
            .write()
            .await
            .set_current_version(kind, version);

        Ok(Some(LoadedSettings {
            kind,
            version: version.to_string(),
            content: document.content,
            pretty,
        }))
    }

    /// 以编辑器内容为基础创建新版本，并切换到新版本
    pub async fn create_new_version(
        &self,
        command: CreateSettingsVersion,
    ) -> Result<LoadedSettings, ApplicationError> {
        let kind = command.kind;
        let (novel_id, base_version) = {
            let context = self.context.read().await;
            (
                context.novel_id().to_string(),
                context.current_version(kind).to_string(),
            )
        };
        if novel_id.is_empty() {
            return Err(ApplicationError::validation("请先加载小说设定"));
        }

        let editor_content = command.editor_content.trim();
        if editor_content.is_empty() {
            return Err(ApplicationError::validation(format!(
                "当前没有{}内容可复制",
                kind.label()
            )));
        }
        let content: serde_json::Value = serde_json::from_str(editor_content)?;

        let response = self
            .api
            .create_settings_version(
                &novel_id,
                kind,
                &NewSettingsVersionRequest {
                    content,
                    base_version: base_version.clone(),
                },
            )
            .await
            .map_err(|e| ApplicationError::api("创建新版本失败", e))?;

        let new_version = response
            .version_id(kind)
            .ok_or_else(|| ApplicationError::failed("后端未返回新版本号"))?;

        tracing::info!(
            novel_id = %novel_id,
            kind = %kind,
            base_version = %base_version,
            new_version = %new_version,
            "Settings version created"
        );

        self.load_settings(&novel_id).await?;
        let loaded = self
            .load_version(kind, &new_version)
            .await?
            .ok_or_else(|| ApplicationError::failed(format!("无法加载新版本 {}", new_version)))?;

        self.events.publish(PanelEvent::notice(
            Severity::Success,
            format!("✅ 已创建{}新版本 {}", kind.label(), new_version),
        ));
        Ok(loaded)
    }

    /// 保存编辑器内容到当前版本
    pub async fn save_version(&self, command: SaveSettingsVersion) -> Result<(), ApplicationError> {
        let kind = command.kind;
        let (novel_id, version) = {
            let context = self.context.read().await;
            (
                context.novel_id().to_string(),
                context.current_version(kind).to_string(),
            )
        };
        if novel_id.is_empty() || version.is_empty() {
            return Err(ApplicationError::validation("请先选择要保存的版本"));
        }

        let editor_content = command.editor_content.trim();
        if editor_content.is_empty() {
            return Err(ApplicationError::validation(format!(
                "{}内容不能为空",
                kind.label()
            )));
        }
        let content: serde_json::Value = serde_json::from_str(editor_content)
            .map_err(|_| ApplicationError::validation("JSON格式错误，请检查语法"))?;

        self.api
            .save_settings(&novel_id, kind, &version, &SaveSettingsRequest { content })
            .await
            .map_err(|e| ApplicationError::api("保存失败", e))?;

        tracing::info!(novel_id = %novel_id, kind = %kind, version = %version, "Settings saved");
        self.events.publish(PanelEvent::notice(
            Severity::Success,
            format!("✅ {}保存成功", kind.label()),
        ));
        Ok(())
    }

    pub async fn load_character_settings(
        &self,
        version: &str,
    ) -> Result<Option<LoadedSettings>, ApplicationError> {
        self.load_version(SettingsKind::Character, version).await
    }

    pub async fn load_world_settings(
        &self,
        version: &str,
    ) -> Result<Option<LoadedSettings>, ApplicationError> {
        self.load_version(SettingsKind::World, version).await
    }

    pub async fn create_new_character_version(
        &self,
        editor_content: impl Into<String>,
    ) -> Result<LoadedSettings, ApplicationError> {
        self.create_new_version(CreateSettingsVersion {
            kind: SettingsKind::Character,
            editor_content: editor_content.into(),
        })
        .await
    }

    pub async fn create_new_world_version(
        &self,
        editor_content: impl Into<String>,
    ) -> Result<LoadedSettings, ApplicationError> {
        self.create_new_version(CreateSettingsVersion {
            kind: SettingsKind::World,
            editor_content: editor_content.into(),
        })
        .await
    }

    pub async fn save_character_settings(
        &self,
        editor_content: impl Into<String>,
    ) -> Result<(), ApplicationError> {
        self.save_version(SaveSettingsVersion {
            kind: SettingsKind::Character,
            editor_content: editor_content.into(),
        })
        .await
    }

    pub async fn save_world_settings(
        &self,
        editor_content: impl Into<String>,
    ) -> Result<(), ApplicationError> {
        self.save_version(SaveSettingsVersion {
            kind: SettingsKind::World,
            editor_content: editor_content.into(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeNovelApi;
    use crate::infrastructure::events::EventPublisher;
    use serde_json::json;

    async fn setup() -> (Arc<FakeNovelApi>, Arc<EventPublisher>, SettingsManager) {
        let api = Arc::new(FakeNovelApi::new());
        for version in [1, 3, 2] {
            api.insert_settings("n1", SettingsKind::Character, version, json!({ "v": version }))
                .await;
        }
        api.insert_settings("n1", SettingsKind::World, 1, json!({"世界": "九州"}))
            .await;
        let events = Arc::new(EventPublisher::new());
        let manager = SettingsManager::new(api.clone(), events.clone());
        (api, events, manager)
    }

    #[tokio::test]
    async fn test_load_selects_highest_version() {
        let (_, _, manager) = setup().await;
        let overview = manager.load_settings("n1").await.unwrap();

        assert_eq!(overview.character_versions.len(), 3);
        let character = overview.loaded(SettingsKind::Character).unwrap();
        assert_eq!(character.version, "003");
        assert_eq!(character.content, json!({"v": 3}));
        assert_eq!(overview.loaded(SettingsKind::World).unwrap().version, "01");

        let context = manager.context().await;
        assert_eq!(context.current_version(SettingsKind::Character), "003");
        assert_eq!(
            overview.to_string(),
            "✅ 找到小说 n1\n👤 人物设定: 3个版本\n🌍 世界设定: 1个版本"
        );
    }

    #[tokio::test]
    async fn test_load_requires_novel_id() {
        let (_, events, manager) = setup().await;
        let mut rx = events.subscribe();

        let err = manager.load_settings("  ").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            rx.recv().await.unwrap(),
            PanelEvent::status(Panel::Settings, Severity::Warning, "请输入小说ID")
        );
    }

    #[tokio::test]
    async fn test_unknown_novel_has_no_versions() {
        let (_, _, manager) = setup().await;
        let overview = manager.load_settings("other").await.unwrap();
        assert!(overview.character_versions.is_empty());
        assert!(overview.character.is_none());
        assert!(overview.world.is_none());
    }

    #[tokio::test]
    async fn test_load_version_noop_when_empty() {
        let (_, _, manager) = setup().await;
        assert!(manager.load_character_settings("001").await.unwrap().is_none());

        manager.load_settings("n1").await.unwrap();
        assert!(manager.load_world_settings("").await.unwrap().is_none());

        let loaded = manager.load_character_settings("001").await.unwrap().unwrap();
        assert_eq!(loaded.pretty, "{\n  \"v\": 1\n}");
    }

    #[tokio::test]
    async fn test_save_round_trip() {
        let (api, _, manager) = setup().await;
        manager.load_settings("n1").await.unwrap();

        manager.save_character_settings(r#"{"a":1}"#).await.unwrap();
        assert_eq!(
            api.settings_content("n1", SettingsKind::Character, 3).await,
            Some(json!({"a": 1}))
        );

        let reloaded = manager.load_character_settings("003").await.unwrap().unwrap();
        assert_eq!(reloaded.content, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_save_validation_messages() {
        let (_, _, manager) = setup().await;
        let err = manager.save_world_settings("{}").await.unwrap_err();
        assert_eq!(err.to_string(), "请先选择要保存的版本");

        manager.load_settings("n1").await.unwrap();
        let err = manager.save_world_settings("   ").await.unwrap_err();
        assert_eq!(err.to_string(), "世界设定内容不能为空");

        let err = manager.save_world_settings("{broken").await.unwrap_err();
        assert_eq!(err.to_string(), "JSON格式错误，请检查语法");
    }

    #[tokio::test]
    async fn test_create_new_version() {
        let (api, _, manager) = setup().await;

        let err = manager.create_new_character_version("{}").await.unwrap_err();
        assert_eq!(err.to_string(), "请先加载小说设定");

        manager.load_settings("n1").await.unwrap();
        let err = manager.create_new_character_version("").await.unwrap_err();
        assert_eq!(err.to_string(), "当前没有人物设定内容可复制");

        let err = manager.create_new_character_version("{oops").await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidJson(_)));

        let loaded = manager
            .create_new_character_version(r#"{"主角":"萧炎"}"#)
            .await
            .unwrap();
        assert_eq!(loaded.version, "004");
        assert_eq!(
            api.settings_content("n1", SettingsKind::Character, 4).await,
            Some(json!({"主角": "萧炎"}))
        );

        let context = manager.context().await;
        assert_eq!(context.versions(SettingsKind::Character).len(), 4);
        assert_eq!(context.current_version(SettingsKind::Character), "004");
    }

    #[tokio::test]
    async fn test_create_world_version_uses_two_digits() {
        let (_, _, manager) = setup().await;
        manager.load_settings("n1").await.unwrap();

        let loaded = manager.create_new_world_version(r#"{"世界":"新"}"#).await.unwrap();
        assert_eq!(loaded.version, "02");
        assert_eq!(loaded.kind, SettingsKind::World);
    }
}
