//! Template Manager - 模版增删改查与预览

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::error::ApplicationError;
use crate::application::ports::{NovelApiPort, PanelEvent, PanelEventSink};
use crate::domain::batch::Severity;
use crate::domain::template::{
    render_preview, Template, TemplateContents, TemplateForm, TemplateInfo, TemplateOption,
    TemplateStore,
};

/// 选中模版后的编辑器内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSelection {
    pub form: TemplateForm,
    /// 清空选择时为 None
    pub info: Option<TemplateInfo>,
}

/// 模版管理器
pub struct TemplateManager {
    api: Arc<dyn NovelApiPort>,
    events: Arc<dyn PanelEventSink>,
    store: RwLock<TemplateStore>,
    current: RwLock<Option<Template>>,
}

impl TemplateManager {
    pub fn new(api: Arc<dyn NovelApiPort>, events: Arc<dyn PanelEventSink>) -> Self {
        Self {
            api,
            events,
            store: RwLock::new(TemplateStore::default()),
            current: RwLock::new(None),
        }
    }

    /// 拉取全部模版并整体替换本地缓存
    pub async fn load_templates(&self) -> Result<TemplateStore, ApplicationError> {
        let response = self
            .api
            .list_templates()
            .await
            .map_err(|e| ApplicationError::api("加载模版失败", e))?;

        let store = TemplateStore::new(response.templates);
        tracing::info!(count = store.len(), "Templates loaded");

        *self.store.write().await = store.clone();
        Ok(store)
    }

    /// 当前缓存的快照
    pub async fn store(&self) -> TemplateStore {
        self.store.read().await.clone()
    }

    /// 模版下拉选项
    pub async fn template_options(&self) -> Vec<TemplateOption> {
        self.store.read().await.options()
    }

    pub async fn current_template(&self) -> Option<Template> {
        self.current.read().await.clone()
    }

    /// 选中模版并加载三个提示词文件
    ///
    /// 空 ID 清空编辑器；缓存中不存在的 ID 返回 None。
    /// 单个文件加载失败时以空文本代替。
    pub async fn select_template(&self, template_id: &str) -> Option<TemplateSelection> {
        if template_id.is_empty() {
            return Some(self.clear_editor().await);
        }

        let template = self.store.read().await.get(template_id).cloned()?;
        *self.current.write().await = Some(template.clone());

        let files = &template.files;
        let (writer_role, writing_rules, update_state_rules) = futures_util::future::join3(
            self.load_template_file(&files.writer_role),
            self.load_template_file(&files.writing_rules),
            self.load_template_file(&files.update_state_rules),
        )
        .await;

        let contents = TemplateContents {
            writer_role,
            writing_rules,
            update_state_rules,
        };

        tracing::debug!(template_id = %template_id, "Template selected");

        Some(TemplateSelection {
            form: TemplateForm::from_template(&template, contents),
            info: Some(TemplateInfo::from(&template)),
        })
    }

    async fn load_template_file(&self, filename: &str) -> String {
        match self.api.template_file(filename).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(filename = %filename, error = %e, "加载文件失败");
                String::new()
            }
        }
    }

    async fn clear_editor(&self) -> TemplateSelection {
        *self.current.write().await = None;
        TemplateSelection {
            form: TemplateForm::default(),
            info: None,
        }
    }

    /// 新建模版：清空编辑器并分配下一个 ID
    pub async fn new_template(&self) -> TemplateForm {
        self.clear_editor().await;
        let next_id = self.store.read().await.next_id();
        TemplateForm::with_id(next_id)
    }

    /// 校验并保存模版，随后刷新缓存
    pub async fn save_template(&self, form: &TemplateForm) -> Result<Template, ApplicationError> {
        let template = form.collect()?;

        self.api
            .save_template(&template)
            .await
            .map_err(|e| ApplicationError::api("保存模版失败", e))?;

        tracing::info!(template_id = %template.id, name = %template.name, "Template saved");
        self.events
            .publish(PanelEvent::notice(Severity::Success, "模版保存成功！"));

        self.load_templates().await?;
        Ok(template)
    }

    /// 渲染只读预览，不发请求
    pub fn preview_template(&self, form: &TemplateForm) -> Result<String, ApplicationError> {
        let template = form.collect()?;
        Ok(render_preview(&template))
    }
}
