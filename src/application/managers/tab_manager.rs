//! Tab Manager - 面板切换

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::error::ApplicationError;
use crate::application::managers::{BatchGenerator, TemplateManager};
use crate::domain::template::{TemplateOption, TemplateStore};

/// 面板
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Template,
    Generate,
    Settings,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Template => "template",
            Tab::Generate => "generate",
            Tab::Settings => "settings",
        }
    }
}

impl std::str::FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "template" => Ok(Tab::Template),
            "generate" => Ok(Tab::Generate),
            "settings" => Ok(Tab::Settings),
            other => Err(format!("unknown tab: {}", other)),
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 切换面板时重新加载的数据
#[derive(Debug, Clone)]
pub enum TabReload {
    Templates(TemplateStore),
    GenerationTemplates(Vec<TemplateOption>),
    None,
}

/// 面板管理器
pub struct TabManager {
    templates: Arc<TemplateManager>,
    batch: Arc<BatchGenerator>,
    active: RwLock<Tab>,
}

impl TabManager {
    pub fn new(templates: Arc<TemplateManager>, batch: Arc<BatchGenerator>) -> Self {
        Self {
            templates,
            batch,
            active: RwLock::new(Tab::default()),
        }
    }

    pub async fn active(&self) -> Tab {
        *self.active.read().await
    }

    /// 切换面板，模版和生成面板会重新加载模版
    pub async fn switch_to(&self, tab: Tab) -> Result<TabReload, ApplicationError> {
        *self.active.write().await = tab;
        tracing::debug!(tab = %tab, "Tab switched");

        match tab {
            Tab::Template => Ok(TabReload::Templates(self.templates.load_templates().await?)),
            Tab::Generate => Ok(TabReload::GenerationTemplates(
                self.batch.load_templates_for_batch().await?,
            )),
            Tab::Settings => Ok(TabReload::None),
        }
    }
}
