//! 应用层 - 控制器
//!
//! 四个面板控制器，共享同一个后端端口与事件出口

mod batch_generator;
mod settings_manager;
mod tab_manager;
mod template_manager;

pub use batch_generator::{
    BatchGenerator, BatchGeneratorConfig, BatchReport, BatchTermination, GeneratedChapter,
    ProgressReport, SessionSnapshot, DEFAULT_STATUS_CLEAR,
};
pub use settings_manager::{LoadedSettings, SettingsManager, SettingsOverview};
pub use tab_manager::{Tab, TabManager, TabReload};
pub use template_manager::{TemplateManager, TemplateSelection};
