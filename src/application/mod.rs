//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（NovelApiPort、PanelEventSink）
//! - commands: 控制器的输入命令
//! - managers: 四个面板控制器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod managers;
pub mod ports;

// Re-exports
pub use commands::{
    BatchPlan, CreateSettingsVersion, GenerationOptions, ManualUpdateState, SaveSettingsVersion,
    StartBatchGeneration,
};
pub use error::ApplicationError;
pub use managers::{
    BatchGenerator, BatchGeneratorConfig, BatchReport, BatchTermination, LoadedSettings,
    SettingsManager, SettingsOverview, Tab, TabManager, TabReload, TemplateManager,
};
pub use ports::{ApiError, NovelApiPort, Panel, PanelEvent, PanelEventSink};
