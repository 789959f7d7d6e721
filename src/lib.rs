//! NovelGen - 小说生成控制面板
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Template Context: 模版与提示词文件
//! - Batch Context: 批量生成会话、日志、进度
//! - Settings Context: 人物/世界设定版本
//!
//! 应用层 (application/):
//! - Ports: 端口定义（NovelApiPort, PanelEventSink）
//! - Commands: 控制器输入
//! - Managers: TabManager, TemplateManager, BatchGenerator, SettingsManager
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP 后端客户端、内存后端
//! - Events: 面板事件广播

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
