//! Batch Context - 批量章节生成上下文
//!
//! 职责:
//! - 批量会话状态机与协作式取消
//! - 进度计算
//! - 会话日志
//! - 占位细纲

mod log;
mod outline;
mod progress;
mod session;

pub use log::{BatchLog, LogEntry, Severity};
pub use outline::{placeholder_outline, PLACEHOLDER_TARGET_WORDS};
pub use progress::Progress;
pub use session::{BatchPhase, BatchRejection, BatchSession, ControlState};
