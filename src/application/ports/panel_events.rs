//! Panel Event Port - 面板展示事件
//!
//! 控制器只发布事件，不关心如何渲染；展示层订阅后自行绑定。

use serde::Serialize;

use crate::domain::batch::{LogEntry, Progress, Severity};

/// 状态栏所在的面板
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    /// 批量生成状态栏
    Batch,
    /// 批量生成的小说信息
    BatchInfo,
    /// 设定管理
    Settings,
}

/// 面板事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum PanelEvent {
    /// 批量生成日志追加
    Log(LogEntry),
    /// 状态栏更新
    Status {
        panel: Panel,
        severity: Severity,
        message: String,
    },
    /// 状态栏清空
    StatusCleared { panel: Panel },
    /// 进度更新
    Progress(Progress),
    /// 需要用户确认的提示（浏览器里的 alert）
    Notice { severity: Severity, message: String },
}

/// Panel Event Port
pub trait PanelEventSink: Send + Sync {
    fn publish(&self, event: PanelEvent);
}

impl PanelEvent {
    pub fn status(panel: Panel, severity: Severity, message: impl Into<String>) -> Self {
        PanelEvent::Status {
            panel,
            severity,
            message: message.into(),
        }
    }

    pub fn notice(severity: Severity, message: impl Into<String>) -> Self {
        PanelEvent::Notice {
            severity,
            message: message.into(),
        }
    }
}
