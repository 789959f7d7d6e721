//! Batch Context - 生成日志

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 日志与状态栏共用的严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// 单条日志
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// 批量生成日志
///
/// 只追加，会话内有效，不裁剪也不落盘。
#[derive(Debug, Clone, Default)]
pub struct BatchLog {
    entries: Vec<LogEntry>,
}

impl BatchLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条日志并返回其副本
    pub fn append(&mut self, severity: Severity, message: impl Into<String>) -> LogEntry {
        let entry = LogEntry::new(severity, message);
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
