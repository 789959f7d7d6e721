//! Batch Context - 批量生成会话
//!
//! 状态机: Idle -> Running -> (Stopping) -> Idle
//!
//! 不变量:
//! - 同一时刻至多一个批量循环在运行
//! - Idle 既是初始状态也是终止状态
//! - 停止是协作式的，只在章节边界检查取消令牌

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    Running,
    Stopping,
}

impl BatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchPhase::Idle => "idle",
            BatchPhase::Running => "running",
            BatchPhase::Stopping => "stopping",
        }
    }
}

/// 开始/停止控件的可用状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            start_enabled: true,
            stop_enabled: false,
        }
    }
}

/// 拒绝开始的原因
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BatchRejection {
    #[error("生成已在进行中，请耐心等待...")]
    AlreadyRunning,

    #[error("请等待当前操作完成...")]
    StartDisabled,
}

/// 批量生成会话（仅内存，不持久化）
#[derive(Debug)]
pub struct BatchSession {
    phase: BatchPhase,
    current_chapter: u32,
    total_chapters: u32,
    controls: ControlState,
    cancel: CancellationToken,
}

impl BatchSession {
    pub fn new() -> Self {
        Self {
            phase: BatchPhase::Idle,
            current_chapter: 0,
            total_chapters: 0,
            controls: ControlState::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// 占用开始控件
    ///
    /// 检查与禁用在同一次调用内完成，之后的重复调用会被拒绝。
    pub fn claim(&mut self) -> Result<(), BatchRejection> {
        self.check_can_start()?;
        self.controls.start_enabled = false;
        Ok(())
    }

    /// 只检查，不改变状态
    pub fn check_can_start(&self) -> Result<(), BatchRejection> {
        if self.phase != BatchPhase::Idle {
            return Err(BatchRejection::AlreadyRunning);
        }
        if !self.controls.start_enabled {
            return Err(BatchRejection::StartDisabled);
        }
        Ok(())
    }

    /// Idle -> Running，返回本轮的取消令牌
    pub fn begin(&mut self, total_chapters: u32) -> CancellationToken {
        self.phase = BatchPhase::Running;
        self.current_chapter = 0;
        self.total_chapters = total_chapters;
        self.controls = ControlState {
            start_enabled: false,
            stop_enabled: true,
        };
        self.cancel = CancellationToken::new();
        self.cancel.clone()
    }

    pub fn set_current_chapter(&mut self, current: u32) {
        self.current_chapter = current;
    }

    /// Running -> Stopping；非运行状态下返回 false
    pub fn request_stop(&mut self) -> bool {
        if self.phase != BatchPhase::Running {
            return false;
        }
        self.phase = BatchPhase::Stopping;
        self.cancel.cancel();
        true
    }

    /// 任意状态 -> Idle，恢复控件
    pub fn finish(&mut self) {
        *self = Self::new();
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn should_stop(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn current_chapter(&self) -> u32 {
        self.current_chapter
    }

    pub fn total_chapters(&self) -> u32 {
        self.total_chapters
    }

    pub fn controls(&self) -> ControlState {
        self.controls
    }
}

impl Default for BatchSession {
    fn default() -> Self {
        Self::new()
    }
}
