//! Event Publisher Implementation
//!
//! 面板事件广播，展示层通过 `subscribe` 订阅

use tokio::sync::broadcast;

use crate::application::ports::{PanelEvent, PanelEventSink};

/// 默认广播缓冲
const DEFAULT_CAPACITY: usize = 256;

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<PanelEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { channel: tx }
    }

    /// 订阅之后发布的事件
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.channel.subscribe()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelEventSink for EventPublisher {
    fn publish(&self, event: PanelEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::trace!(error = %e, "Failed to publish panel event (no receivers)");
        }
    }
}
