//! 生命周期事件下游
//!
//! 事件在存储层与数据写入原子提交后才会发布到这里。下游（日志、统计失效、通知等）
//! 的失败不会影响已经完成的写入。

use std::sync::Arc;

use tracing::info;

use crate::models::events::entities::LifecycleEvent;

#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, events: &[LifecycleEvent]);
}

/// 以结构化日志输出事件
#[derive(Debug, Default)]
pub struct TracingEventSink;

#[async_trait::async_trait]
impl EventSink for TracingEventSink {
    async fn publish(&self, events: &[LifecycleEvent]) {
        for event in events {
            info!(
                event = event.kind.name(),
                seq = event.seq,
                homework_id = %event.homework_id,
                submission_id = %event.submission_id,
                student_id = %event.student_id,
                status = %event.fact.status,
                version = event.fact.version,
                "lifecycle event committed"
            );
        }
    }
}

/// 依次转发给多个下游
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait::async_trait]
impl EventSink for FanoutSink {
    async fn publish(&self, events: &[LifecycleEvent]) {
        if events.is_empty() {
            return;
        }
        for sink in &self.sinks {
            sink.publish(events).await;
        }
    }
}

/// 记录收到的事件（测试用）
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    pub events: std::sync::Mutex<Vec<LifecycleEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .map(|events| events.iter().map(|e| e.kind.name()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, events: &[LifecycleEvent]) {
        if let Ok(mut recorded) = self.events.lock() {
            recorded.extend_from_slice(events);
        }
    }
}
