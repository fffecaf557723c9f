//! 事件日志存储操作

use std::collections::HashMap;

use super::{MemoryStorage, Partition};
use crate::errors::Result;
use crate::models::{HomeworkId, events::entities::LifecycleEvent};

impl MemoryStorage {
    pub(super) async fn read_events_since_impl(
        &self,
        cursors: &HashMap<HomeworkId, u64>,
    ) -> Result<Vec<LifecycleEvent>> {
        // 先复制分区句柄，避免跨 await 持有 DashMap 引用
        let partitions: Vec<(HomeworkId, Partition)> = self
            .partitions
            .iter()
            .map(|p| (*p.key(), p.value().clone()))
            .collect();

        let mut events = Vec::new();
        for (homework_id, partition) in partitions {
            let cursor = cursors.get(&homework_id).copied().unwrap_or(0) as usize;
            let log = partition.lock().await;
            if cursor < log.len() {
                events.extend(log[cursor..].iter().cloned());
            }
        }
        Ok(events)
    }
}
