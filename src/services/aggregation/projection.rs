//! 事件投影
//!
//! 同一提交只保留版本号最大的快照，因此重复投递、乱序投递得到的结果相同。

use std::collections::{BTreeMap, HashMap};

use crate::errors::Result;
use crate::models::{
    HomeworkId, SubmissionId,
    events::entities::{LifecycleEvent, SubmissionFact},
};
use crate::storage::Storage;

/// 按提交 ID 有序的快照表，保证求和顺序固定
pub type FactTable = BTreeMap<SubmissionId, SubmissionFact>;

#[derive(Debug, Default, Clone)]
pub struct Projection {
    cursors: HashMap<HomeworkId, u64>,
    facts: FactTable,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &LifecycleEvent) {
        let cursor = self.cursors.entry(event.homework_id).or_default();
        *cursor = (*cursor).max(event.seq);

        let newer = self
            .facts
            .get(&event.submission_id)
            .is_none_or(|known| known.version < event.fact.version);
        if newer {
            self.facts.insert(event.submission_id, event.fact.clone());
        }
    }

    /// 读取各分区游标之后的新事件
    pub async fn catch_up(&mut self, storage: &dyn Storage) -> Result<usize> {
        let events = storage.read_events_since(&self.cursors).await?;
        for event in &events {
            self.apply(event);
        }
        Ok(events.len())
    }

    pub fn facts(&self) -> &FactTable {
        &self.facts
    }
}
