//! 提交存储操作

use std::collections::HashSet;

use super::MemoryStorage;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    HomeworkId, SubmissionId, UserId,
    events::entities::{EventKind, LifecycleEvent, SubmissionFact},
    submissions::entities::Submission,
};
use crate::storage::{CommitBatch, SubmissionFilter};

impl MemoryStorage {
    pub(super) fn get_submission_impl(
        &self,
        submission_id: SubmissionId,
    ) -> Result<Option<Submission>> {
        Ok(self.submissions.get(&submission_id).map(|s| s.value().clone()))
    }

    pub(super) fn get_active_submission_impl(
        &self,
        homework_id: HomeworkId,
        student_id: UserId,
    ) -> Result<Option<Submission>> {
        let active_id = self
            .active
            .get(&(homework_id, student_id))
            .map(|id| *id.value());

        match active_id {
            Some(id) => self.get_submission_impl(id),
            None => Ok(None),
        }
    }

    pub(super) fn list_submissions_impl(&self, filter: SubmissionFilter) -> Result<Vec<Submission>> {
        let mut items: Vec<Submission> = self
            .submissions
            .iter()
            .filter(|s| filter.homework_id.is_none_or(|id| s.homework_id == id))
            .filter(|s| filter.student_id.is_none_or(|id| s.student_id == id))
            .filter(|s| !filter.active_only || s.is_active)
            .map(|s| s.value().clone())
            .collect();

        items.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then(a.id.cmp(&b.id))
        });
        Ok(items)
    }

    pub(super) fn count_submissions_impl(&self, homework_id: HomeworkId) -> Result<usize> {
        Ok(self
            .submissions
            .iter()
            .filter(|s| s.homework_id == homework_id)
            .count())
    }

    pub(super) fn find_idempotent_submission_impl(
        &self,
        student_id: UserId,
        key: &str,
    ) -> Result<Option<SubmissionId>> {
        Ok(self
            .idempotency
            .get(&(student_id, key.to_string()))
            .map(|id| *id.value()))
    }

    /// 原子写入一批提交记录并追加事件
    ///
    /// 先在分区锁内完成全部校验，校验通过后才落盘，任何一步失败都不会留下部分写入。
    pub(super) async fn commit_impl(&self, batch: CommitBatch) -> Result<Vec<LifecycleEvent>> {
        let partition = self.partition(batch.homework_id);
        let mut log = partition.lock().await;

        // 作业必须存在；新建提交时作业不能已归档
        let archived = self
            .homeworks
            .get(&batch.homework_id)
            .map(|h| h.is_archived())
            .ok_or_else(|| {
                HWSystemError::not_found(format!("作业不存在: {}", batch.homework_id))
            })?;
        let creates = batch.writes.iter().any(|w| w.expected_version.is_none());
        if archived && creates {
            return Err(HWSystemError::not_found(format!(
                "作业已归档: {}",
                batch.homework_id
            )));
        }

        // 校验阶段
        let deactivated: HashSet<SubmissionId> = batch
            .writes
            .iter()
            .filter(|w| !w.record.is_active)
            .map(|w| w.record.id)
            .collect();

        let mut staged: Vec<(Submission, EventKind)> = Vec::with_capacity(batch.writes.len());
        for write in batch.writes {
            if write.record.homework_id != batch.homework_id {
                return Err(HWSystemError::internal(format!(
                    "提交 {} 不属于作业分区 {}",
                    write.record.id, batch.homework_id
                )));
            }

            let current = self.submissions.get(&write.record.id).map(|s| s.version);
            let next_version = match (write.expected_version, current) {
                (None, None) => 1,
                (Some(expected), Some(actual)) if expected == actual => actual + 1,
                (None, Some(_)) => {
                    return Err(HWSystemError::conflict(format!(
                        "提交已存在: {}",
                        write.record.id
                    )));
                }
                (Some(expected), actual) => {
                    return Err(HWSystemError::conflict(format!(
                        "提交 {} 版本冲突: 期望 {expected}, 实际 {actual:?}",
                        write.record.id
                    )));
                }
            };

            if write.record.is_active {
                let holder = self
                    .active
                    .get(&(write.record.homework_id, write.record.student_id))
                    .map(|id| *id.value());
                if let Some(holder) = holder
                    && holder != write.record.id
                    && !deactivated.contains(&holder)
                {
                    return Err(HWSystemError::duplicate_active_submission(format!(
                        "学生 {} 在作业 {} 已有有效提交 {holder}",
                        write.record.student_id, write.record.homework_id
                    )));
                }
            }

            let mut record = write.record;
            record.version = next_version;
            staged.push((record, write.kind));
        }

        if let Some(idem) = &batch.idempotency {
            let existing = self
                .idempotency
                .get(&(idem.student_id, idem.key.clone()))
                .map(|id| *id.value());
            if existing.is_some_and(|id| id != idem.submission_id) {
                return Err(HWSystemError::conflict(format!(
                    "幂等键已被使用: {}",
                    idem.key
                )));
            }
        }

        // 写入阶段：先处理失效记录，再处理有效记录
        staged.sort_by_key(|(record, _)| record.is_active);

        let mut events = Vec::with_capacity(staged.len());
        for (record, kind) in staged {
            let key = (record.homework_id, record.student_id);
            if record.is_active {
                self.active.insert(key, record.id);
            } else {
                self.active.remove_if(&key, |_, id| *id == record.id);
            }

            let event = LifecycleEvent {
                seq: log.len() as u64 + 1,
                homework_id: batch.homework_id,
                class_id: batch.class_id,
                school_id: batch.school_id,
                student_id: record.student_id,
                submission_id: record.id,
                actor_id: batch.actor_id,
                kind,
                fact: SubmissionFact::from(&record),
                occurred_at: batch.occurred_at,
            };
            log.push(event.clone());
            events.push(event);
            self.submissions.insert(record.id, record);
        }

        if let Some(idem) = batch.idempotency {
            self.idempotency
                .insert((idem.student_id, idem.key), idem.submission_id);
        }

        Ok(events)
    }
}
