//! 核心引擎共享的运行时上下文

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::events::EventSink;
use super::locks::SubmissionLocks;
use super::retry::RetryPolicy;
use crate::config::LifecycleConfig;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    ClassId, HomeworkId, SubmissionId,
    actors::entities::Actor,
    directory::entities::ClassRoster,
    events::entities::{EventKind, LifecycleEvent},
    homeworks::entities::Homework,
    submissions::entities::Submission,
};
use crate::storage::{CommitBatch, Storage, SubmissionWrite};
use crate::utils::clock::Clock;

pub struct CoreContext {
    pub storage: Arc<dyn Storage>,
    pub locks: SubmissionLocks,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
    pub retry: RetryPolicy,
}

/// 在提交锁内加载到的一致视图
pub struct SubmissionView {
    pub submission: Submission,
    pub homework: Homework,
    pub roster: ClassRoster,
    pub now: DateTime<Utc>,
}

impl CoreContext {
    pub fn new(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
        config: &LifecycleConfig,
    ) -> Self {
        Self {
            storage,
            locks: SubmissionLocks::new(Duration::from_millis(config.lock_timeout_ms)),
            clock,
            events,
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_backoff_ms),
            ),
        }
    }

    pub async fn load_homework(&self, homework_id: HomeworkId) -> Result<Homework> {
        self.storage
            .get_homework(homework_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("作业不存在: {homework_id}")))
    }

    pub async fn load_class(&self, class_id: ClassId) -> Result<ClassRoster> {
        self.storage
            .get_class(class_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("班级不存在: {class_id}")))
    }

    pub async fn load_submission(&self, submission_id: SubmissionId) -> Result<Submission> {
        self.storage
            .get_submission(submission_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("提交不存在: {submission_id}")))
    }

    /// 原子提交后把事件发布给下游
    pub async fn commit(&self, batch: CommitBatch) -> Result<Vec<LifecycleEvent>> {
        let events = self.storage.commit(batch).await?;
        self.events.publish(&events).await;
        Ok(events)
    }

    /// 在提交锁内修改单个提交
    ///
    /// `apply` 基于锁内读取的视图返回新记录与事件类型；`Timeout` / `Conflict` 会按重试策略重放整个过程。
    pub async fn mutate_submission<F>(
        &self,
        actor: &Actor,
        submission_id: SubmissionId,
        operation: &str,
        apply: F,
    ) -> Result<Submission>
    where
        F: Fn(&SubmissionView) -> Result<(Submission, EventKind)>,
    {
        self.retry
            .run(operation, || self.mutate_once(actor, submission_id, &apply))
            .await
    }

    async fn mutate_once<F>(
        &self,
        actor: &Actor,
        submission_id: SubmissionId,
        apply: &F,
    ) -> Result<Submission>
    where
        F: Fn(&SubmissionView) -> Result<(Submission, EventKind)>,
    {
        let _guard = self.locks.acquire(submission_id).await?;

        let submission = self.load_submission(submission_id).await?;
        let homework = self.load_homework(submission.homework_id).await?;
        let roster = self.load_class(homework.class_id).await?;
        let view = SubmissionView {
            submission,
            homework,
            roster,
            now: self.clock.now(),
        };

        let (mut record, kind) = apply(&view)?;
        record.updated_at = view.now;

        let batch = CommitBatch {
            homework_id: view.homework.id,
            class_id: view.roster.id,
            school_id: view.roster.school_id,
            actor_id: Some(actor.id),
            occurred_at: view.now,
            writes: vec![SubmissionWrite {
                record,
                expected_version: Some(view.submission.version),
                kind,
            }],
            idempotency: None,
        };
        self.commit(batch).await?;

        self.load_submission(submission_id).await
    }
}
