//! 提交级互斥锁
//!
//! - 每个提交一把锁：评分、查看、要求重交等写操作在锁内串行执行，等待超时返回 `Timeout`
//! - 每个 (作业, 学生) 一个提交槽：同一学生对同一作业的并发提交只允许一个进行

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::errors::{HWSystemError, Result};
use crate::models::{HomeworkId, SubmissionId, UserId};

type LockTable<K> = DashMap<K, Arc<Mutex<()>>>;

pub struct SubmissionLocks {
    submissions: LockTable<SubmissionId>,
    drafts: LockTable<(HomeworkId, UserId)>,
    timeout: Duration,
}

impl SubmissionLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            submissions: DashMap::new(),
            drafts: DashMap::new(),
            timeout,
        }
    }

    fn handle<K>(table: &LockTable<K>, key: K) -> Arc<Mutex<()>>
    where
        K: std::hash::Hash + Eq,
    {
        table.entry(key).or_default().value().clone()
    }

    /// 获取提交锁，超时返回 `Timeout`
    pub async fn acquire(&self, submission_id: SubmissionId) -> Result<OwnedMutexGuard<()>> {
        let lock = Self::handle(&self.submissions, submission_id);
        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                HWSystemError::timeout(format!(
                    "等待提交 {submission_id} 的锁超过 {} ms",
                    self.timeout.as_millis()
                ))
            })
    }

    /// 尝试获取提交锁，锁被占用时立即返回 `None`
    pub fn try_acquire(&self, submission_id: SubmissionId) -> Option<OwnedMutexGuard<()>> {
        Self::handle(&self.submissions, submission_id)
            .try_lock_owned()
            .ok()
    }

    /// 占用 (作业, 学生) 的提交槽
    pub fn claim_draft(
        &self,
        homework_id: HomeworkId,
        student_id: UserId,
    ) -> Result<OwnedMutexGuard<()>> {
        Self::handle(&self.drafts, (homework_id, student_id))
            .try_lock_owned()
            .map_err(|_| Self::draft_busy(homework_id, student_id))
    }

    /// 等待提交槽，最多等待锁超时时间
    pub async fn wait_for_draft(
        &self,
        homework_id: HomeworkId,
        student_id: UserId,
    ) -> Result<OwnedMutexGuard<()>> {
        let slot = Self::handle(&self.drafts, (homework_id, student_id));
        tokio::time::timeout(self.timeout, slot.lock_owned())
            .await
            .map_err(|_| Self::draft_busy(homework_id, student_id))
    }

    fn draft_busy(homework_id: HomeworkId, student_id: UserId) -> HWSystemError {
        HWSystemError::duplicate_active_submission(format!(
            "学生 {student_id} 对作业 {homework_id} 的提交正在处理中"
        ))
    }

    /// 当前登记的锁数量（含空闲）
    pub fn len(&self) -> usize {
        self.submissions.len() + self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清理无人持有的锁，返回清理数量
    pub fn prune(&self) -> usize {
        let before = self.len();
        self.submissions.retain(|_, lock| Arc::strong_count(lock) > 1);
        self.drafts.retain(|_, lock| Arc::strong_count(lock) > 1);
        let pruned = before.saturating_sub(self.len());
        if pruned > 0 {
            debug!("Pruned {} idle submission locks", pruned);
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_acquire_times_out_while_held() {
        let locks = SubmissionLocks::new(Duration::from_millis(20));
        let id = Uuid::new_v4();
        let _held = locks.acquire(id).await.unwrap();

        let err = locks.acquire(id).await.unwrap_err();
        assert!(matches!(err, HWSystemError::Timeout(_)));
        assert!(locks.try_acquire(id).is_none());
    }

    #[tokio::test]
    async fn test_draft_slot_is_exclusive_until_released() {
        let locks = SubmissionLocks::new(Duration::from_millis(20));
        let (hw, student) = (Uuid::new_v4(), Uuid::new_v4());

        let slot = locks.claim_draft(hw, student).unwrap();
        assert!(matches!(
            locks.claim_draft(hw, student),
            Err(HWSystemError::DuplicateActiveSubmission(_))
        ));
        drop(slot);
        assert!(locks.claim_draft(hw, student).is_ok());
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = SubmissionLocks::new(Duration::from_millis(20));
        let held_id = Uuid::new_v4();
        let _held = locks.acquire(held_id).await.unwrap();
        drop(locks.acquire(Uuid::new_v4()).await.unwrap());

        assert_eq!(locks.prune(), 1);
        assert_eq!(locks.len(), 1);
        assert!(locks.submissions.contains_key(&held_id));
    }

    #[tokio::test]
    async fn test_waiting_for_draft_slot_succeeds_once_released() {
        let locks = SubmissionLocks::new(Duration::from_millis(200));
        let (hw, student) = (Uuid::new_v4(), Uuid::new_v4());
        let slot = locks.claim_draft(hw, student).unwrap();

        let (waited, _) = tokio::join!(locks.wait_for_draft(hw, student), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(slot);
        });
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn test_waiting_for_draft_slot_gives_up_after_timeout() {
        let locks = SubmissionLocks::new(Duration::from_millis(20));
        let (hw, student) = (Uuid::new_v4(), Uuid::new_v4());
        let _slot = locks.claim_draft(hw, student).unwrap();

        assert!(matches!(
            locks.wait_for_draft(hw, student).await,
            Err(HWSystemError::DuplicateActiveSubmission(_))
        ));
    }
}
