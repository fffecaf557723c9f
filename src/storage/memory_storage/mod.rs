//! 内存存储实现
//!
//! 提交写入与事件追加在同一个作业分区锁内完成，保证二者原子生效。

mod directory;
mod events;
mod homeworks;
mod submissions;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::errors::Result;
use crate::models::{
    ClassId, HomeworkId, SchoolId, SubmissionId, UserId,
    directory::entities::{ClassRoster, ParentLink, SchoolProfile},
    events::entities::LifecycleEvent,
    homeworks::entities::Homework,
    submissions::entities::Submission,
};
use crate::storage::{CommitBatch, Storage, SubmissionFilter};

/// 单个作业分区的事件日志
pub(crate) type Partition = Arc<Mutex<Vec<LifecycleEvent>>>;

/// 内存存储实现
#[derive(Default)]
pub struct MemoryStorage {
    schools: DashMap<SchoolId, SchoolProfile>,
    classes: DashMap<ClassId, ClassRoster>,
    parents: DashMap<UserId, BTreeSet<UserId>>,
    homeworks: DashMap<HomeworkId, Homework>,
    submissions: DashMap<SubmissionId, Submission>,
    // (作业, 学生) -> 有效提交
    active: DashMap<(HomeworkId, UserId), SubmissionId>,
    // (学生, 幂等键) -> 提交
    idempotency: DashMap<(UserId, String), SubmissionId>,
    partitions: DashMap<HomeworkId, Partition>,
}

impl MemoryStorage {
    /// 创建新的内存存储实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取（必要时创建）作业分区
    pub(crate) fn partition(&self, homework_id: HomeworkId) -> Partition {
        self.partitions.entry(homework_id).or_default().value().clone()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    // 组织架构模块
    async fn upsert_school(&self, school: SchoolProfile) -> Result<()> {
        self.upsert_school_impl(school)
    }

    async fn get_school(&self, school_id: SchoolId) -> Result<Option<SchoolProfile>> {
        self.get_school_impl(school_id)
    }

    async fn upsert_class(&self, roster: ClassRoster) -> Result<()> {
        self.upsert_class_impl(roster)
    }

    async fn get_class(&self, class_id: ClassId) -> Result<Option<ClassRoster>> {
        self.get_class_impl(class_id)
    }

    async fn list_classes(&self) -> Result<Vec<ClassRoster>> {
        self.list_classes_impl()
    }

    async fn link_parent(&self, link: ParentLink) -> Result<()> {
        self.link_parent_impl(link)
    }

    async fn is_parent_of(&self, parent_id: UserId, student_id: UserId) -> Result<bool> {
        self.is_parent_of_impl(parent_id, student_id)
    }

    // 作业模块
    async fn insert_homework(&self, homework: Homework) -> Result<()> {
        self.insert_homework_impl(homework)
    }

    async fn get_homework(&self, homework_id: HomeworkId) -> Result<Option<Homework>> {
        self.get_homework_impl(homework_id)
    }

    async fn update_homework(
        &self,
        homework: Homework,
        only_if_unreferenced: bool,
    ) -> Result<bool> {
        self.update_homework_impl(homework, only_if_unreferenced)
            .await
    }

    async fn delete_homework(&self, homework_id: HomeworkId) -> Result<bool> {
        self.delete_homework_impl(homework_id).await
    }

    async fn list_homeworks(&self) -> Result<Vec<Homework>> {
        self.list_homeworks_impl()
    }

    // 提交模块
    async fn get_submission(&self, submission_id: SubmissionId) -> Result<Option<Submission>> {
        self.get_submission_impl(submission_id)
    }

    async fn get_active_submission(
        &self,
        homework_id: HomeworkId,
        student_id: UserId,
    ) -> Result<Option<Submission>> {
        self.get_active_submission_impl(homework_id, student_id)
    }

    async fn list_submissions(&self, filter: SubmissionFilter) -> Result<Vec<Submission>> {
        self.list_submissions_impl(filter)
    }

    async fn count_submissions(&self, homework_id: HomeworkId) -> Result<usize> {
        self.count_submissions_impl(homework_id)
    }

    async fn find_idempotent_submission(
        &self,
        student_id: UserId,
        key: &str,
    ) -> Result<Option<SubmissionId>> {
        self.find_idempotent_submission_impl(student_id, key)
    }

    async fn commit(&self, batch: CommitBatch) -> Result<Vec<LifecycleEvent>> {
        self.commit_impl(batch).await
    }

    // 事件日志模块
    async fn read_events_since(
        &self,
        cursors: &HashMap<HomeworkId, u64>,
    ) -> Result<Vec<LifecycleEvent>> {
        self.read_events_since_impl(cursors).await
    }
}
