use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{
    ClassId, HomeworkId, SchoolId, SubmissionId, UserId,
    directory::entities::{ClassRoster, ParentLink, SchoolProfile},
    events::entities::{EventKind, LifecycleEvent},
    homeworks::entities::Homework,
    submissions::entities::Submission,
};

pub mod memory_storage;

/// 一次提交写入
///
/// `expected_version` 为 `None` 表示新建；否则必须与当前版本一致（乐观锁）。
#[derive(Debug, Clone)]
pub struct SubmissionWrite {
    pub record: Submission,
    pub expected_version: Option<u64>,
    pub kind: EventKind,
}

/// 幂等键登记
#[derive(Debug, Clone)]
pub struct IdempotencyRecord {
    pub student_id: UserId,
    pub key: String,
    pub submission_id: SubmissionId,
}

/// 原子提交批次：记录写入与对应事件要么全部生效，要么全部不生效
#[derive(Debug, Clone)]
pub struct CommitBatch {
    pub homework_id: HomeworkId,
    pub class_id: ClassId,
    pub school_id: SchoolId,
    pub actor_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
    pub writes: Vec<SubmissionWrite>,
    pub idempotency: Option<IdempotencyRecord>,
}

/// 提交查询条件
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub homework_id: Option<HomeworkId>,
    pub student_id: Option<UserId>,
    pub active_only: bool,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 组织架构方法
    // 新增或覆盖学校信息
    async fn upsert_school(&self, school: SchoolProfile) -> Result<()>;
    // 获取学校信息
    async fn get_school(&self, school_id: SchoolId) -> Result<Option<SchoolProfile>>;
    // 新增或覆盖班级花名册
    async fn upsert_class(&self, roster: ClassRoster) -> Result<()>;
    // 获取班级花名册
    async fn get_class(&self, class_id: ClassId) -> Result<Option<ClassRoster>>;
    // 列出全部班级
    async fn list_classes(&self) -> Result<Vec<ClassRoster>>;
    // 关联家长与学生
    async fn link_parent(&self, link: ParentLink) -> Result<()>;
    // 是否为学生的家长
    async fn is_parent_of(&self, parent_id: UserId, student_id: UserId) -> Result<bool>;

    /// 作业管理方法
    // 创建作业
    async fn insert_homework(&self, homework: Homework) -> Result<()>;
    // 通过ID获取作业
    async fn get_homework(&self, homework_id: HomeworkId) -> Result<Option<Homework>>;
    // 覆盖作业；`only_if_unreferenced` 时若已有提交则返回 false
    async fn update_homework(&self, homework: Homework, only_if_unreferenced: bool)
    -> Result<bool>;
    // 删除没有任何提交的作业，已有提交时返回 false
    async fn delete_homework(&self, homework_id: HomeworkId) -> Result<bool>;
    // 列出全部作业（含已归档）
    async fn list_homeworks(&self) -> Result<Vec<Homework>>;

    /// 提交管理方法
    // 通过ID获取提交
    async fn get_submission(&self, submission_id: SubmissionId) -> Result<Option<Submission>>;
    // 获取学生某作业的有效提交
    async fn get_active_submission(
        &self,
        homework_id: HomeworkId,
        student_id: UserId,
    ) -> Result<Option<Submission>>;
    // 按条件列出提交（按提交时间排序）
    async fn list_submissions(&self, filter: SubmissionFilter) -> Result<Vec<Submission>>;
    // 统计作业的提交数（含历史记录）
    async fn count_submissions(&self, homework_id: HomeworkId) -> Result<usize>;
    // 通过幂等键查找提交
    async fn find_idempotent_submission(
        &self,
        student_id: UserId,
        key: &str,
    ) -> Result<Option<SubmissionId>>;
    // 原子写入提交与事件
    async fn commit(&self, batch: CommitBatch) -> Result<Vec<LifecycleEvent>>;

    /// 事件日志方法
    // 读取各分区游标之后的事件（分区内按 seq 有序）
    async fn read_events_since(
        &self,
        cursors: &HashMap<HomeworkId, u64>,
    ) -> Result<Vec<LifecycleEvent>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = memory_storage::MemoryStorage::new();
    Ok(Arc::new(storage))
}
