//! 数据模型定义
//!
//! 每个子模块按 entities / requests / responses 拆分，与 HTTP 边界的 JSON 结构一一对应。

pub mod actors;
pub mod common;
pub mod directory;
pub mod events;
pub mod homeworks;
pub mod stats;
pub mod submissions;

pub use common::error_code::ErrorCode;
pub use common::response::ApiResponse;

/// 用户 ID（由身份提供方分配）
pub type UserId = uuid::Uuid;
/// 学校 ID
pub type SchoolId = uuid::Uuid;
/// 班级 ID
pub type ClassId = uuid::Uuid;
/// 作业 ID
pub type HomeworkId = uuid::Uuid;
/// 提交 ID
pub type SubmissionId = uuid::Uuid;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
