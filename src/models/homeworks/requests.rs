use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entities::LatePolicy;
use crate::models::ClassId;

/// 创建作业请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateHomeworkRequest {
    pub class_id: ClassId,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    #[serde(default)]
    pub late_policy: LatePolicy,
}

/// 修改作业请求（仅在尚无任何提交时允许）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmendHomeworkRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub late_policy: Option<LatePolicy>,
}

/// 班级作业列表查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct HomeworkListQuery {
    pub class_id: ClassId,
}
