use serde::Deserialize;

use super::entities::FileRef;
use crate::models::{HomeworkId, UserId};

/// 学生提交作业（HTTP 请求体）
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitHomeworkRequest {
    pub files: Vec<FileRef>,
    pub idempotency_key: Option<String>,
}

/// 生命周期引擎的提交输入
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub homework_id: HomeworkId,
    pub student_id: UserId,
    pub files: Vec<FileRef>,
    pub idempotency_key: Option<String>,
}

/// 评分 / 重新评分请求
#[derive(Debug, Clone, Deserialize)]
pub struct GradeSubmissionRequest {
    pub score: f64,
    pub feedback: Option<String>,
}

/// 改分请求：不带 feedback 时保留原评语，`clear_feedback` 为 true 时清除
#[derive(Debug, Clone, Deserialize)]
pub struct RegradeSubmissionRequest {
    pub score: f64,
    pub feedback: Option<String>,
    #[serde(default)]
    pub clear_feedback: bool,
}

/// 学生跨作业提交列表查询
#[derive(Debug, Clone, Deserialize)]
pub struct StudentSubmissionsQuery {
    pub student_id: UserId,
    // 默认只返回有效提交
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

/// 要求重新提交请求
#[derive(Debug, Clone, Deserialize)]
pub struct ResubmissionRequest {
    pub reason: String,
}
