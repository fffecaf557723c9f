use serde::Serialize;

use super::entities::{Submission, SubmissionStatus};
use crate::models::SubmissionId;

/// 提交作业响应
#[derive(Debug, Serialize, PartialEq)]
pub struct SubmitHomeworkResponse {
    pub submission_id: SubmissionId,
    pub status: SubmissionStatus,
    pub is_late: bool,
}

impl From<&Submission> for SubmitHomeworkResponse {
    fn from(submission: &Submission) -> Self {
        Self {
            submission_id: submission.id,
            status: submission.status,
            is_late: submission.is_late,
        }
    }
}

/// 评分响应
#[derive(Debug, Serialize, PartialEq)]
pub struct GradeSubmissionResponse {
    pub submission_id: SubmissionId,
    pub status: SubmissionStatus,
    pub grade: Option<f64>,
    pub effective_grade: Option<f64>,
}

impl From<&Submission> for GradeSubmissionResponse {
    fn from(submission: &Submission) -> Self {
        Self {
            submission_id: submission.id,
            status: submission.status,
            grade: submission.grade,
            effective_grade: submission.effective_grade,
        }
    }
}

/// 提交列表响应
#[derive(Debug, Serialize)]
pub struct SubmissionListResponse {
    pub items: Vec<Submission>,
    pub total: usize,
}
