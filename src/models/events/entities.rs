use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::submissions::entities::{Submission, SubmissionStatus};
use crate::models::{ClassId, HomeworkId, SchoolId, SubmissionId, UserId};

/// 事件中携带的提交快照
///
/// 聚合只依赖快照和版本号：同一提交取版本最大的快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionFact {
    pub submission_id: SubmissionId,
    pub homework_id: HomeworkId,
    pub student_id: UserId,
    pub status: SubmissionStatus,
    pub grade: Option<f64>,
    pub effective_grade: Option<f64>,
    pub is_late: bool,
    pub is_active: bool,
    pub version: u64,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl From<&Submission> for SubmissionFact {
    fn from(submission: &Submission) -> Self {
        Self {
            submission_id: submission.id,
            homework_id: submission.homework_id,
            student_id: submission.student_id,
            status: submission.status,
            grade: submission.grade,
            effective_grade: submission.effective_grade,
            is_late: submission.is_late,
            is_active: submission.is_active,
            version: submission.version,
            submitted_at: submission.submitted_at,
            graded_at: submission.graded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    SubmissionCreated,
    // 评分前重新提交：替换文件并回到 Pending
    SubmissionUpdated {
        previous_status: SubmissionStatus,
    },
    SubmissionStatusChanged {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },
    SubmissionGraded {
        grade: f64,
    },
    SubmissionRegraded {
        previous_grade: Option<f64>,
        grade: f64,
    },
    // 已评分后重新提交，旧记录转为历史
    SubmissionSuperseded {
        superseded_by: SubmissionId,
    },
    AnalysisAttached,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SubmissionCreated => "submission_created",
            EventKind::SubmissionUpdated { .. } => "submission_updated",
            EventKind::SubmissionStatusChanged { .. } => "submission_status_changed",
            EventKind::SubmissionGraded { .. } => "submission_graded",
            EventKind::SubmissionRegraded { .. } => "submission_regraded",
            EventKind::SubmissionSuperseded { .. } => "submission_superseded",
            EventKind::AnalysisAttached => "analysis_attached",
        }
    }
}

/// 生命周期事件
///
/// 按 homework_id 分区，`seq` 在分区内单调递增。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifecycleEvent {
    pub seq: u64,
    pub homework_id: HomeworkId,
    pub class_id: ClassId,
    pub school_id: SchoolId,
    pub student_id: UserId,
    pub submission_id: SubmissionId,
    pub actor_id: Option<UserId>,
    pub kind: EventKind,
    pub fact: SubmissionFact,
    pub occurred_at: DateTime<Utc>,
}
