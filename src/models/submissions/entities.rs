use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{HomeworkId, SubmissionId, UserId};

// 提交状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,  // 待批阅
    Reviewed, // 已查看
    Graded,   // 已评分
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Reviewed => write!(f, "reviewed"),
            SubmissionStatus::Graded => write!(f, "graded"),
        }
    }
}

/// 外部文件存储返回的文件引用（核心只保存引用，不保存文件内容）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRef {
    pub url: String,
    pub name: Option<String>,
    pub content_type: Option<String>,
}

/// AI 分析结果，仅作参考，不参与评分
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiAnalysis {
    pub completeness_score: Option<f64>,
    pub clarity_score: Option<f64>,
    pub accuracy_score: Option<f64>,
    pub estimated_grade: Option<f64>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub detected_issues: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ResubmissionRequested,
    Regraded,
}

/// 审计记录，只追加不修改
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub previous_status: SubmissionStatus,
    pub previous_grade: Option<f64>,
    pub new_grade: Option<f64>,
    pub reason: Option<String>,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: SubmissionId,
    pub homework_id: HomeworkId,
    pub student_id: UserId,
    // 有序的文件引用列表
    pub files: Vec<FileRef>,
    pub status: SubmissionStatus,
    // 仅在 Graded 状态下存在
    pub grade: Option<f64>,
    // 扣除迟交惩罚后的成绩
    pub effective_grade: Option<f64>,
    pub teacher_feedback: Option<String>,
    pub ai_analysis: Option<AiAnalysis>,
    // 提交时计算：submitted_at > due_at
    pub is_late: bool,
    // 同一 (作业, 学生) 至多一个有效提交
    pub is_active: bool,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub graded_at: Option<DateTime<Utc>>,
    pub graded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // 乐观锁版本号，每次提交写入递增
    pub version: u64,
    pub audit_trail: Vec<AuditEntry>,
}

impl Submission {
    /// Graded 状态与成绩是否一致
    pub fn is_consistent(&self) -> bool {
        (self.status == SubmissionStatus::Graded) == self.grade.is_some()
            && self.grade.is_some() == self.effective_grade.is_some()
    }

    /// 去掉仅教师/校长可见的 AI 分析内容
    pub fn redacted(mut self) -> Self {
        self.ai_analysis = None;
        self
    }

    /// 清除评分相关字段
    pub(crate) fn clear_grade(&mut self) {
        self.grade = None;
        self.effective_grade = None;
        self.teacher_feedback = None;
        self.graded_at = None;
        self.graded_by = None;
    }
}
