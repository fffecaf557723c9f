use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{ClassId, HomeworkId, SchoolId, UserId};

/// 统计范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StatsScope {
    Class(ClassId),
    Student(UserId),
    School(SchoolId),
    Homework(HomeworkId),
    // 按天的提交与成绩趋势
    ClassTrend(ClassId),
    StudentTrend(UserId),
}

impl std::fmt::Display for StatsScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsScope::Class(id) => write!(f, "class:{id}"),
            StatsScope::Student(id) => write!(f, "student:{id}"),
            StatsScope::School(id) => write!(f, "school:{id}"),
            StatsScope::Homework(id) => write!(f, "homework:{id}"),
            StatsScope::ClassTrend(id) => write!(f, "class_trend:{id}"),
            StatsScope::StudentTrend(id) => write!(f, "student_trend:{id}"),
        }
    }
}

/// 各范围共用的提交计数
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SubmissionTotals {
    // 应交数 = 在册学生数 × 作业数
    pub expected_submissions: u64,
    pub submitted_count: u64,
    // 已批阅（Reviewed 或 Graded）的有效提交
    pub completed_count: u64,
    pub pending_count: u64,
    pub reviewed_count: u64,
    pub graded_count: u64,
    pub late_count: u64,
    pub average_grade: Option<f64>,
    // 已交有效提交 / 应交数，百分比，限定在 [0, 100]
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassStats {
    pub class_id: ClassId,
    pub enrolled_students: u64,
    pub homework_count: u64,
    #[serde(flatten)]
    pub totals: SubmissionTotals,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentStats {
    pub student_id: UserId,
    pub class_count: u64,
    pub homework_count: u64,
    #[serde(flatten)]
    pub totals: SubmissionTotals,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchoolStats {
    pub school_id: SchoolId,
    pub class_count: u64,
    pub enrolled_students: u64,
    pub homework_count: u64,
    #[serde(flatten)]
    pub totals: SubmissionTotals,
}

/// 分数区间
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreRange {
    pub range: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HomeworkStats {
    pub homework_id: HomeworkId,
    pub class_id: ClassId,
    pub enrolled_students: u64,
    #[serde(flatten)]
    pub totals: SubmissionTotals,
    pub min_grade: Option<f64>,
    pub max_grade: Option<f64>,
    pub score_distribution: Vec<ScoreRange>,
    pub unsubmitted_students: Vec<UserId>,
}

/// 某一天的提交与评分数量
///
/// 提交按 `submitted_at` 归入当天，评分按 `graded_at` 归入当天，日期为 UTC。
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub submitted_count: u64,
    pub graded_count: u64,
    pub average_grade: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendStats {
    #[serde(flatten)]
    pub totals: SubmissionTotals,
    // 按日期升序，没有活动的日期不出现
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ScopeStats {
    Class(ClassStats),
    Student(StudentStats),
    School(SchoolStats),
    Homework(HomeworkStats),
    ClassTrend(TrendStats),
    StudentTrend(TrendStats),
}

impl ScopeStats {
    pub fn totals(&self) -> &SubmissionTotals {
        match self {
            ScopeStats::Class(stats) => &stats.totals,
            ScopeStats::Student(stats) => &stats.totals,
            ScopeStats::School(stats) => &stats.totals,
            ScopeStats::Homework(stats) => &stats.totals,
            ScopeStats::ClassTrend(stats) | ScopeStats::StudentTrend(stats) => &stats.totals,
        }
    }
}

/// 对外返回的统计快照
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsSnapshot {
    pub scope: StatsScope,
    // 数据对应的时间点
    pub as_of: DateTime<Utc>,
    // 重算失败时返回旧数据并置为 true
    pub stale: bool,
    pub stats: ScopeStats,
}
