use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ClassId, HomeworkId, UserId};

/// 迟交策略（作业级配置）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LatePolicy {
    // 是否允许迟交，默认允许（迟交会被标记但仍被接受）
    pub allow_late: bool,
    // 迟交扣分百分比，0 表示不扣分
    pub penalty_percent: u8,
}

impl Default for LatePolicy {
    fn default() -> Self {
        Self {
            allow_late: true,
            penalty_percent: 0,
        }
    }
}

impl LatePolicy {
    /// 计算扣除迟交惩罚后的有效成绩
    pub fn effective_grade(&self, grade: f64, is_late: bool) -> f64 {
        if is_late && self.penalty_percent > 0 {
            grade * f64::from(100 - self.penalty_percent.min(100)) / 100.0
        } else {
            grade
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Homework {
    // 唯一 ID
    pub id: HomeworkId,
    // 布置作业的教师
    pub teacher_id: UserId,
    // 关联的班级 ID
    pub class_id: ClassId,
    // 作业标题
    pub title: String,
    // 作业描述
    pub description: Option<String>,
    // 截止时间
    pub due_at: DateTime<Utc>,
    // 迟交策略
    pub late_policy: LatePolicy,
    // 作业创建时间
    pub created_at: DateTime<Utc>,
    // 作业更新时间
    pub updated_at: DateTime<Utc>,
    // 归档时间（已有提交的作业删除时只归档）
    pub archived_at: Option<DateTime<Utc>>,
}

impl Homework {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        now > self.due_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_grade_applies_penalty_only_when_late() {
        let policy = LatePolicy {
            allow_late: true,
            penalty_percent: 20,
        };
        assert_eq!(policy.effective_grade(90.0, false), 90.0);
        assert_eq!(policy.effective_grade(90.0, true), 72.0);
        assert_eq!(LatePolicy::default().effective_grade(90.0, true), 90.0);
    }
}
