//! 评分协调器
//!
//! 评分与改分在提交锁内串行执行，并发评分同一提交时只有一个会成功。

pub mod grade;
pub mod regrade;

use std::sync::Arc;

use super::context::CoreContext;
use crate::errors::{HWSystemError, Result};
use crate::models::{SubmissionId, actors::entities::Actor, submissions::entities::Submission};
use crate::utils::validate::validate_feedback;

pub struct GradingCoordinator {
    ctx: Arc<CoreContext>,
}

/// 改分时对评语的处理
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackChange {
    Keep,
    Replace(String),
    Clear,
}

impl FeedbackChange {
    /// 由请求字段组合得到；同时要求替换和清除时视为无效请求
    pub fn from_request(feedback: Option<String>, clear: bool) -> Result<Self> {
        match (feedback, clear) {
            (Some(_), true) => Err(HWSystemError::validation(
                "feedback 与 clear_feedback 不能同时设置",
            )),
            (Some(text), false) => Ok(Self::Replace(text)),
            (None, true) => Ok(Self::Clear),
            (None, false) => Ok(Self::Keep),
        }
    }

    fn text(&self) -> Option<&str> {
        match self {
            Self::Replace(text) => Some(text),
            Self::Keep | Self::Clear => None,
        }
    }

    fn apply(&self, current: Option<String>) -> Option<String> {
        match self {
            Self::Keep => current,
            Self::Replace(text) => Some(text.clone()),
            Self::Clear => None,
        }
    }
}

/// 校验分数范围 [0, 100] 与评语长度
pub(crate) fn check_grade_input(score: f64, feedback: Option<&str>) -> Result<()> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(HWSystemError::out_of_range(format!(
            "分数必须在 0 到 100 之间: {score}"
        )));
    }
    validate_feedback(feedback)
}

impl GradingCoordinator {
    pub fn new(ctx: Arc<CoreContext>) -> Self {
        Self { ctx }
    }

    pub(crate) fn ctx(&self) -> &CoreContext {
        &self.ctx
    }

    pub async fn grade(
        &self,
        actor: &Actor,
        submission_id: SubmissionId,
        score: f64,
        feedback: Option<String>,
    ) -> Result<Submission> {
        grade::grade(self, actor, submission_id, score, feedback).await
    }

    pub async fn regrade(
        &self,
        actor: &Actor,
        submission_id: SubmissionId,
        score: f64,
        feedback: FeedbackChange,
    ) -> Result<Submission> {
        regrade::regrade(self, actor, submission_id, score, feedback).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::{
        homeworks::entities::LatePolicy,
        submissions::entities::{AuditAction, SubmissionStatus},
    };
    use crate::services::test_support::Fixture;

    #[tokio::test]
    async fn test_grade_then_second_grade_is_rejected() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();

        let graded = fx
            .services
            .grading
            .grade(&fx.teacher, submission.id, 92.0, Some("Great work".to_string()))
            .await
            .unwrap();
        assert_eq!(graded.status, SubmissionStatus::Graded);
        assert_eq!(graded.grade, Some(92.0));
        assert_eq!(graded.effective_grade, Some(92.0));
        assert_eq!(graded.teacher_feedback.as_deref(), Some("Great work"));
        assert_eq!(graded.graded_by, Some(fx.teacher.id));
        assert!(graded.reviewed_at.is_some());
        assert!(graded.is_consistent());

        let err = fx
            .services
            .grading
            .grade(&fx.teacher, submission.id, 95.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_grade_outside_range_is_rejected() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();

        for score in [-1.0, 100.5, f64::NAN] {
            let err = fx
                .services
                .grading
                .grade(&fx.teacher, submission.id, score, None)
                .await
                .unwrap_err();
            assert!(matches!(err, HWSystemError::OutOfRange(_)));
        }
    }

    #[tokio::test]
    async fn test_only_teacher_of_record_may_grade() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();

        for actor in [&fx.other_teacher, &fx.principal, &fx.students[0]] {
            let err = fx
                .services
                .grading
                .grade(actor, submission.id, 80.0, None)
                .await
                .unwrap_err();
            assert!(matches!(err, HWSystemError::Forbidden(_)));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_grades_yield_single_success() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();

        let grading = &fx.services.grading;
        let (a, b) = tokio::join!(
            grading.grade(&fx.teacher, submission.id, 70.0, None),
            grading.grade(&fx.teacher, submission.id, 90.0, None),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(HWSystemError::InvalidTransition(_))
        )));
        assert_eq!(
            fx.sink
                .kinds()
                .iter()
                .filter(|k| **k == "submission_graded")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_regrade_keeps_audit_entry() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();

        let err = fx
            .services
            .grading
            .regrade(&fx.teacher, submission.id, 80.0, FeedbackChange::Keep)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::InvalidTransition(_)));

        fx.services
            .grading
            .grade(&fx.teacher, submission.id, 72.0, Some("初评".to_string()))
            .await
            .unwrap();
        let regraded = fx
            .services
            .grading
            .regrade(&fx.teacher, submission.id, 81.0, FeedbackChange::Keep)
            .await
            .unwrap();

        assert_eq!(regraded.grade, Some(81.0));
        assert_eq!(regraded.teacher_feedback.as_deref(), Some("初评"));
        assert_eq!(regraded.audit_trail.len(), 1);
        let entry = &regraded.audit_trail[0];
        assert_eq!(entry.action, AuditAction::Regraded);
        assert_eq!(entry.previous_grade, Some(72.0));
        assert_eq!(entry.new_grade, Some(81.0));
    }

    #[tokio::test]
    async fn test_late_penalty_applies_to_effective_grade() {
        let fx = Fixture::new(2).await;
        let homework = fx
            .homework(
                Duration::hours(1),
                LatePolicy {
                    allow_late: true,
                    penalty_percent: 10,
                },
            )
            .await;
        let on_time = fx.submit(&homework, 0).await.unwrap();
        fx.clock.advance(Duration::hours(3));
        let late = fx.submit(&homework, 1).await.unwrap();

        let on_time = fx
            .services
            .grading
            .grade(&fx.teacher, on_time.id, 90.0, None)
            .await
            .unwrap();
        let late = fx
            .services
            .grading
            .grade(&fx.teacher, late.id, 90.0, None)
            .await
            .unwrap();

        assert_eq!(on_time.effective_grade, Some(90.0));
        assert_eq!(late.grade, Some(90.0));
        assert_eq!(late.effective_grade, Some(81.0));
    }

    #[tokio::test]
    async fn test_regrade_can_replace_or_clear_feedback() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();
        let grading = &fx.services.grading;
        grading
            .grade(&fx.teacher, submission.id, 70.0, Some("初评".to_string()))
            .await
            .unwrap();

        let replaced = grading
            .regrade(
                &fx.teacher,
                submission.id,
                75.0,
                FeedbackChange::Replace("复核后加分".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(replaced.teacher_feedback.as_deref(), Some("复核后加分"));

        let cleared = grading
            .regrade(&fx.teacher, submission.id, 76.0, FeedbackChange::Clear)
            .await
            .unwrap();
        assert_eq!(cleared.teacher_feedback, None);
        assert_eq!(cleared.grade, Some(76.0));
        assert_eq!(cleared.audit_trail.len(), 2);
    }

    #[test]
    fn test_feedback_change_from_request() {
        assert_eq!(
            FeedbackChange::from_request(None, false).unwrap(),
            FeedbackChange::Keep
        );
        assert_eq!(
            FeedbackChange::from_request(None, true).unwrap(),
            FeedbackChange::Clear
        );
        assert_eq!(
            FeedbackChange::from_request(Some("ok".to_string()), false).unwrap(),
            FeedbackChange::Replace("ok".to_string())
        );
        assert!(matches!(
            FeedbackChange::from_request(Some("ok".to_string()), true),
            Err(HWSystemError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_grading_locked_submission_times_out_without_writing() {
        use crate::storage::Storage;

        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();

        let _held = fx
            .services
            .grading
            .ctx()
            .locks
            .acquire(submission.id)
            .await
            .unwrap();
        let err = fx
            .services
            .grading
            .grade(&fx.teacher, submission.id, 88.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Timeout(_)));

        assert_eq!(fx.sink.kinds(), vec!["submission_created"]);
        let stored = fx
            .storage
            .get_submission(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Pending);
        assert_eq!(stored.version, submission.version);
    }
}
