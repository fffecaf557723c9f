//! 提交生命周期引擎
//!
//! 状态机：`Pending -> Reviewed -> Graded`；`Reviewed | Graded -> Pending` 只能通过要求重交；
//! 已评分后再次提交会生成新的有效提交，旧记录保留为历史。

pub mod analysis;
pub mod query;
pub mod resubmit;
pub mod review;
pub mod submit;
pub mod sweep;

use std::sync::Arc;

use super::context::CoreContext;
use crate::errors::Result;
use crate::models::{
    HomeworkId, SubmissionId, UserId,
    actors::entities::Actor,
    submissions::{
        entities::{AiAnalysis, Submission},
        requests::NewSubmission,
    },
};

pub struct LifecycleEngine {
    ctx: Arc<CoreContext>,
}

impl LifecycleEngine {
    pub fn new(ctx: Arc<CoreContext>) -> Self {
        Self { ctx }
    }

    pub(crate) fn ctx(&self) -> &CoreContext {
        &self.ctx
    }

    pub async fn submit(&self, actor: &Actor, input: NewSubmission) -> Result<Submission> {
        submit::submit(self, actor, input).await
    }

    pub async fn mark_reviewed(
        &self,
        actor: &Actor,
        submission_id: SubmissionId,
    ) -> Result<Submission> {
        review::mark_reviewed(self, actor, submission_id).await
    }

    pub async fn request_resubmission(
        &self,
        actor: &Actor,
        submission_id: SubmissionId,
        reason: &str,
    ) -> Result<Submission> {
        resubmit::request_resubmission(self, actor, submission_id, reason).await
    }

    pub async fn attach_ai_analysis(
        &self,
        actor: &Actor,
        submission_id: SubmissionId,
        analysis: AiAnalysis,
    ) -> Result<Submission> {
        analysis::attach_ai_analysis(self, actor, submission_id, analysis).await
    }

    pub async fn sweep_auto_review(&self) -> Result<usize> {
        sweep::sweep_auto_review(self).await
    }

    /// 清理无人持有的提交锁
    pub fn prune_idle_locks(&self) -> usize {
        self.ctx.locks.prune()
    }

    pub async fn get_submission(
        &self,
        actor: &Actor,
        submission_id: SubmissionId,
    ) -> Result<Submission> {
        query::get_submission(self, actor, submission_id).await
    }

    pub async fn list_homework_submissions(
        &self,
        actor: &Actor,
        homework_id: HomeworkId,
    ) -> Result<Vec<Submission>> {
        query::list_homework_submissions(self, actor, homework_id).await
    }

    pub async fn submission_history(
        &self,
        actor: &Actor,
        homework_id: HomeworkId,
        student_id: UserId,
    ) -> Result<Vec<Submission>> {
        query::submission_history(self, actor, homework_id, student_id).await
    }

    pub async fn list_student_submissions(
        &self,
        actor: &Actor,
        student_id: UserId,
        active_only: bool,
    ) -> Result<Vec<Submission>> {
        query::list_student_submissions(self, actor, student_id, active_only).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::errors::HWSystemError;
    use crate::models::{
        homeworks::entities::LatePolicy,
        submissions::entities::{AiAnalysis, AuditAction, SubmissionStatus},
    };
    use crate::services::test_support::Fixture;
    use crate::storage::{Storage, SubmissionFilter};

    fn analysis(at: chrono::DateTime<Utc>) -> AiAnalysis {
        AiAnalysis {
            completeness_score: Some(80.0),
            clarity_score: Some(75.0),
            accuracy_score: Some(90.0),
            estimated_grade: Some(85.0),
            confidence: Some(0.7),
            suggestions: vec!["检查第三题的单位".to_string()],
            detected_issues: Vec::new(),
            analyzed_at: at,
        }
    }

    #[tokio::test]
    async fn test_submit_after_deadline_is_rejected_when_late_not_allowed() {
        let fx = Fixture::new(1).await;
        fx.clock.set(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
        let due = Utc.with_ymd_and_hms(2024, 1, 10, 23, 59, 0).unwrap();
        let homework = fx
            .homework(
                due - fx.now(),
                LatePolicy {
                    allow_late: false,
                    penalty_percent: 0,
                },
            )
            .await;

        fx.clock.set(Utc.with_ymd_and_hms(2024, 1, 11, 0, 1, 0).unwrap());
        let err = fx.submit(&homework, 0).await.unwrap_err();
        assert!(matches!(err, HWSystemError::DeadlinePassed(_)));
        assert_eq!(fx.storage.count_submissions(homework.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_late_submission_is_flagged_when_allowed() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::hours(1), LatePolicy::default()).await;

        fx.clock.advance(Duration::hours(2));
        let submission = fx.submit(&homework, 0).await.unwrap();
        assert!(submission.is_late);
        assert_eq!(submission.status, SubmissionStatus::Pending);
        assert!(submission.is_active);
    }

    #[tokio::test]
    async fn test_submit_with_same_key_returns_same_submission() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;

        let first = fx
            .submit_with_key(&homework, 0, Some("upload-1"))
            .await
            .unwrap();
        let second = fx
            .submit_with_key(&homework, 0, Some("upload-1"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.version, first.version);
        assert_eq!(fx.storage.count_submissions(homework.id).await.unwrap(), 1);
        assert_eq!(fx.sink.kinds(), vec!["submission_created"]);

        let other = fx.homework(Duration::days(2), LatePolicy::default()).await;
        let err = fx
            .submit_with_key(&other, 0, Some("upload-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resubmit_before_grading_updates_in_place() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::hours(1), LatePolicy::default()).await;

        let first = fx.submit(&homework, 0).await.unwrap();
        assert!(!first.is_late);

        fx.clock.advance(Duration::hours(2));
        let second = fx.submit(&homework, 0).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.is_late);
        assert!(second.version > first.version);
        assert_eq!(fx.storage.count_submissions(homework.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resubmit_after_grading_supersedes_previous_record() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;

        let first = fx.submit(&homework, 0).await.unwrap();
        fx.services
            .grading
            .grade(&fx.teacher, first.id, 60.0, None)
            .await
            .unwrap();

        let second = fx.submit(&homework, 0).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.status, SubmissionStatus::Pending);

        let all = fx
            .storage
            .list_submissions(SubmissionFilter {
                homework_id: Some(homework.id),
                student_id: Some(fx.students[0].id),
                active_only: false,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|s| s.is_active).count(), 1);

        let retired = all.iter().find(|s| s.id == first.id).unwrap();
        assert!(!retired.is_active);
        assert_eq!(retired.grade, Some(60.0));

        let history = fx
            .services
            .lifecycle
            .submission_history(&fx.students[0], homework.id, fx.students[0].id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_only_enrolled_student_may_submit_for_self() {
        let fx = Fixture::new(2).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;

        let outsider = crate::models::actors::entities::Actor::new(
            uuid::Uuid::new_v4(),
            crate::models::actors::entities::ActorRole::Student,
        );
        let err = fx
            .services
            .lifecycle
            .submit(
                &outsider,
                crate::models::submissions::requests::NewSubmission {
                    homework_id: homework.id,
                    student_id: outsider.id,
                    files: crate::services::test_support::files("outsider"),
                    idempotency_key: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Forbidden(_)));

        // 替别人提交
        let err = fx
            .services
            .lifecycle
            .submit(
                &fx.students[0],
                crate::models::submissions::requests::NewSubmission {
                    homework_id: homework.id,
                    student_id: fx.students[1].id,
                    files: crate::services::test_support::files("proxy"),
                    idempotency_key: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_request_resubmission_on_graded_submission_clears_grade() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();
        fx.services
            .grading
            .grade(&fx.teacher, submission.id, 78.0, Some("再检查一下".to_string()))
            .await
            .unwrap();

        let reopened = fx
            .services
            .lifecycle
            .request_resubmission(&fx.teacher, submission.id, "第二题步骤缺失")
            .await
            .unwrap();
        assert_eq!(reopened.status, SubmissionStatus::Pending);
        assert_eq!(reopened.grade, None);
        assert_eq!(reopened.effective_grade, None);
        assert!(reopened.is_consistent());
        assert_eq!(reopened.audit_trail.len(), 1);

        let entry = &reopened.audit_trail[0];
        assert_eq!(entry.action, AuditAction::ResubmissionRequested);
        assert_eq!(entry.previous_status, SubmissionStatus::Graded);
        assert_eq!(entry.previous_grade, Some(78.0));
        assert_eq!(entry.reason.as_deref(), Some("第二题步骤缺失"));
    }

    #[tokio::test]
    async fn test_pending_submission_cannot_be_sent_back() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();

        let err = fx
            .services
            .lifecycle
            .request_resubmission(&fx.teacher, submission.id, "重做")
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_mark_reviewed_requires_teacher_of_record() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();

        let err = fx
            .services
            .lifecycle
            .mark_reviewed(&fx.other_teacher, submission.id)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Forbidden(_)));

        let reviewed = fx
            .services
            .lifecycle
            .mark_reviewed(&fx.teacher, submission.id)
            .await
            .unwrap();
        assert_eq!(reviewed.status, SubmissionStatus::Reviewed);
        assert_eq!(reviewed.reviewed_by, Some(fx.teacher.id));

        let err = fx
            .services
            .lifecycle
            .mark_reviewed(&fx.teacher, submission.id)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_sweep_reviews_analyzed_submissions_after_deadline() {
        let fx = Fixture::new(3).await;
        let homework = fx.homework(Duration::hours(1), LatePolicy::default()).await;

        let analyzed = fx.submit(&homework, 0).await.unwrap();
        let busy = fx.submit(&homework, 1).await.unwrap();
        let plain = fx.submit(&homework, 2).await.unwrap();
        for id in [analyzed.id, busy.id] {
            fx.services
                .lifecycle
                .attach_ai_analysis(&fx.teacher, id, analysis(fx.now()))
                .await
                .unwrap();
        }

        // 截止前不处理
        assert_eq!(fx.services.lifecycle.sweep_auto_review().await.unwrap(), 0);

        fx.clock.advance(Duration::hours(2));
        let guard = fx.services.lifecycle.ctx().locks.acquire(busy.id).await.unwrap();
        assert_eq!(fx.services.lifecycle.sweep_auto_review().await.unwrap(), 1);
        drop(guard);

        let storage = &fx.storage;
        let analyzed = storage.get_submission(analyzed.id).await.unwrap().unwrap();
        assert_eq!(analyzed.status, SubmissionStatus::Reviewed);
        assert_eq!(analyzed.reviewed_by, None);
        let busy_now = storage.get_submission(busy.id).await.unwrap().unwrap();
        assert_eq!(busy_now.status, SubmissionStatus::Pending);
        let plain = storage.get_submission(plain.id).await.unwrap().unwrap();
        assert_eq!(plain.status, SubmissionStatus::Pending);

        // 锁释放后下一轮补上
        assert_eq!(fx.services.lifecycle.sweep_auto_review().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ai_analysis_is_hidden_from_students_and_parents() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();
        fx.services
            .lifecycle
            .attach_ai_analysis(&fx.teacher, submission.id, analysis(fx.now()))
            .await
            .unwrap();

        let lifecycle = &fx.services.lifecycle;
        for viewer in [&fx.students[0], &fx.parent] {
            let seen = lifecycle.get_submission(viewer, submission.id).await.unwrap();
            assert!(seen.ai_analysis.is_none());
        }
        for viewer in [&fx.teacher, &fx.principal] {
            let seen = lifecycle.get_submission(viewer, submission.id).await.unwrap();
            assert!(seen.ai_analysis.is_some());
        }

        let err = lifecycle
            .get_submission(&fx.other_teacher, submission.id)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_analysis_scores_are_range_checked() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();

        let mut bad = analysis(fx.now());
        bad.confidence = Some(1.5);
        let err = fx
            .services
            .lifecycle
            .attach_ai_analysis(&fx.teacher, submission.id, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::OutOfRange(_)));
    }

    #[tokio::test]
    async fn test_busy_draft_slot_rejects_submit_without_writing() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let _slot = fx
            .services
            .lifecycle
            .ctx()
            .locks
            .claim_draft(homework.id, fx.students[0].id)
            .unwrap();

        let err = fx.submit(&homework, 0).await.unwrap_err();
        assert!(matches!(err, HWSystemError::DuplicateActiveSubmission(_)));

        // 带幂等键时会等待，但等不到槽位仍然拒绝
        let err = fx
            .submit_with_key(&homework, 0, Some("stuck"))
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::DuplicateActiveSubmission(_)));

        assert_eq!(fx.storage.count_submissions(homework.id).await.unwrap(), 0);
        assert!(fx.sink.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_keyed_retry_waits_for_in_flight_submit() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let slot = fx
            .services
            .lifecycle
            .ctx()
            .locks
            .claim_draft(homework.id, fx.students[0].id)
            .unwrap();

        let (retry, original) = tokio::join!(
            fx.submit_with_key(&homework, 0, Some("upload-7")),
            async {
                tokio::time::sleep(std::time::Duration::from_millis(30)).await;
                drop(slot);
                fx.submit_with_key(&homework, 0, Some("upload-7")).await
            }
        );

        assert_eq!(retry.unwrap().id, original.unwrap().id);
        assert_eq!(fx.storage.count_submissions(homework.id).await.unwrap(), 1);
        assert_eq!(fx.sink.kinds(), vec!["submission_created"]);
    }

    #[tokio::test]
    async fn test_request_resubmission_clears_review_marks() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&homework, 0).await.unwrap();
        let reviewed = fx
            .services
            .lifecycle
            .mark_reviewed(&fx.teacher, submission.id)
            .await
            .unwrap();
        assert!(reviewed.reviewed_at.is_some());

        let reopened = fx
            .services
            .lifecycle
            .request_resubmission(&fx.teacher, submission.id, "附件无法打开")
            .await
            .unwrap();
        assert_eq!(reopened.status, SubmissionStatus::Pending);
        assert_eq!(reopened.reviewed_at, None);
        assert_eq!(reopened.reviewed_by, None);
    }

    #[tokio::test]
    async fn test_student_submissions_across_homeworks_follow_class_visibility() {
        use std::collections::BTreeSet;

        use crate::models::{
            directory::entities::ClassRoster, homeworks::requests::CreateHomeworkRequest,
        };

        let fx = Fixture::new(2).await;
        let art_class = ClassRoster {
            id: uuid::Uuid::new_v4(),
            school_id: fx.school_id,
            name: "Art club".to_string(),
            teacher_ids: BTreeSet::from([fx.other_teacher.id]),
            student_ids: BTreeSet::from([fx.students[0].id]),
        };
        fx.storage.upsert_class(art_class.clone()).await.unwrap();

        let math = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let art = fx
            .services
            .homeworks
            .create_homework(
                &fx.other_teacher,
                CreateHomeworkRequest {
                    class_id: art_class.id,
                    title: "Still life sketch".to_string(),
                    description: None,
                    due_at: fx.now() + Duration::days(2),
                    late_policy: LatePolicy::default(),
                },
            )
            .await
            .unwrap();
        let math_sub = fx.submit(&math, 0).await.unwrap();
        let art_sub = fx.submit(&art, 0).await.unwrap();
        fx.services
            .lifecycle
            .attach_ai_analysis(&fx.teacher, math_sub.id, analysis(fx.now()))
            .await
            .unwrap();

        let lifecycle = &fx.services.lifecycle;
        let student_id = fx.students[0].id;
        let ids = |items: &[crate::models::submissions::entities::Submission]| {
            items.iter().map(|s| s.id).collect::<BTreeSet<_>>()
        };

        for viewer in [&fx.students[0], &fx.parent] {
            let items = lifecycle
                .list_student_submissions(viewer, student_id, true)
                .await
                .unwrap();
            assert_eq!(ids(&items[..]), BTreeSet::from([math_sub.id, art_sub.id]));
            assert!(items.iter().all(|s| s.ai_analysis.is_none()));
        }

        let items = lifecycle
            .list_student_submissions(&fx.principal, student_id, true)
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert!(
            items
                .iter()
                .any(|s| s.id == math_sub.id && s.ai_analysis.is_some())
        );

        let items = lifecycle
            .list_student_submissions(&fx.teacher, student_id, true)
            .await
            .unwrap();
        assert_eq!(ids(&items[..]), BTreeSet::from([math_sub.id]));
        let items = lifecycle
            .list_student_submissions(&fx.other_teacher, student_id, true)
            .await
            .unwrap();
        assert_eq!(ids(&items[..]), BTreeSet::from([art_sub.id]));

        let err = lifecycle
            .list_student_submissions(&fx.students[1], student_id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Forbidden(_)));

        // 评分后重交，历史记录只在 active_only = false 时返回
        fx.services
            .grading
            .grade(&fx.teacher, math_sub.id, 88.0, None)
            .await
            .unwrap();
        fx.submit(&math, 0).await.unwrap();
        let active = lifecycle
            .list_student_submissions(&fx.students[0], student_id, true)
            .await
            .unwrap();
        let all = lifecycle
            .list_student_submissions(&fx.students[0], student_id, false)
            .await
            .unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(all.len(), 3);
    }
}
