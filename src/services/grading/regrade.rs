use tracing::info;

use super::{FeedbackChange, GradingCoordinator, check_grade_input};
use crate::errors::{HWSystemError, Result};
use crate::models::{
    SubmissionId,
    actors::entities::Actor,
    events::entities::EventKind,
    submissions::entities::{AuditAction, AuditEntry, Submission, SubmissionStatus},
};
use crate::services::authz;

/// 修改已评分提交的成绩，保留审计记录
pub async fn regrade(
    coordinator: &GradingCoordinator,
    actor: &Actor,
    submission_id: SubmissionId,
    score: f64,
    feedback: FeedbackChange,
) -> Result<Submission> {
    check_grade_input(score, feedback.text())?;

    let submission = coordinator
        .ctx()
        .mutate_submission(actor, submission_id, "regrade", |view| {
            authz::ensure_teacher_of_record(actor, &view.roster)?;

            let current = &view.submission;
            if !current.is_active || current.status != SubmissionStatus::Graded {
                return Err(HWSystemError::invalid_transition(format!(
                    "提交 {} 当前为 {}，只能修改已评分的有效提交",
                    current.id, current.status
                )));
            }

            let mut record = current.clone();
            record.audit_trail.push(AuditEntry {
                action: AuditAction::Regraded,
                previous_status: current.status,
                previous_grade: current.grade,
                new_grade: Some(score),
                reason: None,
                changed_by: actor.id,
                changed_at: view.now,
            });
            record.grade = Some(score);
            record.effective_grade = Some(
                view.homework
                    .late_policy
                    .effective_grade(score, current.is_late),
            );
            record.teacher_feedback = feedback.apply(record.teacher_feedback.take());
            record.graded_at = Some(view.now);
            record.graded_by = Some(actor.id);
            Ok((
                record,
                EventKind::SubmissionRegraded {
                    previous_grade: current.grade,
                    grade: score,
                },
            ))
        })
        .await?;

    info!(
        "Submission {} regraded to {} by {}",
        submission.id, score, actor.id
    );
    Ok(submission)
}
