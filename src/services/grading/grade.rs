use tracing::info;

use super::{GradingCoordinator, check_grade_input};
use crate::errors::{HWSystemError, Result};
use crate::models::{
    SubmissionId,
    actors::entities::Actor,
    events::entities::EventKind,
    submissions::entities::{Submission, SubmissionStatus},
};
use crate::services::authz;

/// Pending | Reviewed -> Graded
pub async fn grade(
    coordinator: &GradingCoordinator,
    actor: &Actor,
    submission_id: SubmissionId,
    score: f64,
    feedback: Option<String>,
) -> Result<Submission> {
    check_grade_input(score, feedback.as_deref())?;

    let submission = coordinator
        .ctx()
        .mutate_submission(actor, submission_id, "grade", |view| {
            authz::ensure_teacher_of_record(actor, &view.roster)?;

            let current = &view.submission;
            if !current.is_active {
                return Err(HWSystemError::invalid_transition(format!(
                    "提交 {} 已被新的提交替换，不能评分",
                    current.id
                )));
            }
            if current.status == SubmissionStatus::Graded {
                return Err(HWSystemError::invalid_transition(format!(
                    "提交 {} 已评分，请使用改分",
                    current.id
                )));
            }

            let mut record = current.clone();
            record.status = SubmissionStatus::Graded;
            record.grade = Some(score);
            record.effective_grade = Some(
                view.homework
                    .late_policy
                    .effective_grade(score, current.is_late),
            );
            record.teacher_feedback = feedback.clone();
            record.graded_at = Some(view.now);
            record.graded_by = Some(actor.id);
            if record.reviewed_at.is_none() {
                record.reviewed_at = Some(view.now);
                record.reviewed_by = Some(actor.id);
            }
            Ok((record, EventKind::SubmissionGraded { grade: score }))
        })
        .await?;

    info!(
        "Submission {} graded {} by {}",
        submission.id, score, actor.id
    );
    Ok(submission)
}
