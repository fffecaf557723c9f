use tracing::info;

use super::LifecycleEngine;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    SubmissionId,
    actors::entities::Actor,
    events::entities::EventKind,
    submissions::entities::{AuditAction, AuditEntry, Submission, SubmissionStatus},
};
use crate::services::authz;
use crate::utils::validate::validate_reason;

/// 要求学生重交：Reviewed | Graded -> Pending，清除成绩并记录审计
pub async fn request_resubmission(
    engine: &LifecycleEngine,
    actor: &Actor,
    submission_id: SubmissionId,
    reason: &str,
) -> Result<Submission> {
    validate_reason(reason)?;
    let reason = reason.trim().to_string();

    let submission = engine
        .ctx()
        .mutate_submission(actor, submission_id, "request_resubmission", |view| {
            authz::ensure_teacher_of_record(actor, &view.roster)?;

            let current = &view.submission;
            if !current.is_active || current.status == SubmissionStatus::Pending {
                return Err(HWSystemError::invalid_transition(format!(
                    "提交 {} 当前为 {}，不能要求重交",
                    current.id, current.status
                )));
            }

            let mut record = current.clone();
            record.audit_trail.push(AuditEntry {
                action: AuditAction::ResubmissionRequested,
                previous_status: current.status,
                previous_grade: current.grade,
                new_grade: None,
                reason: Some(reason.clone()),
                changed_by: actor.id,
                changed_at: view.now,
            });
            record.clear_grade();
            record.status = SubmissionStatus::Pending;
            record.reviewed_at = None;
            record.reviewed_by = None;
            Ok((
                record,
                EventKind::SubmissionStatusChanged {
                    from: current.status,
                    to: SubmissionStatus::Pending,
                },
            ))
        })
        .await?;

    info!(
        "Resubmission requested for {} by {}",
        submission.id, actor.id
    );
    Ok(submission)
}
