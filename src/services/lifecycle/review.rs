use tracing::info;

use super::LifecycleEngine;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    SubmissionId,
    actors::entities::Actor,
    events::entities::EventKind,
    submissions::entities::{Submission, SubmissionStatus},
};
use crate::services::authz;

/// 教师查看提交：Pending -> Reviewed
pub async fn mark_reviewed(
    engine: &LifecycleEngine,
    actor: &Actor,
    submission_id: SubmissionId,
) -> Result<Submission> {
    let submission = engine
        .ctx()
        .mutate_submission(actor, submission_id, "mark_reviewed", |view| {
            authz::ensure_teacher_of_record(actor, &view.roster)?;

            let current = &view.submission;
            if !current.is_active || current.status != SubmissionStatus::Pending {
                return Err(HWSystemError::invalid_transition(format!(
                    "提交 {} 当前为 {}{}，不能标记为已查看",
                    current.id,
                    current.status,
                    if current.is_active { "" } else { "（历史记录）" }
                )));
            }

            let mut record = current.clone();
            record.status = SubmissionStatus::Reviewed;
            record.reviewed_at = Some(view.now);
            record.reviewed_by = Some(actor.id);
            Ok((
                record,
                EventKind::SubmissionStatusChanged {
                    from: SubmissionStatus::Pending,
                    to: SubmissionStatus::Reviewed,
                },
            ))
        })
        .await?;

    info!("Submission {} reviewed by {}", submission.id, actor.id);
    Ok(submission)
}
