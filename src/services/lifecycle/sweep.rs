use tracing::{debug, info, warn};

use super::LifecycleEngine;
use crate::errors::Result;
use crate::models::{
    events::entities::EventKind,
    submissions::entities::{Submission, SubmissionStatus},
};
use crate::storage::{CommitBatch, SubmissionFilter, SubmissionWrite};

fn eligible(submission: &Submission) -> bool {
    submission.is_active
        && submission.status == SubmissionStatus::Pending
        && submission.ai_analysis.is_some()
}

/// 定时扫描：截止后仍待批阅、且已有 AI 分析的有效提交自动转为 Reviewed
///
/// 人工操作优先：提交锁被占用时跳过，提交前再核对版本和状态。
pub async fn sweep_auto_review(engine: &LifecycleEngine) -> Result<usize> {
    let ctx = engine.ctx();
    let now = ctx.clock.now();
    let mut reviewed = 0;

    let homeworks = ctx.storage.list_homeworks().await?;
    for homework in homeworks
        .iter()
        .filter(|h| !h.is_archived() && h.is_past_due(now))
    {
        let Some(roster) = ctx.storage.get_class(homework.class_id).await? else {
            warn!(
                "Homework {} references unknown class {}, skipping sweep",
                homework.id, homework.class_id
            );
            continue;
        };

        let candidates = ctx
            .storage
            .list_submissions(SubmissionFilter {
                homework_id: Some(homework.id),
                student_id: None,
                active_only: true,
            })
            .await?;

        for candidate in candidates.into_iter().filter(eligible) {
            let Some(_guard) = ctx.locks.try_acquire(candidate.id) else {
                debug!("Submission {} is busy, sweep skipped it", candidate.id);
                continue;
            };

            let Some(current) = ctx.storage.get_submission(candidate.id).await? else {
                continue;
            };
            if current.version != candidate.version || !eligible(&current) {
                debug!("Submission {} changed before sweep commit", current.id);
                continue;
            }

            let mut record = current.clone();
            record.status = SubmissionStatus::Reviewed;
            record.reviewed_at = Some(now);
            record.updated_at = now;

            let batch = CommitBatch {
                homework_id: homework.id,
                class_id: roster.id,
                school_id: roster.school_id,
                actor_id: None,
                occurred_at: now,
                writes: vec![SubmissionWrite {
                    record,
                    expected_version: Some(current.version),
                    kind: EventKind::SubmissionStatusChanged {
                        from: SubmissionStatus::Pending,
                        to: SubmissionStatus::Reviewed,
                    },
                }],
                idempotency: None,
            };

            match ctx.commit(batch).await {
                Ok(_) => reviewed += 1,
                Err(e) if e.is_retryable() => {
                    debug!("Sweep lost race on submission {}: {}", current.id, e);
                }
                Err(e) => {
                    warn!("Sweep failed to review submission {}: {}", current.id, e);
                }
            }
        }
    }

    if reviewed > 0 {
        info!("Auto-review sweep moved {} submissions to reviewed", reviewed);
    }
    Ok(reviewed)
}
