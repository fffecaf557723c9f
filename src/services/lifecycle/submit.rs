use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};
use uuid::Uuid;

use super::LifecycleEngine;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    actors::entities::{Actor, ActorRole},
    directory::entities::ClassRoster,
    events::entities::EventKind,
    homeworks::entities::Homework,
    submissions::{
        entities::{Submission, SubmissionStatus},
        requests::NewSubmission,
    },
};
use crate::services::context::CoreContext;
use crate::storage::{CommitBatch, IdempotencyRecord, SubmissionWrite};
use crate::utils::validate::validate_files;

const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

pub async fn submit(
    engine: &LifecycleEngine,
    actor: &Actor,
    input: NewSubmission,
) -> Result<Submission> {
    let ctx = engine.ctx();

    validate_files(&input.files)?;
    if let Some(key) = &input.idempotency_key
        && (key.trim().is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN)
    {
        return Err(HWSystemError::validation(format!(
            "幂等键长度必须在 1 到 {MAX_IDEMPOTENCY_KEY_LEN} 之间"
        )));
    }

    if !actor.is(ActorRole::Student) || actor.id != input.student_id {
        return Err(HWSystemError::forbidden("只有学生本人可以提交作业"));
    }

    let homework = ctx
        .storage
        .get_homework(input.homework_id)
        .await?
        .filter(|h| !h.is_archived())
        .ok_or_else(|| HWSystemError::not_found(format!("作业不存在: {}", input.homework_id)))?;
    let roster = ctx.load_class(homework.class_id).await?;
    if !roster.has_student(&actor.id) {
        return Err(HWSystemError::forbidden(format!(
            "学生 {} 不在班级 {} 中",
            actor.id, roster.id
        )));
    }

    if let Some(existing) = replay(ctx, &input, &homework).await? {
        return Ok(existing);
    }

    // 同一 (作业, 学生) 同时只处理一个提交；带幂等键的重试等待进行中的提交完成后再查重
    let _slot = match input.idempotency_key {
        Some(_) => ctx.locks.wait_for_draft(homework.id, input.student_id).await?,
        None => ctx.locks.claim_draft(homework.id, input.student_id)?,
    };
    if let Some(existing) = replay(ctx, &input, &homework).await? {
        return Ok(existing);
    }

    ctx.retry
        .run("submit", || submit_once(ctx, actor, &input, &homework, &roster))
        .await
}

/// 幂等键命中时返回最初创建的提交
async fn replay(
    ctx: &CoreContext,
    input: &NewSubmission,
    homework: &Homework,
) -> Result<Option<Submission>> {
    let Some(key) = input.idempotency_key.as_deref() else {
        return Ok(None);
    };
    let Some(submission_id) = ctx
        .storage
        .find_idempotent_submission(input.student_id, key)
        .await?
    else {
        return Ok(None);
    };

    let submission = ctx.load_submission(submission_id).await?;
    if submission.homework_id != homework.id {
        return Err(HWSystemError::validation(format!(
            "幂等键 '{key}' 已用于其他作业"
        )));
    }

    debug!(
        "Idempotent replay for student {} key '{}' -> submission {}",
        input.student_id, key, submission.id
    );
    Ok(Some(submission))
}

fn fresh_submission(input: &NewSubmission, now: DateTime<Utc>, is_late: bool) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        homework_id: input.homework_id,
        student_id: input.student_id,
        files: input.files.clone(),
        status: SubmissionStatus::Pending,
        grade: None,
        effective_grade: None,
        teacher_feedback: None,
        ai_analysis: None,
        is_late,
        is_active: true,
        submitted_at: now,
        reviewed_at: None,
        reviewed_by: None,
        graded_at: None,
        graded_by: None,
        created_at: now,
        updated_at: now,
        version: 0,
        audit_trail: Vec::new(),
    }
}

async fn submit_once(
    ctx: &CoreContext,
    actor: &Actor,
    input: &NewSubmission,
    homework: &Homework,
    roster: &ClassRoster,
) -> Result<Submission> {
    let now = ctx.clock.now();
    let is_late = homework.is_past_due(now);
    if is_late && !homework.late_policy.allow_late {
        return Err(HWSystemError::deadline_passed(format!(
            "作业 {} 已于 {} 截止",
            homework.id, homework.due_at
        )));
    }

    let (_guard, active): (Option<OwnedMutexGuard<()>>, Option<Submission>) = match ctx
        .storage
        .get_active_submission(homework.id, input.student_id)
        .await?
    {
        Some(current) => {
            let guard = ctx.locks.acquire(current.id).await?;
            // 锁内重新读取，期间可能已被评分或替换
            let reloaded = ctx.load_submission(current.id).await?;
            if !reloaded.is_active {
                return Err(HWSystemError::conflict(format!(
                    "提交 {} 已不是有效提交",
                    reloaded.id
                )));
            }
            (Some(guard), Some(reloaded))
        }
        None => (None, None),
    };

    let (target_id, writes) = match active {
        // 评分前重新提交：沿用同一记录
        Some(current) if current.status != SubmissionStatus::Graded => {
            let mut record = current.clone();
            record.files = input.files.clone();
            record.submitted_at = now;
            record.is_late = is_late;
            record.status = SubmissionStatus::Pending;
            record.reviewed_at = None;
            record.reviewed_by = None;
            record.ai_analysis = None;
            record.clear_grade();
            record.updated_at = now;

            (
                current.id,
                vec![SubmissionWrite {
                    record,
                    expected_version: Some(current.version),
                    kind: EventKind::SubmissionUpdated {
                        previous_status: current.status,
                    },
                }],
            )
        }
        // 已评分后再次提交：旧记录转为历史
        Some(current) => {
            let fresh = fresh_submission(input, now, is_late);
            let mut retired = current.clone();
            retired.is_active = false;
            retired.updated_at = now;

            (
                fresh.id,
                vec![
                    SubmissionWrite {
                        record: retired,
                        expected_version: Some(current.version),
                        kind: EventKind::SubmissionSuperseded {
                            superseded_by: fresh.id,
                        },
                    },
                    SubmissionWrite {
                        record: fresh,
                        expected_version: None,
                        kind: EventKind::SubmissionCreated,
                    },
                ],
            )
        }
        None => {
            let fresh = fresh_submission(input, now, is_late);
            (
                fresh.id,
                vec![SubmissionWrite {
                    record: fresh,
                    expected_version: None,
                    kind: EventKind::SubmissionCreated,
                }],
            )
        }
    };

    let batch = CommitBatch {
        homework_id: homework.id,
        class_id: roster.id,
        school_id: roster.school_id,
        actor_id: Some(actor.id),
        occurred_at: now,
        writes,
        idempotency: input
            .idempotency_key
            .as_ref()
            .map(|key| IdempotencyRecord {
                student_id: input.student_id,
                key: key.clone(),
                submission_id: target_id,
            }),
    };
    ctx.commit(batch).await?;

    info!(
        "Student {} submitted homework {} (submission {}, late: {})",
        input.student_id, homework.id, target_id, is_late
    );
    ctx.load_submission(target_id).await
}
