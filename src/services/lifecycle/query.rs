use std::collections::HashMap;

use super::LifecycleEngine;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    HomeworkId, SubmissionId, UserId, actors::entities::Actor, submissions::entities::Submission,
};
use crate::services::authz;
use crate::storage::SubmissionFilter;

fn present(actor: &Actor, submission: Submission) -> Submission {
    if authz::sees_ai_analysis(actor) {
        submission
    } else {
        submission.redacted()
    }
}

pub async fn get_submission(
    engine: &LifecycleEngine,
    actor: &Actor,
    submission_id: SubmissionId,
) -> Result<Submission> {
    let ctx = engine.ctx();
    let submission = ctx.load_submission(submission_id).await?;
    let homework = ctx.load_homework(submission.homework_id).await?;
    let roster = ctx.load_class(homework.class_id).await?;

    if !authz::can_view_student(ctx.storage.as_ref(), actor, &roster, submission.student_id).await?
    {
        return Err(HWSystemError::forbidden(format!(
            "无权查看提交 {submission_id}"
        )));
    }
    Ok(present(actor, submission))
}

/// 作业下全部有效提交（任课教师、校长）
pub async fn list_homework_submissions(
    engine: &LifecycleEngine,
    actor: &Actor,
    homework_id: HomeworkId,
) -> Result<Vec<Submission>> {
    let ctx = engine.ctx();
    let homework = ctx.load_homework(homework_id).await?;
    let roster = ctx.load_class(homework.class_id).await?;

    if !authz::is_class_staff(ctx.storage.as_ref(), actor, &roster).await? {
        return Err(HWSystemError::forbidden(format!(
            "无权查看作业 {homework_id} 的提交列表"
        )));
    }

    ctx.storage
        .list_submissions(SubmissionFilter {
            homework_id: Some(homework_id),
            student_id: None,
            active_only: true,
        })
        .await
}

/// 学生在某作业下的全部提交记录（含已被替换的历史）
pub async fn submission_history(
    engine: &LifecycleEngine,
    actor: &Actor,
    homework_id: HomeworkId,
    student_id: UserId,
) -> Result<Vec<Submission>> {
    let ctx = engine.ctx();
    let homework = ctx.load_homework(homework_id).await?;
    let roster = ctx.load_class(homework.class_id).await?;

    if !authz::can_view_student(ctx.storage.as_ref(), actor, &roster, student_id).await? {
        return Err(HWSystemError::forbidden(format!(
            "无权查看学生 {student_id} 的提交记录"
        )));
    }

    let history = ctx
        .storage
        .list_submissions(SubmissionFilter {
            homework_id: Some(homework_id),
            student_id: Some(student_id),
            active_only: false,
        })
        .await?;
    Ok(history
        .into_iter()
        .map(|submission| present(actor, submission))
        .collect())
}

/// 学生在所有作业下的提交；教师和校长只能看到自己负责班级的部分
pub async fn list_student_submissions(
    engine: &LifecycleEngine,
    actor: &Actor,
    student_id: UserId,
    active_only: bool,
) -> Result<Vec<Submission>> {
    let ctx = engine.ctx();
    let storage = ctx.storage.as_ref();
    if !authz::can_view_student_anywhere(storage, actor, student_id).await? {
        return Err(HWSystemError::forbidden(format!(
            "无权查看学生 {student_id} 的提交记录"
        )));
    }

    let submissions = storage
        .list_submissions(SubmissionFilter {
            homework_id: None,
            student_id: Some(student_id),
            active_only,
        })
        .await?;

    let mut visible_by_homework: HashMap<HomeworkId, bool> = HashMap::new();
    let mut visible = Vec::with_capacity(submissions.len());
    for submission in submissions {
        let allowed = match visible_by_homework.get(&submission.homework_id) {
            Some(allowed) => *allowed,
            None => {
                let homework = ctx.load_homework(submission.homework_id).await?;
                let roster = ctx.load_class(homework.class_id).await?;
                let allowed = authz::can_view_student(storage, actor, &roster, student_id).await?;
                visible_by_homework.insert(submission.homework_id, allowed);
                allowed
            }
        };
        if allowed {
            visible.push(present(actor, submission));
        }
    }
    Ok(visible)
}
