use tracing::info;

use super::HomeworkCatalog;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    HomeworkId,
    actors::entities::{Actor, ActorRole},
    homeworks::{entities::Homework, requests::AmendHomeworkRequest},
};
use crate::utils::validate::validate_title;

/// 只有布置作业的教师可以操作
pub(super) fn ensure_owner(actor: &Actor, homework: &Homework) -> Result<()> {
    if actor.is(ActorRole::Teacher) && actor.id == homework.teacher_id {
        Ok(())
    } else {
        Err(HWSystemError::forbidden("只能操作自己布置的作业"))
    }
}

pub async fn amend_homework(
    catalog: &HomeworkCatalog,
    actor: &Actor,
    homework_id: HomeworkId,
    req: AmendHomeworkRequest,
) -> Result<Homework> {
    let ctx = catalog.ctx();
    let mut homework = ctx.load_homework(homework_id).await?;
    ensure_owner(actor, &homework)?;

    if homework.is_archived() {
        return Err(HWSystemError::invalid_transition("已归档的作业不可修改"));
    }

    let now = ctx.clock.now();
    if let Some(title) = req.title {
        validate_title(&title)?;
        homework.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        homework.description = Some(description);
    }
    if let Some(due_at) = req.due_at {
        if due_at <= now || due_at <= homework.created_at {
            return Err(HWSystemError::validation("截止时间必须晚于当前时间"));
        }
        homework.due_at = due_at;
    }
    if let Some(policy) = req.late_policy {
        if policy.penalty_percent > 100 {
            return Err(HWSystemError::out_of_range(format!(
                "迟交扣分比例必须在 0 到 100 之间: {}",
                policy.penalty_percent
            )));
        }
        homework.late_policy = policy;
    }
    homework.updated_at = now;

    if !ctx.storage.update_homework(homework.clone(), true).await? {
        return Err(HWSystemError::invalid_transition(
            "作业已有提交，不能再修改",
        ));
    }

    info!("Homework {} amended by {}", homework.id, actor.id);
    Ok(homework)
}
