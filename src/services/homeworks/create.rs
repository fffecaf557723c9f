use tracing::info;
use uuid::Uuid;

use super::HomeworkCatalog;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    actors::entities::Actor,
    homeworks::{entities::Homework, requests::CreateHomeworkRequest},
};
use crate::services::authz;
use crate::utils::validate::validate_title;

pub async fn create_homework(
    catalog: &HomeworkCatalog,
    actor: &Actor,
    req: CreateHomeworkRequest,
) -> Result<Homework> {
    let ctx = catalog.ctx();
    let roster = ctx.load_class(req.class_id).await?;
    authz::ensure_teacher_of_record(actor, &roster)?;

    validate_title(&req.title)?;
    if req.late_policy.penalty_percent > 100 {
        return Err(HWSystemError::out_of_range(format!(
            "迟交扣分比例必须在 0 到 100 之间: {}",
            req.late_policy.penalty_percent
        )));
    }

    let now = ctx.clock.now();
    if req.due_at <= now {
        return Err(HWSystemError::validation("截止时间必须晚于当前时间"));
    }

    let homework = Homework {
        id: Uuid::new_v4(),
        teacher_id: actor.id,
        class_id: roster.id,
        title: req.title.trim().to_string(),
        description: req.description,
        due_at: req.due_at,
        late_policy: req.late_policy,
        created_at: now,
        updated_at: now,
        archived_at: None,
    };
    ctx.storage.insert_homework(homework.clone()).await?;

    info!(
        "Homework {} created by {} for class {} (due {})",
        homework.id, actor.id, homework.class_id, homework.due_at
    );
    Ok(homework)
}
