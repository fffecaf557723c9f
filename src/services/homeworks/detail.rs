use super::HomeworkCatalog;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    HomeworkId,
    actors::entities::{Actor, ActorRole},
    directory::entities::ClassRoster,
    homeworks::entities::Homework,
};
use crate::services::authz;
use crate::storage::Storage;

/// 班级成员、在册学生的家长、学校校长可以查看班级作业
pub(super) async fn ensure_class_visible(
    storage: &dyn Storage,
    actor: &Actor,
    roster: &ClassRoster,
) -> Result<()> {
    let visible = match actor.role {
        ActorRole::Student => roster.has_student(&actor.id),
        ActorRole::Teacher => roster.has_teacher(&actor.id),
        ActorRole::Principal => authz::is_principal_of(storage, actor, roster).await?,
        ActorRole::Parent => {
            let mut linked = false;
            for student_id in &roster.student_ids {
                if storage.is_parent_of(actor.id, *student_id).await? {
                    linked = true;
                    break;
                }
            }
            linked
        }
    };

    if visible {
        Ok(())
    } else {
        Err(HWSystemError::forbidden(format!(
            "无权查看班级 {} 的作业",
            roster.id
        )))
    }
}

pub async fn get_homework(
    catalog: &HomeworkCatalog,
    actor: &Actor,
    homework_id: HomeworkId,
) -> Result<Homework> {
    let ctx = catalog.ctx();
    let homework = ctx.load_homework(homework_id).await?;
    let roster = ctx.load_class(homework.class_id).await?;
    ensure_class_visible(ctx.storage.as_ref(), actor, &roster).await?;
    Ok(homework)
}
