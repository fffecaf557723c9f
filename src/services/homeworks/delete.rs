use tracing::info;

use super::HomeworkCatalog;
use super::update::ensure_owner;
use crate::errors::Result;
use crate::models::{HomeworkId, actors::entities::Actor, homeworks::responses::HomeworkRemoval};

/// 无提交时物理删除，否则归档
pub async fn delete_homework(
    catalog: &HomeworkCatalog,
    actor: &Actor,
    homework_id: HomeworkId,
) -> Result<HomeworkRemoval> {
    let ctx = catalog.ctx();
    let mut homework = ctx.load_homework(homework_id).await?;
    ensure_owner(actor, &homework)?;

    if ctx.storage.delete_homework(homework_id).await? {
        info!("Homework {} deleted by {}", homework_id, actor.id);
        return Ok(HomeworkRemoval::Deleted);
    }

    if !homework.is_archived() {
        let now = ctx.clock.now();
        homework.archived_at = Some(now);
        homework.updated_at = now;
        ctx.storage.update_homework(homework, false).await?;
        info!(
            "Homework {} has submissions, archived by {}",
            homework_id, actor.id
        );
    }
    Ok(HomeworkRemoval::Archived)
}
