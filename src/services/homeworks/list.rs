use super::HomeworkCatalog;
use super::detail::ensure_class_visible;
use crate::errors::Result;
use crate::models::{ClassId, actors::entities::Actor, homeworks::entities::Homework};

/// 列出班级未归档的作业，按截止时间排序
pub async fn list_class_homeworks(
    catalog: &HomeworkCatalog,
    actor: &Actor,
    class_id: ClassId,
) -> Result<Vec<Homework>> {
    let ctx = catalog.ctx();
    let roster = ctx.load_class(class_id).await?;
    ensure_class_visible(ctx.storage.as_ref(), actor, &roster).await?;

    let mut homeworks: Vec<Homework> = ctx
        .storage
        .list_homeworks()
        .await?
        .into_iter()
        .filter(|h| h.class_id == class_id && !h.is_archived())
        .collect();
    homeworks.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.id.cmp(&b.id)));
    Ok(homeworks)
}
