//! 基于组织架构的访问判定
//!
//! 角色来自令牌，归属关系（任课教师、校长、家长）一律以组织架构为准。

use crate::errors::{HWSystemError, Result};
use crate::models::{
    UserId,
    actors::entities::{Actor, ActorRole},
    directory::entities::ClassRoster,
};
use crate::storage::Storage;

/// 是否为班级的任课教师
pub fn is_teacher_of_record(actor: &Actor, roster: &ClassRoster) -> bool {
    actor.is(ActorRole::Teacher) && roster.has_teacher(&actor.id)
}

pub fn ensure_teacher_of_record(actor: &Actor, roster: &ClassRoster) -> Result<()> {
    if is_teacher_of_record(actor, roster) {
        Ok(())
    } else {
        Err(HWSystemError::forbidden(format!(
            "用户 {} 不是班级 {} 的任课教师",
            actor.id, roster.id
        )))
    }
}

/// 是否为班级所在学校的校长
pub async fn is_principal_of(
    storage: &dyn Storage,
    actor: &Actor,
    roster: &ClassRoster,
) -> Result<bool> {
    if !actor.is(ActorRole::Principal) {
        return Ok(false);
    }
    Ok(storage
        .get_school(roster.school_id)
        .await?
        .is_some_and(|school| school.principal_ids.contains(&actor.id)))
}

/// 任课教师或校长
pub async fn is_class_staff(
    storage: &dyn Storage,
    actor: &Actor,
    roster: &ClassRoster,
) -> Result<bool> {
    Ok(is_teacher_of_record(actor, roster) || is_principal_of(storage, actor, roster).await?)
}

/// 能否查看某学生在该班级的作业数据：学生本人、家长、任课教师、校长
pub async fn can_view_student(
    storage: &dyn Storage,
    actor: &Actor,
    roster: &ClassRoster,
    student_id: UserId,
) -> Result<bool> {
    match actor.role {
        ActorRole::Student => Ok(actor.id == student_id),
        ActorRole::Parent => storage.is_parent_of(actor.id, student_id).await,
        ActorRole::Teacher => Ok(roster.has_teacher(&actor.id)),
        ActorRole::Principal => is_principal_of(storage, actor, roster).await,
    }
}

/// 能否查看某学生：本人、家长，或学生所在任一班级的任课教师、校长
pub async fn can_view_student_anywhere(
    storage: &dyn Storage,
    actor: &Actor,
    student_id: UserId,
) -> Result<bool> {
    match actor.role {
        ActorRole::Student => Ok(actor.id == student_id),
        ActorRole::Parent => storage.is_parent_of(actor.id, student_id).await,
        ActorRole::Teacher | ActorRole::Principal => {
            for roster in storage.list_classes().await? {
                if roster.has_student(&student_id) && is_class_staff(storage, actor, &roster).await?
                {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// AI 分析只对教师和校长可见
pub fn sees_ai_analysis(actor: &Actor) -> bool {
    ActorRole::staff_roles().contains(&&actor.role)
}
