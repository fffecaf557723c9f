//! 组织架构（学校、班级花名册、家长关联）
//!
//! 数据由身份提供方给出：启动时从种子文件导入，之后由校长同步班级花名册。

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::{HWSystemError, Result};
use crate::models::{
    ClassId, SchoolId,
    actors::entities::{Actor, ActorRole},
    directory::{
        entities::{ClassRoster, DirectorySeed},
        requests::SyncClassRosterRequest,
    },
};
use crate::storage::Storage;

/// 导入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub schools: usize,
    pub classes: usize,
    pub parents: usize,
}

pub struct DirectoryService {
    storage: Arc<dyn Storage>,
}

impl DirectoryService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn seed(&self, seed: DirectorySeed) -> Result<SeedSummary> {
        let summary = SeedSummary {
            schools: seed.schools.len(),
            classes: seed.classes.len(),
            parents: seed.parents.len(),
        };

        for school in seed.schools {
            self.storage.upsert_school(school).await?;
        }
        for roster in seed.classes {
            if self.storage.get_school(roster.school_id).await?.is_none() {
                warn!(
                    "Class {} references unknown school {}",
                    roster.id, roster.school_id
                );
            }
            self.storage.upsert_class(roster).await?;
        }
        for link in seed.parents {
            self.storage.link_parent(link).await?;
        }

        Ok(summary)
    }

    /// 从 JSON 种子文件导入
    pub async fn seed_from_file(&self, path: impl AsRef<Path>) -> Result<SeedSummary> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HWSystemError::configuration(format!(
                "无法读取组织架构文件 {}: {e}",
                path.display()
            ))
        })?;
        let seed: DirectorySeed = serde_json::from_str(&content)?;
        let summary = self.seed(seed).await?;

        info!(
            "Directory seeded from {}: {} schools, {} classes, {} parent links",
            path.display(),
            summary.schools,
            summary.classes,
            summary.parents
        );
        Ok(summary)
    }

    async fn ensure_principal(&self, actor: &Actor, school_id: SchoolId) -> Result<()> {
        let school = self
            .storage
            .get_school(school_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("学校不存在: {school_id}")))?;

        if actor.is(ActorRole::Principal) && school.principal_ids.contains(&actor.id) {
            Ok(())
        } else {
            Err(HWSystemError::forbidden(format!(
                "只有学校 {school_id} 的校长可以维护班级花名册"
            )))
        }
    }

    /// 覆盖班级花名册（校长）
    pub async fn sync_class_roster(
        &self,
        actor: &Actor,
        class_id: ClassId,
        req: SyncClassRosterRequest,
    ) -> Result<ClassRoster> {
        self.ensure_principal(actor, req.school_id).await?;

        // 班级换校时，原学校的校长也必须是当前操作者
        if let Some(existing) = self.storage.get_class(class_id).await?
            && existing.school_id != req.school_id
        {
            self.ensure_principal(actor, existing.school_id).await?;
        }

        if req.name.trim().is_empty() {
            return Err(HWSystemError::validation("班级名称不能为空"));
        }

        let roster = ClassRoster {
            id: class_id,
            school_id: req.school_id,
            name: req.name.trim().to_string(),
            teacher_ids: req.teacher_ids,
            student_ids: req.student_ids,
        };
        self.storage.upsert_class(roster.clone()).await?;

        info!(
            "Class roster {} synced by {}: {} teachers, {} students",
            roster.id,
            actor.id,
            roster.teacher_ids.len(),
            roster.student_ids.len()
        );
        Ok(roster)
    }
}
