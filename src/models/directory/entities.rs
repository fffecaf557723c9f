use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{ClassId, SchoolId, UserId};

/// 学校信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchoolProfile {
    pub id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub principal_ids: BTreeSet<UserId>,
}

/// 班级花名册（教师与学生名单）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassRoster {
    pub id: ClassId,
    pub school_id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub teacher_ids: BTreeSet<UserId>,
    #[serde(default)]
    pub student_ids: BTreeSet<UserId>,
}

impl ClassRoster {
    pub fn has_teacher(&self, user_id: &UserId) -> bool {
        self.teacher_ids.contains(user_id)
    }

    pub fn has_student(&self, user_id: &UserId) -> bool {
        self.student_ids.contains(user_id)
    }

    pub fn enrolled(&self) -> usize {
        self.student_ids.len()
    }
}

/// 家长与学生的关联
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentLink {
    pub parent_id: UserId,
    pub student_id: UserId,
}

/// 启动时导入的组织架构数据
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySeed {
    pub schools: Vec<SchoolProfile>,
    pub classes: Vec<ClassRoster>,
    pub parents: Vec<ParentLink>,
}
