use serde::Deserialize;
use std::collections::BTreeSet;

use crate::models::{SchoolId, UserId};

/// 同步班级花名册请求
#[derive(Debug, Clone, Deserialize)]
pub struct SyncClassRosterRequest {
    pub school_id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub teacher_ids: BTreeSet<UserId>,
    #[serde(default)]
    pub student_ids: BTreeSet<UserId>,
}
