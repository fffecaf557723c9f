use serde::Serialize;

use crate::models::HomeworkId;

/// 删除作业的结果
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HomeworkRemoval {
    // 无任何提交，已物理删除
    Deleted,
    // 已有提交，仅归档
    Archived,
}

#[derive(Debug, Serialize)]
pub struct DeleteHomeworkResponse {
    pub homework_id: HomeworkId,
    pub outcome: HomeworkRemoval,
}
