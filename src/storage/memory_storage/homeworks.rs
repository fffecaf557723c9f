//! 作业存储操作

use super::MemoryStorage;
use crate::errors::{HWSystemError, Result};
use crate::models::{HomeworkId, homeworks::entities::Homework};

impl MemoryStorage {
    pub(super) fn insert_homework_impl(&self, homework: Homework) -> Result<()> {
        if self.homeworks.contains_key(&homework.id) {
            return Err(HWSystemError::conflict(format!(
                "作业已存在: {}",
                homework.id
            )));
        }
        self.homeworks.insert(homework.id, homework);
        Ok(())
    }

    pub(super) fn get_homework_impl(&self, homework_id: HomeworkId) -> Result<Option<Homework>> {
        Ok(self.homeworks.get(&homework_id).map(|h| h.value().clone()))
    }

    /// 更新作业（与提交写入共用分区锁，避免"检查无提交"与新提交交错）
    pub(super) async fn update_homework_impl(
        &self,
        homework: Homework,
        only_if_unreferenced: bool,
    ) -> Result<bool> {
        let partition = self.partition(homework.id);
        let _guard = partition.lock().await;

        if !self.homeworks.contains_key(&homework.id) {
            return Err(HWSystemError::not_found(format!(
                "作业不存在: {}",
                homework.id
            )));
        }
        if only_if_unreferenced && self.count_submissions_impl(homework.id)? > 0 {
            return Ok(false);
        }

        self.homeworks.insert(homework.id, homework);
        Ok(true)
    }

    /// 删除作业（已有提交时不删除）
    pub(super) async fn delete_homework_impl(&self, homework_id: HomeworkId) -> Result<bool> {
        let partition = self.partition(homework_id);
        let _guard = partition.lock().await;

        if self.count_submissions_impl(homework_id)? > 0 {
            return Ok(false);
        }

        Ok(self.homeworks.remove(&homework_id).is_some())
    }

    pub(super) fn list_homeworks_impl(&self) -> Result<Vec<Homework>> {
        let mut homeworks: Vec<Homework> =
            self.homeworks.iter().map(|h| h.value().clone()).collect();
        homeworks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(homeworks)
    }
}
