//! 组织架构存储操作

use super::MemoryStorage;
use crate::errors::Result;
use crate::models::{
    ClassId, SchoolId, UserId,
    directory::entities::{ClassRoster, ParentLink, SchoolProfile},
};

impl MemoryStorage {
    pub(super) fn upsert_school_impl(&self, school: SchoolProfile) -> Result<()> {
        self.schools.insert(school.id, school);
        Ok(())
    }

    pub(super) fn get_school_impl(&self, school_id: SchoolId) -> Result<Option<SchoolProfile>> {
        Ok(self.schools.get(&school_id).map(|s| s.value().clone()))
    }

    pub(super) fn upsert_class_impl(&self, roster: ClassRoster) -> Result<()> {
        self.classes.insert(roster.id, roster);
        Ok(())
    }

    pub(super) fn get_class_impl(&self, class_id: ClassId) -> Result<Option<ClassRoster>> {
        Ok(self.classes.get(&class_id).map(|c| c.value().clone()))
    }

    pub(super) fn list_classes_impl(&self) -> Result<Vec<ClassRoster>> {
        let mut classes: Vec<ClassRoster> =
            self.classes.iter().map(|c| c.value().clone()).collect();
        classes.sort_by_key(|c| c.id);
        Ok(classes)
    }

    pub(super) fn link_parent_impl(&self, link: ParentLink) -> Result<()> {
        self.parents
            .entry(link.parent_id)
            .or_default()
            .insert(link.student_id);
        Ok(())
    }

    pub(super) fn is_parent_of_impl(&self, parent_id: UserId, student_id: UserId) -> Result<bool> {
        Ok(self
            .parents
            .get(&parent_id)
            .is_some_and(|children| children.contains(&student_id)))
    }
}
