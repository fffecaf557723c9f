//! 作业目录：创建、修改、删除（或归档）与查看

pub mod create;
pub mod delete;
pub mod detail;
pub mod list;
pub mod update;

use std::sync::Arc;

use super::context::CoreContext;
use crate::errors::Result;
use crate::models::{
    ClassId, HomeworkId,
    actors::entities::Actor,
    homeworks::{
        entities::Homework,
        requests::{AmendHomeworkRequest, CreateHomeworkRequest},
        responses::HomeworkRemoval,
    },
};

pub struct HomeworkCatalog {
    ctx: Arc<CoreContext>,
}

impl HomeworkCatalog {
    pub fn new(ctx: Arc<CoreContext>) -> Self {
        Self { ctx }
    }

    pub(crate) fn ctx(&self) -> &CoreContext {
        &self.ctx
    }

    pub async fn create_homework(
        &self,
        actor: &Actor,
        req: CreateHomeworkRequest,
    ) -> Result<Homework> {
        create::create_homework(self, actor, req).await
    }

    pub async fn amend_homework(
        &self,
        actor: &Actor,
        homework_id: HomeworkId,
        req: AmendHomeworkRequest,
    ) -> Result<Homework> {
        update::amend_homework(self, actor, homework_id, req).await
    }

    pub async fn delete_homework(
        &self,
        actor: &Actor,
        homework_id: HomeworkId,
    ) -> Result<HomeworkRemoval> {
        delete::delete_homework(self, actor, homework_id).await
    }

    pub async fn get_homework(&self, actor: &Actor, homework_id: HomeworkId) -> Result<Homework> {
        detail::get_homework(self, actor, homework_id).await
    }

    pub async fn list_class_homeworks(
        &self,
        actor: &Actor,
        class_id: ClassId,
    ) -> Result<Vec<Homework>> {
        list::list_class_homeworks(self, actor, class_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::errors::HWSystemError;
    use crate::models::homeworks::{
        entities::LatePolicy,
        requests::{AmendHomeworkRequest, CreateHomeworkRequest},
        responses::HomeworkRemoval,
    };
    use crate::services::test_support::Fixture;

    fn request(fx: &Fixture, title: &str, due_in: Duration) -> CreateHomeworkRequest {
        CreateHomeworkRequest {
            class_id: fx.class_id,
            title: title.to_string(),
            description: Some("课本第 42 页".to_string()),
            due_at: fx.now() + due_in,
            late_policy: LatePolicy::default(),
        }
    }

    #[tokio::test]
    async fn test_create_homework_validates_input() {
        let fx = Fixture::new(1).await;
        let catalog = &fx.services.homeworks;

        let err = catalog
            .create_homework(&fx.teacher, request(&fx, "  ", Duration::days(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Validation(_)));

        let err = catalog
            .create_homework(&fx.teacher, request(&fx, "Fractions", Duration::hours(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Validation(_)));

        let mut harsh = request(&fx, "Fractions", Duration::days(1));
        harsh.late_policy.penalty_percent = 120;
        let err = catalog.create_homework(&fx.teacher, harsh).await.unwrap_err();
        assert!(matches!(err, HWSystemError::OutOfRange(_)));

        let err = catalog
            .create_homework(&fx.other_teacher, request(&fx, "Fractions", Duration::days(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Forbidden(_)));

        let homework = catalog
            .create_homework(&fx.teacher, request(&fx, " Fractions ", Duration::days(1)))
            .await
            .unwrap();
        assert_eq!(homework.title, "Fractions");
        assert_eq!(homework.teacher_id, fx.teacher.id);
    }

    #[tokio::test]
    async fn test_amend_is_blocked_once_submissions_exist() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let catalog = &fx.services.homeworks;

        let amended = catalog
            .amend_homework(
                &fx.teacher,
                homework.id,
                AmendHomeworkRequest {
                    due_at: Some(fx.now() + Duration::days(2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(amended.due_at, fx.now() + Duration::days(2));

        fx.submit(&homework, 0).await.unwrap();
        let err = catalog
            .amend_homework(
                &fx.teacher,
                homework.id,
                AmendHomeworkRequest {
                    title: Some("Changed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_delete_archives_homework_with_submissions() {
        let fx = Fixture::new(1).await;
        let catalog = &fx.services.homeworks;

        let unused = fx.homework(Duration::days(1), LatePolicy::default()).await;
        assert_eq!(
            catalog.delete_homework(&fx.teacher, unused.id).await.unwrap(),
            HomeworkRemoval::Deleted
        );
        let err = catalog
            .get_homework(&fx.teacher, unused.id)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::NotFound(_)));

        let used = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let submission = fx.submit(&used, 0).await.unwrap();
        assert_eq!(
            catalog.delete_homework(&fx.teacher, used.id).await.unwrap(),
            HomeworkRemoval::Archived
        );

        // 归档后历史提交仍可查看，但不再接受新提交
        let kept = fx
            .services
            .lifecycle
            .get_submission(&fx.teacher, submission.id)
            .await
            .unwrap();
        assert_eq!(kept.id, submission.id);
        let err = fx.submit(&used, 0).await.unwrap_err();
        assert!(matches!(err, HWSystemError::NotFound(_)));
        assert!(
            catalog
                .list_class_homeworks(&fx.teacher, fx.class_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_parent_sees_class_homework_of_linked_student() {
        let fx = Fixture::new(1).await;
        let homework = fx.homework(Duration::days(1), LatePolicy::default()).await;
        let catalog = &fx.services.homeworks;

        let listed = catalog
            .list_class_homeworks(&fx.parent, fx.class_id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(
            catalog
                .get_homework(&fx.students[0], homework.id)
                .await
                .unwrap()
                .id,
            homework.id
        );
        let err = catalog
            .get_homework(&fx.other_teacher, homework.id)
            .await
            .unwrap_err();
        assert!(matches!(err, HWSystemError::Forbidden(_)));
    }
}
