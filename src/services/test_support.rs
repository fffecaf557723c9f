//! 测试夹具：一所学校、一个班级、任课教师、校长、家长与若干学生

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use super::AppServices;
use super::events::{EventSink, RecordingSink};
use crate::config::{AggregationConfig, LifecycleConfig};
use crate::errors::Result;
use crate::models::{
    actors::entities::{Actor, ActorRole},
    directory::entities::{ClassRoster, DirectorySeed, ParentLink, SchoolProfile},
    homeworks::{
        entities::{Homework, LatePolicy},
        requests::CreateHomeworkRequest,
    },
    submissions::{
        entities::{FileRef, Submission},
        requests::NewSubmission,
    },
};
use crate::storage::memory_storage::MemoryStorage;
use crate::utils::clock::ManualClock;

pub struct Fixture {
    pub storage: Arc<MemoryStorage>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
    pub services: Arc<AppServices>,
    pub school_id: Uuid,
    pub class_id: Uuid,
    pub teacher: Actor,
    pub other_teacher: Actor,
    pub principal: Actor,
    pub parent: Actor,
    pub students: Vec<Actor>,
}

pub fn lifecycle_config() -> LifecycleConfig {
    LifecycleConfig {
        lock_timeout_ms: 200,
        max_retries: 3,
        retry_backoff_ms: 1,
        sweep_interval_secs: 0,
        lock_prune_interval_secs: 0,
    }
}

pub fn files(name: &str) -> Vec<FileRef> {
    vec![FileRef {
        url: format!("https://files.school.test/{name}.pdf"),
        name: Some(format!("{name}.pdf")),
        content_type: Some("application/pdf".to_string()),
    }]
}

impl Fixture {
    pub async fn new(student_count: usize) -> Self {
        Self::with_aggregation(student_count, AggregationConfig::default()).await
    }

    pub async fn with_aggregation(student_count: usize, aggregation: AggregationConfig) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        ));
        let sink = Arc::new(RecordingSink::default());
        let services = Arc::new(AppServices::build(
            storage.clone(),
            clock.clone(),
            &lifecycle_config(),
            &aggregation,
            vec![sink.clone() as Arc<dyn EventSink>],
        ));

        let teacher = Actor::new(Uuid::new_v4(), ActorRole::Teacher);
        let other_teacher = Actor::new(Uuid::new_v4(), ActorRole::Teacher);
        let principal = Actor::new(Uuid::new_v4(), ActorRole::Principal);
        let parent = Actor::new(Uuid::new_v4(), ActorRole::Parent);
        let students: Vec<Actor> = (0..student_count)
            .map(|_| Actor::new(Uuid::new_v4(), ActorRole::Student))
            .collect();

        let school_id = Uuid::new_v4();
        let class_id = Uuid::new_v4();
        let seed = DirectorySeed {
            schools: vec![SchoolProfile {
                id: school_id,
                name: "Riverside".to_string(),
                principal_ids: BTreeSet::from([principal.id]),
            }],
            classes: vec![ClassRoster {
                id: class_id,
                school_id,
                name: "Grade 7 / 1".to_string(),
                teacher_ids: BTreeSet::from([teacher.id]),
                student_ids: students.iter().map(|s| s.id).collect(),
            }],
            parents: students
                .first()
                .map(|s| ParentLink {
                    parent_id: parent.id,
                    student_id: s.id,
                })
                .into_iter()
                .collect(),
        };
        services.directory.seed(seed).await.unwrap();

        Self {
            storage,
            clock,
            sink,
            services,
            school_id,
            class_id,
            teacher,
            other_teacher,
            principal,
            parent,
            students,
        }
    }

    /// 由任课教师布置作业，截止时间为当前时间之后 `due_in`
    pub async fn homework(&self, due_in: Duration, late_policy: LatePolicy) -> Homework {
        self.services
            .homeworks
            .create_homework(
                &self.teacher,
                CreateHomeworkRequest {
                    class_id: self.class_id,
                    title: "Linear equations".to_string(),
                    description: None,
                    due_at: self.now() + due_in,
                    late_policy,
                },
            )
            .await
            .unwrap()
    }

    pub fn now(&self) -> chrono::DateTime<Utc> {
        use crate::utils::clock::Clock;
        self.clock.now()
    }

    pub async fn submit(&self, homework: &Homework, student: usize) -> Result<Submission> {
        self.submit_with_key(homework, student, None).await
    }

    pub async fn submit_with_key(
        &self,
        homework: &Homework,
        student: usize,
        key: Option<&str>,
    ) -> Result<Submission> {
        let actor = self.students[student];
        self.services
            .lifecycle
            .submit(
                &actor,
                NewSubmission {
                    homework_id: homework.id,
                    student_id: actor.id,
                    files: files(&format!("work-{student}")),
                    idempotency_key: key.map(str::to_string),
                },
            )
            .await
    }
}
