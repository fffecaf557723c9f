//! 统计聚合引擎
//!
//! 统计是事件日志的投影，最终一致：
//! - 缓存超过 `max_staleness`、被相关事件标记失效、或早于调用方要求的 `as_of` 时同步重算
//! - 重算失败时返回上一次的缓存并标记 `stale = true`，没有缓存时才返回错误

pub mod compute;
pub mod projection;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use self::projection::Projection;
use super::authz;
use super::events::EventSink;
use crate::config::AggregationConfig;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    actors::entities::{Actor, ActorRole},
    events::entities::LifecycleEvent,
    stats::entities::{StatsScope, StatsSnapshot},
};
use crate::storage::Storage;
use crate::utils::clock::Clock;

pub struct AggregationEngine {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    projection: Mutex<Projection>,
    cache: Cache<StatsScope, StatsSnapshot>,
    dirty: DashSet<StatsScope>,
    max_staleness: chrono::Duration,
}

impl AggregationEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        config: &AggregationConfig,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(Duration::from_secs(config.cache_ttl_secs))
            .build();

        debug!(
            "AggregationEngine initialized with max staleness {}s, cache capacity {}",
            config.max_staleness_secs, config.cache_capacity
        );
        Self {
            storage,
            clock,
            projection: Mutex::new(Projection::new()),
            cache,
            dirty: DashSet::new(),
            max_staleness: chrono::Duration::seconds(config.max_staleness_secs),
        }
    }

    async fn compute_snapshot(&self, scope: StatsScope) -> Result<StatsSnapshot> {
        if let StatsScope::School(school_id) = scope
            && self.storage.get_school(school_id).await?.is_none()
        {
            return Err(HWSystemError::not_found(format!("学校不存在: {school_id}")));
        }

        let classes = self.storage.list_classes().await?;
        let homeworks = self.storage.list_homeworks().await?;

        // as_of 在读取事件之前取，保证快照至少包含该时刻之前提交的全部事件
        let as_of = self.clock.now();
        let mut projection = self.projection.lock().await;
        let applied = projection.catch_up(self.storage.as_ref()).await?;
        if applied > 0 {
            debug!("Projection applied {} new events", applied);
        }

        let stats = compute::compute(scope, &classes, &homeworks, projection.facts())?;
        Ok(StatsSnapshot {
            scope,
            as_of,
            stale: false,
            stats,
        })
    }

    /// 同步重算并刷新缓存
    pub async fn recompute(&self, scope: StatsScope) -> Result<StatsSnapshot> {
        // 先清除失效标记，重算期间到达的事件会重新标记
        let was_dirty = self.dirty.remove(&scope).is_some();

        match self.compute_snapshot(scope).await {
            Ok(snapshot) => {
                self.cache.insert(scope, snapshot.clone()).await;
                Ok(snapshot)
            }
            Err(err) => {
                if was_dirty {
                    self.dirty.insert(scope);
                }
                Err(err)
            }
        }
    }

    fn is_fresh(&self, snapshot: &StatsSnapshot, min_as_of: Option<DateTime<Utc>>) -> bool {
        let age = self.clock.now() - snapshot.as_of;
        age <= self.max_staleness
            && !self.dirty.contains(&snapshot.scope)
            && min_as_of.is_none_or(|at| snapshot.as_of >= at)
    }

    /// 读取统计（不做权限检查）
    pub async fn get_stats(
        &self,
        scope: StatsScope,
        min_as_of: Option<DateTime<Utc>>,
    ) -> Result<StatsSnapshot> {
        let cached = self.cache.get(&scope).await;
        if let Some(snapshot) = &cached
            && self.is_fresh(snapshot, min_as_of)
        {
            return Ok(snapshot.clone());
        }

        match self.recompute(scope).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) if err.is_internal() => match cached {
                Some(mut snapshot) => {
                    warn!("Recompute of {} failed, serving stale stats: {}", scope, err);
                    snapshot.stale = true;
                    Ok(snapshot)
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    async fn authorize(&self, actor: &Actor, scope: StatsScope) -> Result<()> {
        let storage = self.storage.as_ref();
        let allowed = match scope {
            StatsScope::Class(class_id) | StatsScope::ClassTrend(class_id) => {
                let roster = storage
                    .get_class(class_id)
                    .await?
                    .ok_or_else(|| HWSystemError::not_found(format!("班级不存在: {class_id}")))?;
                authz::is_class_staff(storage, actor, &roster).await?
            }
            StatsScope::Homework(homework_id) => {
                let homework = storage.get_homework(homework_id).await?.ok_or_else(|| {
                    HWSystemError::not_found(format!("作业不存在: {homework_id}"))
                })?;
                let roster = storage.get_class(homework.class_id).await?.ok_or_else(|| {
                    HWSystemError::not_found(format!("班级不存在: {}", homework.class_id))
                })?;
                authz::is_class_staff(storage, actor, &roster).await?
            }
            StatsScope::School(school_id) => {
                let school = storage
                    .get_school(school_id)
                    .await?
                    .ok_or_else(|| HWSystemError::not_found(format!("学校不存在: {school_id}")))?;
                actor.is(ActorRole::Principal) && school.principal_ids.contains(&actor.id)
            }
            StatsScope::Student(student_id) | StatsScope::StudentTrend(student_id) => {
                authz::can_view_student_anywhere(storage, actor, student_id).await?
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(HWSystemError::forbidden(format!("无权查看 {scope} 的统计")))
        }
    }

    /// 带权限检查的统计读取
    pub async fn get_stats_for(
        &self,
        actor: &Actor,
        scope: StatsScope,
        min_as_of: Option<DateTime<Utc>>,
    ) -> Result<StatsSnapshot> {
        self.authorize(actor, scope).await?;
        self.get_stats(scope, min_as_of).await
    }
}

#[async_trait::async_trait]
impl EventSink for AggregationEngine {
    async fn publish(&self, events: &[LifecycleEvent]) {
        for event in events {
            self.dirty.insert(StatsScope::Homework(event.homework_id));
            self.dirty.insert(StatsScope::Class(event.class_id));
            self.dirty.insert(StatsScope::Student(event.student_id));
            self.dirty.insert(StatsScope::School(event.school_id));
            self.dirty.insert(StatsScope::ClassTrend(event.class_id));
            self.dirty.insert(StatsScope::StudentTrend(event.student_id));
        }
    }
}
