pub mod aggregation;
pub mod authz;
pub mod context;
pub mod directory;
pub mod events;
pub mod grading;
pub mod homeworks;
pub mod lifecycle;
pub mod locks;
pub mod retry;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

pub use aggregation::AggregationEngine;
pub use context::CoreContext;
pub use directory::DirectoryService;
pub use events::{EventSink, FanoutSink, TracingEventSink};
pub use grading::GradingCoordinator;
pub use homeworks::HomeworkCatalog;
pub use lifecycle::LifecycleEngine;

use crate::config::{AggregationConfig, LifecycleConfig};
use crate::storage::Storage;
use crate::utils::clock::Clock;

/// 应用内全部核心服务
pub struct AppServices {
    pub lifecycle: LifecycleEngine,
    pub grading: GradingCoordinator,
    pub homeworks: HomeworkCatalog,
    pub directory: DirectoryService,
    pub aggregation: Arc<AggregationEngine>,
}

impl AppServices {
    /// 组装服务；`extra_sinks` 会在日志与统计失效之后收到事件
    pub fn build(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        lifecycle: &LifecycleConfig,
        aggregation: &AggregationConfig,
        extra_sinks: Vec<Arc<dyn EventSink>>,
    ) -> Self {
        let engine = Arc::new(AggregationEngine::new(
            storage.clone(),
            clock.clone(),
            aggregation,
        ));

        let sink = extra_sinks.into_iter().fold(
            FanoutSink::new()
                .with(Arc::new(TracingEventSink))
                .with(engine.clone()),
            FanoutSink::with,
        );

        let ctx = Arc::new(CoreContext::new(
            storage.clone(),
            clock,
            Arc::new(sink),
            lifecycle,
        ));

        Self {
            lifecycle: LifecycleEngine::new(ctx.clone()),
            grading: GradingCoordinator::new(ctx.clone()),
            homeworks: HomeworkCatalog::new(ctx),
            directory: DirectoryService::new(storage),
            aggregation: engine,
        }
    }
}
