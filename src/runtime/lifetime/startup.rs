use crate::config::AppConfig;
use crate::errors::Result;
use crate::services::AppServices;
use crate::utils::clock::SystemClock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub services: Arc<AppServices>,
}

/// 导入组织架构种子数据（如果配置了）
async fn seed_directory(services: &AppServices) -> Result<()> {
    let config = AppConfig::get();
    let Some(path) = config.directory_seed_file() else {
        debug!("No directory seed file configured, skipping directory seed");
        return Ok(());
    };

    let summary = services.directory.seed_from_file(path).await?;
    warn!(
        "Directory seeded from {}: {} schools, {} classes, {} parent links",
        path, summary.schools, summary.classes, summary.parents
    );
    Ok(())
}

/// 后台定时执行自动批阅扫描
fn spawn_auto_review(services: Arc<AppServices>, interval_secs: u64) {
    if interval_secs == 0 {
        info!("Auto-review sweep disabled");
        return;
    }

    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(Duration::from_secs(interval_secs));
        // 第一次 tick 立即返回，跳过
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match services.lifecycle.sweep_auto_review().await {
                Ok(count) => debug!("Auto-review sweep finished, {} submissions reviewed", count),
                Err(e) => warn!("Auto-review sweep failed: {}", e),
            }
        }
    });
    warn!("Auto-review sweep scheduled every {}s", interval_secs);
}

/// 后台定时清理空闲的提交锁，与自动批阅扫描相互独立
fn spawn_lock_pruning(services: Arc<AppServices>, every: Duration) {
    if every.is_zero() {
        info!("Idle lock pruning disabled");
        return;
    }

    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            services.lifecycle.prune_idle_locks();
        }
    });
    debug!("Idle lock pruning scheduled every {:?}", every);
}

/// 准备服务器启动的上下文
/// 包括存储、核心服务、目录种子和后台任务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let config = AppConfig::get();

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized");

    let services = Arc::new(AppServices::build(
        storage,
        Arc::new(SystemClock),
        &config.lifecycle,
        &config.aggregation,
        Vec::new(),
    ));

    seed_directory(&services).await?;
    spawn_auto_review(services.clone(), config.lifecycle.sweep_interval_secs);
    spawn_lock_pruning(
        services.clone(),
        Duration::from_secs(config.lifecycle.lock_prune_interval_secs),
    );

    Ok(StartupContext { services })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;

    #[actix_web::test]
    async fn test_lock_pruning_runs_without_auto_review() {
        let fx = Fixture::new(1).await;
        let locks = &fx.services.lifecycle.ctx().locks;
        drop(locks.acquire(uuid::Uuid::new_v4()).await.unwrap());
        assert_eq!(locks.len(), 1);

        spawn_lock_pruning(fx.services.clone(), Duration::from_millis(10));
        actix_web::rt::time::sleep(Duration::from_millis(60)).await;
        assert!(locks.is_empty());
    }
}
