use tokio::signal;
use tracing::{error, warn};

/// 等待 Ctrl+C；监听失败时不主动退出，由 HTTP 服务自身结束
pub async fn listen_for_shutdown() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");
}
