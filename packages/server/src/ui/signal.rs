//! Shutdown signal handling.

/// Ctrl+C を待つ（graceful shutdown 用）
///
/// ハンドラを登録できなかった場合は停止要求を受け付けず、待ち続ける。
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down gracefully..."),
        Err(e) => {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
