//! Server execution logic.

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use hiroba_shared::time::{Clock, SystemClock};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ChatConfig;

use super::{
    handler::{get_room_history, get_room_users, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Room-based chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ChatConfig::default());
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// 保持期間スイープの間隔
    sweep_interval: Duration,
}

impl Server {
    pub fn new(config: ChatConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ChatConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(AppState::build(&config, clock)),
            sweep_interval: config.sweep_interval,
        }
    }

    /// WebSocket と HTTP API のルーティング
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/rooms/{room_id}/messages", get(get_room_history))
            .route("/api/rooms/{room_id}/users", get(get_room_users))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the chat server
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener).await?;
        Ok(())
    }

    /// バインド済みのリスナーで待ち受ける（保持期間スイープも起動する）
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let sweep = self
            .state
            .purge_expired_messages_usecase
            .clone()
            .spawn(self.sweep_interval);
        let app = self.router();

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        sweep.abort();
        tracing::info!("Server shutdown complete");
        served
    }
}
