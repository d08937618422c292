//! WebSocket / HTTP server.

mod handler;
mod server;
mod signal;
pub mod state; // 結合テストから組み立てを確認できるよう public

pub use server::Server;
