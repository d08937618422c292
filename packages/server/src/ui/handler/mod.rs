//! Request handlers.

mod event;
mod http;
mod websocket;

pub use http::{get_room_history, get_room_users};
pub use websocket::websocket_handler;
