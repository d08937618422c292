//! Hiroba: room-based real-time chat server.
//!
//! Clients connect over WebSocket, join a room with a nickname and exchange
//! messages, replies, highlights and polls with everyone else in the room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
