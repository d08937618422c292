//! Infrastructure 層
//!
//! ドメイン層の trait（Repository, MessagePusher, LivenessProbe）の具体的な実装と、
//! 転送形式（DTO）への変換を提供します。

pub mod dto;
pub mod message_pusher;
pub mod repository;
