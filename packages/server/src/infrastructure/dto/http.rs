//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /api/rooms/{room_id}/messages` のクエリ
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// 履歴のメッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMessageDto {
    pub id: i64,
    pub nickname: String,
    pub text: String,
    /// RFC3339 (UTC)
    pub created_at: String,
    pub parent_message_id: Option<i64>,
    pub is_highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponseDto {
    pub room_id: String,
    pub messages: Vec<HistoryMessageDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUsersResponseDto {
    pub room_id: String,
    pub users: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
    pub message: String,
}
