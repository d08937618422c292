//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    infrastructure::dto::http::{
        ErrorResponseDto, HistoryMessageDto, HistoryQuery, HistoryResponseDto,
        RoomUsersResponseDto,
    },
    ui::state::AppState,
    usecase::RoomQueryError,
};

impl IntoResponse for RoomQueryError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            Self::InvalidRoomId(_) => (StatusCode::BAD_REQUEST, "InvalidRoomId"),
            Self::Internal(message) => {
                tracing::error!("Room query failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError")
            }
        };
        let body = ErrorResponseDto {
            error: error.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// `GET /api/rooms/{room_id}/messages?limit=N`
///
/// 最近のメッセージを古い順で返す。
pub async fn get_room_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponseDto>, RoomQueryError> {
    let (room_id, messages) = state
        .get_recent_messages_usecase
        .execute(&room_id, query.limit)
        .await?;

    // Domain Model から DTO への変換
    Ok(Json(HistoryResponseDto {
        room_id: room_id.into_string(),
        messages: messages.iter().map(HistoryMessageDto::from).collect(),
    }))
}

/// `GET /api/rooms/{room_id}/users`
pub async fn get_room_users(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomUsersResponseDto>, RoomQueryError> {
    let (room_id, nicknames) = state.get_room_users_usecase.execute(&room_id).await?;

    let users: Vec<String> = nicknames.into_iter().map(|n| n.into_string()).collect();
    Ok(Json(RoomUsersResponseDto {
        room_id: room_id.into_string(),
        count: users.len(),
        users,
    }))
}
