//! Conversion logic between domain entities and DTOs.

use serde_json::Value;

use crate::{
    domain::{
        ChatMessage, OptionTally, PollDetail, PollResults, RoomView, ServerEvent,
    },
    infrastructure::dto::{http, websocket as dto},
};
use hiroba_shared::time::millis_to_rfc3339;

// ========================================
// Domain Entity → WebSocket DTO
// ========================================

impl From<&ChatMessage> for dto::MessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            id: model.id.value(),
            room_id: model.room_id.as_str().to_string(),
            nickname: model.nickname.as_str().to_string(),
            text: model.text.clone(),
            created_at: model.created_at.value(),
            parent_message_id: model.parent_message_id.map(|id| id.value()),
            is_highlighted: model.is_highlighted,
            client_id: None,
        }
    }
}

impl From<&RoomView> for dto::RoomInfoDto {
    fn from(model: &RoomView) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            name: model.name.clone(),
            description: model.description.clone(),
            has_password: model.has_password,
            created_at: model.created_at.map(|t| t.value()),
            is_creator: model.is_creator,
        }
    }
}

impl From<&OptionTally> for dto::PollOptionDto {
    fn from(model: &OptionTally) -> Self {
        Self {
            id: model.option.id.value(),
            text: model.option.text.clone(),
            index: model.option.index,
            vote_count: model.vote_count,
            vote_rate: model.vote_rate,
        }
    }
}

impl From<&PollResults> for dto::PollResultsDto {
    fn from(model: &PollResults) -> Self {
        Self {
            poll_id: model.poll_id.value(),
            options: model.options.iter().map(Into::into).collect(),
            total_votes: model.total_votes,
        }
    }
}

impl From<&PollDetail> for dto::PollDto {
    fn from(model: &PollDetail) -> Self {
        Self {
            id: model.poll.id.value(),
            message_id: model.poll.message_id.value(),
            expires_at: model.poll.expires_at.map(|t| t.value()),
            created_at: model.poll.created_at.value(),
            options: model.results.options.iter().map(Into::into).collect(),
            total_votes: model.results.total_votes,
        }
    }
}

/// イベントのペイロード（`data`）を作る
pub fn event_payload(event: &ServerEvent) -> Result<Value, serde_json::Error> {
    match event {
        ServerEvent::History { messages } => {
            let messages: Vec<dto::MessageDto> = messages.iter().map(Into::into).collect();
            serde_json::to_value(messages)
        }
        ServerEvent::RoomInfo(view) => serde_json::to_value(dto::RoomInfoDto::from(view)),
        ServerEvent::RoomUsers { nicknames } => {
            let nicknames: Vec<&str> = nicknames.iter().map(|n| n.as_str()).collect();
            serde_json::to_value(nicknames)
        }
        ServerEvent::ChatMessage { message, client_id } => {
            let mut dto = dto::MessageDto::from(message);
            dto.client_id = client_id.clone();
            serde_json::to_value(dto)
        }
        ServerEvent::RoomRefresh { notice } => serde_json::to_value(dto::RoomRefreshDto {
            message: notice.clone(),
        }),
        ServerEvent::PollMessage { message, poll } => {
            serde_json::to_value(dto::PollMessageDto {
                message: message.into(),
                poll: poll.into(),
            })
        }
        ServerEvent::PollResults {
            poll_id,
            message_id,
            results,
            voter,
            user_vote,
        } => serde_json::to_value(dto::PollResultsEventDto {
            poll_id: poll_id.value(),
            message_id: message_id.value(),
            results: results.into(),
            session_id: voter.as_str().to_string(),
            user_vote: user_vote.value(),
        }),
    }
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

impl From<&ChatMessage> for http::HistoryMessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            id: model.id.value(),
            nickname: model.nickname.as_str().to_string(),
            text: model.text.clone(),
            created_at: millis_to_rfc3339(model.created_at.value()).unwrap_or_default(),
            parent_message_id: model.parent_message_id.map(|id| id.value()),
            is_highlighted: model.is_highlighted,
        }
    }
}
