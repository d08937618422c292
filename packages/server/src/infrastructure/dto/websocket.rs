//! WebSocket メッセージの DTO
//!
//! ## フレーム形式
//!
//! - クライアント → サーバー: `{"event": <名前>, "ackId"?: <文字列>, "data"?: <ペイロード>}`
//! - サーバー → クライアント（イベント）: `{"event": <名前>, "data": <ペイロード>}`
//! - サーバー → クライアント（応答）: `{"event": "ack", "ackId": <文字列>, "data": {"ok": ...}}`
//! - 生存確認: `{"event": "server_ping", "ackId": <文字列>}` に対して
//!   クライアントは `{"event": "ack", "ackId": <同じ値>, "data": "ok"}` を返す
//!
//! ペイロードのキーは camelCase。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::{MessagePushError, ServerEvent};

/// 応答フレームのイベント名
pub const ACK_EVENT: &str = "ack";

/// 生存確認フレームのイベント名
pub const PROBE_EVENT: &str = "server_ping";

/// 生存確認に対する肯定応答
pub const PROBE_REPLY: &str = "ok";

// ========================================
// フレーム
// ========================================

/// クライアントから受信するフレーム
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub ack_id: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// サーバーから送信するフレーム
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingFrame<'a, T: Serialize> {
    pub event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// イベントを送信用の JSON にする
pub fn encode_event(event: &ServerEvent) -> Result<String, MessagePushError> {
    let data = super::conversion::event_payload(event)
        .map_err(|e| MessagePushError::Encode(e.to_string()))?;
    serde_json::to_string(&OutgoingFrame {
        event: event.name(),
        ack_id: None,
        data: Some(data),
    })
    .map_err(|e| MessagePushError::Encode(e.to_string()))
}

/// 生存確認フレーム
pub fn encode_probe(ack_id: &str) -> Result<String, MessagePushError> {
    serde_json::to_string(&OutgoingFrame::<Value> {
        event: PROBE_EVENT,
        ack_id: Some(ack_id),
        data: None,
    })
    .map_err(|e| MessagePushError::Encode(e.to_string()))
}

/// 成功応答（`fields` は `ok` と同じ階層に展開される）
pub fn encode_ack_ok(ack_id: &str, fields: Map<String, Value>) -> Result<String, serde_json::Error> {
    let mut body = Map::new();
    body.insert("ok".to_string(), Value::Bool(true));
    body.extend(fields);
    serde_json::to_string(&OutgoingFrame {
        event: ACK_EVENT,
        ack_id: Some(ack_id),
        data: Some(Value::Object(body)),
    })
}

/// 失敗応答
pub fn encode_ack_error(ack_id: &str, code: &str, message: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutgoingFrame {
        event: ACK_EVENT,
        ack_id: Some(ack_id),
        data: Some(AckError {
            ok: false,
            error: code,
            message,
        }),
    })
}

#[derive(Debug, Serialize)]
struct AckError<'a> {
    ok: bool,
    error: &'a str,
    message: &'a str,
}

// ========================================
// リクエストのペイロード
// ========================================

/// 文字列・数値・null のいずれも文字列として受け付ける（`"roomId": 1` など）
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// 空文字列は None として扱う
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinRoomRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub room_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub nickname: String,
    pub password: Option<String>,
}

impl JoinRoomRequest {
    pub fn password(&self) -> Option<String> {
        non_empty(self.password.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessageRequest {
    pub text: String,
    pub client_id: Option<String>,
    pub parent_message_id: Option<i64>,
    pub is_highlighted: Option<bool>,
}

impl ChatMessageRequest {
    /// ペイロードを解釈する（文字列のみのペイロードは本文として扱う）
    pub fn parse(data: Value) -> Result<Self, serde_json::Error> {
        match data {
            Value::String(text) => Ok(Self {
                text,
                ..Self::default()
            }),
            Value::Null => Ok(Self::default()),
            other => serde_json::from_value(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePollRequest {
    pub text: String,
    pub options: Vec<String>,
    pub expires_at: Option<i64>,
}

impl CreatePollRequest {
    /// 締切時刻。クライアントは期限なしを `0` で送ってくることがあるので `None` と同じに扱う
    pub fn expiry(&self) -> Option<i64> {
        self.expires_at.filter(|&at| at != 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoteRequest {
    pub poll_id: Option<i64>,
    pub option_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollResultsRequest {
    pub poll_id: Option<i64>,
}

// ========================================
// イベントのペイロード
// ========================================

/// 保存済みメッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: i64,
    pub room_id: String,
    pub nickname: String,
    pub text: String,
    pub created_at: i64,
    pub parent_message_id: Option<i64>,
    pub is_highlighted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// ルーム情報（パスワード本体と作成者の接続 ID は含めない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfoDto {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub has_password: bool,
    pub created_at: Option<i64>,
    pub is_creator: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionDto {
    pub id: i64,
    pub text: String,
    pub index: u32,
    pub vote_count: u64,
    pub vote_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResultsDto {
    pub poll_id: i64,
    pub options: Vec<PollOptionDto>,
    pub total_votes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDto {
    pub id: i64,
    pub message_id: i64,
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub options: Vec<PollOptionDto>,
    pub total_votes: u64,
}

/// `poll_message`: メッセージ + 投票
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollMessageDto {
    #[serde(flatten)]
    pub message: MessageDto,
    pub poll: PollDto,
}

/// `poll_results`: 投票結果の更新
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResultsEventDto {
    pub poll_id: i64,
    pub message_id: i64,
    pub results: PollResultsDto,
    pub session_id: String,
    pub user_vote: i64,
}

/// `room_refresh`: 履歴が消去された通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRefreshDto {
    pub message: String,
}
