//! WebSocket イベントのディスパッチ
//!
//! 1 接続につき 1 つの `EventDispatcher` が受信フレームを順番に処理し、
//! 結果を要求元の ack として返す。失敗は `{ok:false, error, message}` の ack になり、
//! 他の接続へは届かない。

use std::{fmt::Display, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::{
    domain::{ConnectionId, OutboundFrame, PusherChannel, Session},
    infrastructure::dto::websocket::{
        ChatMessageRequest, ClientFrame, CreatePollRequest, JoinRoomRequest, MessageDto, PollDto,
        PollResultsDto, PollResultsRequest, RoomInfoDto, UpdateRoomRequest, VoteRequest,
        encode_ack_error, encode_ack_ok,
    },
    ui::state::AppState,
    usecase::{ErrorCode, OutgoingMessage, RoomEdit},
};

/// 失敗した要求の ack 内容
#[derive(Debug)]
struct Rejection {
    code: &'static str,
    message: String,
    internal: bool,
}

impl Rejection {
    fn malformed(code: &'static str, e: impl Display) -> Self {
        Self {
            code,
            message: format!("malformed payload: {e}"),
            internal: false,
        }
    }
}

fn rejected<E: ErrorCode + Display>(e: E) -> Rejection {
    Rejection {
        code: e.code(),
        message: e.to_string(),
        internal: e.is_internal(),
    }
}

type Reply = Result<Map<String, Value>, Rejection>;

/// ペイロードを解釈する（省略時は既定値）
fn payload<T: DeserializeOwned + Default>(data: Value, code: &'static str) -> Result<T, Rejection> {
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data).map_err(|e| Rejection::malformed(code, e))
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub(super) struct EventDispatcher {
    state: Arc<AppState>,
    connection_id: ConnectionId,
    session: Session,
    /// 自分自身への送信チャンネル（ack 用）
    outbound: PusherChannel,
}

impl EventDispatcher {
    pub(super) fn new(state: Arc<AppState>, connection_id: ConnectionId, outbound: PusherChannel) -> Self {
        Self {
            state,
            connection_id,
            session: Session::new(),
            outbound,
        }
    }

    pub(super) async fn dispatch(&mut self, frame: ClientFrame) {
        let ClientFrame {
            event,
            ack_id,
            data,
        } = frame;
        tracing::debug!("Client '{}' -> '{}'", self.connection_id, event);

        let reply = match event.as_str() {
            "join_room" => self.join_room(data).await,
            "leave_room" => {
                self.state
                    .leave_room_usecase
                    .execute(&self.connection_id, &mut self.session)
                    .await;
                return;
            }
            "chat_message" => self.chat_message(data).await,
            "get_room_info" => self.get_room_info().await,
            "update_room" => self.update_room(data).await,
            "create_poll" => self.create_poll(data).await,
            "vote" => self.vote(data).await,
            "get_poll_results" => self.get_poll_results(data).await,
            _ => {
                tracing::warn!("Unknown event '{}' from '{}'", event, self.connection_id);
                Err(Rejection {
                    code: "InvalidRequest",
                    message: format!("unknown event '{event}'"),
                    internal: false,
                })
            }
        };

        if let Err(rejection) = &reply {
            if rejection.internal {
                tracing::error!(
                    "'{}' from '{}' failed: {}",
                    event,
                    self.connection_id,
                    rejection.message
                );
            } else {
                tracing::debug!(
                    "'{}' from '{}' rejected with {}: {}",
                    event,
                    self.connection_id,
                    rejection.code,
                    rejection.message
                );
            }
        }

        match ack_id {
            Some(ack_id) => self.acknowledge(&ack_id, reply),
            None => tracing::debug!("'{}' from '{}' had no ackId", event, self.connection_id),
        }
    }

    fn acknowledge(&self, ack_id: &str, reply: Reply) {
        let encoded = match reply {
            Ok(fields) => encode_ack_ok(ack_id, fields),
            Err(rejection) => encode_ack_error(ack_id, rejection.code, &rejection.message),
        };
        match encoded {
            Ok(frame) => {
                // 送信タスクが終了済みなら ack は捨てる
                if self.outbound.send(OutboundFrame::Text(frame)).is_err() {
                    tracing::debug!("Connection '{}' closed before ack", self.connection_id);
                }
            }
            Err(e) => tracing::error!("Failed to encode ack for '{}': {}", self.connection_id, e),
        }
    }

    async fn join_room(&mut self, data: Value) -> Reply {
        let request: JoinRoomRequest = payload(data, "InvalidRequest")?;
        let password = request.password();
        self.state
            .join_room_usecase
            .execute(
                &self.connection_id,
                &mut self.session,
                &request.room_id,
                &request.nickname,
                password.as_deref(),
            )
            .await
            .map_err(rejected)?;
        Ok(Map::new())
    }

    async fn chat_message(&mut self, data: Value) -> Reply {
        let request = ChatMessageRequest::parse(data)
            .map_err(|e| Rejection::malformed("InvalidRequest", e))?;
        let outgoing = OutgoingMessage {
            text: request.text,
            client_id: request.client_id,
            parent_message_id: request.parent_message_id,
            is_highlighted: request.is_highlighted.unwrap_or(false),
        };
        self.state
            .send_message_usecase
            .execute(&self.connection_id, &self.session, outgoing)
            .await
            .map_err(rejected)?;
        Ok(Map::new())
    }

    async fn get_room_info(&mut self) -> Reply {
        let view = self
            .state
            .get_room_info_usecase
            .execute(&self.connection_id, &self.session)
            .await
            .map_err(rejected)?;
        Ok(fields(json!({ "room": RoomInfoDto::from(&view) })))
    }

    async fn update_room(&mut self, data: Value) -> Reply {
        let request: UpdateRoomRequest = payload(data, "InvalidRequest")?;
        let edit = RoomEdit {
            name: request.name,
            description: request.description,
            password: request.password,
        };
        let view = self
            .state
            .update_room_usecase
            .execute(&self.connection_id, &self.session, edit)
            .await
            .map_err(rejected)?;
        Ok(fields(json!({ "room": RoomInfoDto::from(&view) })))
    }

    async fn create_poll(&mut self, data: Value) -> Reply {
        let request: CreatePollRequest = payload(data, "InvalidParams")?;
        let created = self
            .state
            .create_poll_usecase
            .execute(
                &self.session,
                &request.text,
                &request.options,
                request.expiry(),
            )
            .await
            .map_err(rejected)?;
        Ok(fields(json!({
            "message": MessageDto::from(&created.message),
            "poll": PollDto::from(&created.poll),
        })))
    }

    async fn vote(&mut self, data: Value) -> Reply {
        let request: VoteRequest = payload(data, "InvalidParams")?;
        let outcome = self
            .state
            .vote_usecase
            .execute(
                &self.connection_id,
                &self.session,
                request.poll_id,
                request.option_id,
            )
            .await
            .map_err(rejected)?;
        Ok(fields(json!({
            "pollId": outcome.poll_id.value(),
            "optionId": outcome.option_id.value(),
            "results": PollResultsDto::from(&outcome.results),
            "isChanged": outcome.changed,
        })))
    }

    async fn get_poll_results(&mut self, data: Value) -> Reply {
        let request: PollResultsRequest = payload(data, "InvalidParams")?;
        let snapshot = self
            .state
            .get_poll_results_usecase
            .execute(&self.connection_id, request.poll_id)
            .await
            .map_err(rejected)?;
        Ok(fields(json!({
            "pollId": snapshot.results.poll_id.value(),
            "results": PollResultsDto::from(&snapshot.results),
            "userVote": snapshot.user_vote.map(|option| option.value()),
        })))
    }
}
