//! UseCase 層
//!
//! 1 つの操作につき 1 つの UseCase（`new` + `execute`）。
//! 在室状態とルームのライフサイクルは `RoomCoordinator` がまとめて管理する。

pub mod connect_participant;
pub mod create_poll;
pub mod disconnect_participant;
pub mod error;
pub mod get_poll_results;
pub mod get_recent_messages;
pub mod get_room_info;
pub mod get_room_users;
pub mod join_room;
pub mod leave_room;
pub mod purge_expired_messages;
pub mod room_coordinator;
pub mod send_message;
pub mod update_room;
pub mod vote;

#[cfg(test)]
pub(crate) mod testing;

pub use connect_participant::ConnectParticipantUseCase;
pub use create_poll::{CreatePollUseCase, CreatedPoll};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{
    CreatePollError, ErrorCode, GetPollResultsError, GetRoomInfoError, JoinRoomError,
    RoomQueryError, SendMessageError, UpdateRoomError, VoteError,
};
pub use get_poll_results::{GetPollResultsUseCase, PollSnapshot};
pub use get_recent_messages::GetRecentMessagesUseCase;
pub use get_room_info::GetRoomInfoUseCase;
pub use get_room_users::GetRoomUsersUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use purge_expired_messages::PurgeExpiredMessagesUseCase;
pub use room_coordinator::{Admission, RoomCoordinator};
pub use send_message::{OutgoingMessage, SendMessageUseCase};
pub use update_room::{RoomEdit, UpdateRoomUseCase};
pub use vote::{VoteOutcome, VoteUseCase};
