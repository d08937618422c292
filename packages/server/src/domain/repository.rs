//! Repository trait 定義
//!
//! ドメイン層が必要とする永続化（Persistence Gateway）のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 依存性の逆転（DIP）
//!
//! - ドメイン層が必要とするインターフェースをドメイン層自身が定義
//! - Infrastructure 層がドメイン層のインターフェースに依存
//! - UseCase 層はこの trait にのみ依存する

use async_trait::async_trait;

use super::{
    ChatMessage, ConnectionId, MessageId, NewMessage, NewPoll, Poll, PollDetail, PollId,
    PollOptionId, PollResults, RepositoryError, Room, RoomId, RoomUpdate, Timestamp, VoteReceipt,
};

/// ルームの永続化
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを取得（存在しなければ None）
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<Room>, RepositoryError>;

    /// ルームを作成（既に存在する場合は何もしない）
    async fn ensure_room(&self, room: Room) -> Result<(), RepositoryError>;

    /// ルームを部分更新し、更新後のルームを返す
    async fn update_room(
        &self,
        room_id: &RoomId,
        update: RoomUpdate,
    ) -> Result<Room, RepositoryError>;
}

/// メッセージの永続化
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを保存し、ID が割り当てられたメッセージを返す
    async fn save_message(&self, message: NewMessage) -> Result<ChatMessage, RepositoryError>;

    /// ID でメッセージを取得
    async fn get_message(&self, id: MessageId) -> Result<Option<ChatMessage>, RepositoryError>;

    /// 最近のメッセージを時系列順（古い順）で取得
    async fn get_recent_messages(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// ルームのメッセージを全て削除（付随する投票も削除）し、削除件数を返す
    async fn clear_messages_for_room(&self, room_id: &RoomId) -> Result<u64, RepositoryError>;

    /// `cutoff` より古いメッセージを削除（付随する投票も削除）し、削除件数を返す
    async fn delete_messages_before(&self, cutoff: Timestamp) -> Result<u64, RepositoryError>;
}

/// 投票の永続化
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PollRepository: Send + Sync {
    /// 投票と選択肢を作成し、票数 0 の集計付きで返す
    async fn create_poll(&self, poll: NewPoll) -> Result<PollDetail, RepositoryError>;

    /// 投票を取得
    async fn get_poll(&self, poll_id: PollId) -> Result<Option<Poll>, RepositoryError>;

    /// 投票の集計結果を取得
    async fn get_poll_results(&self, poll_id: PollId)
    -> Result<Option<PollResults>, RepositoryError>;

    /// 投票する（同じ投票内の既存票は削除してから追加する）
    ///
    /// 削除と追加は 1 つのトランザクションとして扱われ、他の投票者から
    /// 途中状態が観測されることはない。
    async fn cast_vote(
        &self,
        poll_id: PollId,
        option_id: PollOptionId,
        voter: &ConnectionId,
        at: Timestamp,
    ) -> Result<VoteReceipt, RepositoryError>;

    /// 投票者が現在選んでいる選択肢
    async fn get_user_vote(
        &self,
        poll_id: PollId,
        voter: &ConnectionId,
    ) -> Result<Option<PollOptionId>, RepositoryError>;
}
