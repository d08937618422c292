//! InMemory 永続化実装
//!
//! ドメイン層が定義する RoomRepository / MessageRepository / PollRepository の具体的な実装。
//! 1 つの Mutex で全テーブルを保護するため、各操作は他の操作から見て不可分に実行される
//! （投票の「旧票の削除 + 新票の追加」も途中状態が観測されない）。
//!
//! ## テーブル
//!
//! - rooms: RoomId → Room
//! - messages: MessageId → ChatMessage（ID は単調増加）
//! - polls / poll_options / votes
//!
//! votes は (PollId, 投票者) をキーに持つため、1 投票につき 1 人 1 票が構造上保証される。

mod message;
mod poll;
mod room;

use std::collections::{BTreeMap, HashMap};

use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, MessageId, Poll, PollId, PollOption, PollOptionId, Room, RoomId,
    Vote,
};

#[derive(Debug, Default)]
struct StoreState {
    rooms: HashMap<RoomId, Room>,
    messages: BTreeMap<MessageId, ChatMessage>,
    polls: HashMap<PollId, Poll>,
    poll_options: HashMap<PollOptionId, PollOption>,
    votes: HashMap<(PollId, ConnectionId), Vote>,
    last_message_id: i64,
    last_poll_id: i64,
    last_option_id: i64,
}

impl StoreState {
    fn next_message_id(&mut self) -> MessageId {
        self.last_message_id += 1;
        MessageId::new(self.last_message_id)
    }

    fn next_poll_id(&mut self) -> PollId {
        self.last_poll_id += 1;
        PollId::new(self.last_poll_id)
    }

    fn next_option_id(&mut self) -> PollOptionId {
        self.last_option_id += 1;
        PollOptionId::new(self.last_option_id)
    }

    /// 条件に一致するメッセージを削除し、付随する投票・選択肢・票も削除する
    fn purge_messages(&mut self, mut doomed: impl FnMut(&ChatMessage) -> bool) -> u64 {
        let before = self.messages.len();
        self.messages.retain(|_, message| !doomed(message));
        let purged = (before - self.messages.len()) as u64;

        let messages = &self.messages;
        self.polls
            .retain(|_, poll| messages.contains_key(&poll.message_id));
        let polls = &self.polls;
        self.poll_options
            .retain(|_, option| polls.contains_key(&option.poll_id));
        self.votes
            .retain(|(poll_id, _), _| polls.contains_key(poll_id));

        purged
    }

    fn options_of(&self, poll_id: PollId) -> impl Iterator<Item = &PollOption> {
        self.poll_options
            .values()
            .filter(move |option| option.poll_id == poll_id)
    }

    fn votes_of(&self, poll_id: PollId) -> impl Iterator<Item = PollOptionId> + '_ {
        self.votes
            .iter()
            .filter(move |((voted_poll, _), _)| *voted_poll == poll_id)
            .map(|(_, vote)| vote.option_id)
    }
}

/// インメモリ実装（ルーム・メッセージ・投票をまとめて保持）
#[derive(Debug, Default)]
pub struct InMemoryChatRepository {
    state: Mutex<StoreState>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されているメッセージの総数
    pub async fn count_messages(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    /// 保存されている投票の総数
    pub async fn count_polls(&self) -> usize {
        self.state.lock().await.polls.len()
    }
}
