//! MessageRepository のインメモリ実装

use async_trait::async_trait;

use crate::domain::{
    ChatMessage, MessageId, MessageRepository, NewMessage, RepositoryError, RoomId, Timestamp,
};

use super::InMemoryChatRepository;

#[async_trait]
impl MessageRepository for InMemoryChatRepository {
    async fn save_message(&self, message: NewMessage) -> Result<ChatMessage, RepositoryError> {
        let mut state = self.state.lock().await;
        let id = state.next_message_id();
        let stored = message.into_stored(id);
        state.messages.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_message(&self, id: MessageId) -> Result<Option<ChatMessage>, RepositoryError> {
        Ok(self.state.lock().await.messages.get(&id).cloned())
    }

    async fn get_recent_messages(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let state = self.state.lock().await;
        let mut newest_first: Vec<&ChatMessage> = state
            .messages
            .values()
            .filter(|message| &message.room_id == room_id)
            .collect();
        newest_first.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        newest_first.truncate(limit);

        Ok(newest_first.into_iter().rev().cloned().collect())
    }

    async fn clear_messages_for_room(&self, room_id: &RoomId) -> Result<u64, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .purge_messages(|message| &message.room_id == room_id))
    }

    async fn delete_messages_before(&self, cutoff: Timestamp) -> Result<u64, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .purge_messages(|message| message.created_at < cutoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewPoll, Nickname, PollRepository};

    fn room_id(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn new_message(room: &str, text: &str, at: i64) -> NewMessage {
        NewMessage {
            room_id: room_id(room),
            nickname: Nickname::new("alice".to_string()).unwrap(),
            text: text.to_string(),
            created_at: Timestamp::new(at),
            parent_message_id: None,
            is_highlighted: false,
        }
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        // テスト項目: 保存したメッセージには単調増加する ID が割り当てられる
        // given (前提条件):
        let repository = InMemoryChatRepository::new();

        // when (操作):
        let first = repository
            .save_message(new_message("lobby", "one", 1))
            .await
            .unwrap();
        let second = repository
            .save_message(new_message("lobby", "two", 2))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(second.id > first.id);
        assert_eq!(
            repository.get_message(first.id).await.unwrap(),
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_recent_messages_are_latest_page_in_chronological_order() {
        // テスト項目: 最新 limit 件が古い順で返され、他のルームのメッセージは含まれない
        // given (前提条件):
        let repository = InMemoryChatRepository::new();
        for i in 0..5 {
            repository
                .save_message(new_message("lobby", &format!("m{i}"), 100 + i))
                .await
                .unwrap();
        }
        repository
            .save_message(new_message("other", "elsewhere", 200))
            .await
            .unwrap();

        // when (操作):
        let page = repository
            .get_recent_messages(&room_id("lobby"), 3)
            .await
            .unwrap();

        // then (期待する結果):
        let texts: Vec<&str> = page.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_clear_room_cascades_to_polls() {
        // テスト項目: ルームのメッセージを削除すると付随する投票も削除される
        // given (前提条件):
        let repository = InMemoryChatRepository::new();
        let announcement = repository
            .save_message(new_message("lobby", "Lunch?", 1))
            .await
            .unwrap();
        repository
            .save_message(new_message("other", "keep", 1))
            .await
            .unwrap();
        repository
            .create_poll(NewPoll {
                message_id: announcement.id,
                options: vec!["yes".to_string(), "no".to_string()],
                expires_at: None,
                created_at: Timestamp::new(1),
            })
            .await
            .unwrap();

        // when (操作):
        let purged = repository
            .clear_messages_for_room(&room_id("lobby"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(purged, 1);
        assert_eq!(repository.count_messages().await, 1);
        assert_eq!(repository.count_polls().await, 0);
    }

    #[tokio::test]
    async fn test_delete_messages_before_cutoff() {
        // テスト項目: 基準時刻より古いメッセージのみ削除される
        // given (前提条件):
        let repository = InMemoryChatRepository::new();
        for at in [10, 20, 30] {
            repository
                .save_message(new_message("lobby", "m", at))
                .await
                .unwrap();
        }

        // when (操作):
        let purged = repository
            .delete_messages_before(Timestamp::new(20))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(purged, 1);
        let remaining = repository
            .get_recent_messages(&room_id("lobby"), 10)
            .await
            .unwrap();
        let times: Vec<i64> = remaining.iter().map(|m| m.created_at.value()).collect();
        assert_eq!(times, vec![20, 30]);
    }
}
