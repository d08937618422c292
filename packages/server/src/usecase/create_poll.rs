//! UseCase: 投票の作成
//!
//! 投票のタイトルを本文とするメッセージを保存し、そのメッセージに投票と選択肢を紐付ける。
//! 票数 0 の集計付きで `poll_message` としてルーム全員に通知する。

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ChatMessage, MessageRepository, NewMessage, NewPoll, PollDetail, PollDraft, PollRepository,
    ServerEvent, Session, Timestamp,
};

use super::{error::CreatePollError, room_coordinator::RoomCoordinator};

/// 作成された投票
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPoll {
    /// 投票を告知するメッセージ
    pub message: ChatMessage,
    pub poll: PollDetail,
}

pub struct CreatePollUseCase {
    coordinator: Arc<RoomCoordinator>,
    message_repository: Arc<dyn MessageRepository>,
    poll_repository: Arc<dyn PollRepository>,
    clock: Arc<dyn Clock>,
}

impl CreatePollUseCase {
    pub fn new(
        coordinator: Arc<RoomCoordinator>,
        message_repository: Arc<dyn MessageRepository>,
        poll_repository: Arc<dyn PollRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            coordinator,
            message_repository,
            poll_repository,
            clock,
        }
    }

    /// 投票を作成
    ///
    /// # Arguments
    ///
    /// * `title` - 投票のタイトル（メッセージ本文になる）
    /// * `options` - 選択肢（入力順が表示順になる）
    /// * `expires_at` - 締め切り（Unix ミリ秒、現在より後であること）
    pub async fn execute(
        &self,
        session: &Session,
        title: &str,
        options: &[String],
        expires_at: Option<i64>,
    ) -> Result<CreatedPoll, CreatePollError> {
        let (room_id, nickname) = session.joined()?;

        // 1. 入力の検証
        let now = Timestamp::new(self.clock.now_millis());
        let draft = PollDraft::new(title, options, expires_at.map(Timestamp::new), now)
            .map_err(|e| CreatePollError::InvalidParams(e.to_string()))?;

        // 2. 告知メッセージの保存
        let message = self
            .message_repository
            .save_message(NewMessage {
                room_id: room_id.clone(),
                nickname: nickname.clone(),
                text: draft.title.into_string(),
                created_at: now,
                parent_message_id: None,
                is_highlighted: false,
            })
            .await?;

        // 3. 投票と選択肢の保存
        let poll = self
            .poll_repository
            .create_poll(NewPoll {
                message_id: message.id,
                options: draft.options,
                expires_at: draft.expires_at,
                created_at: now,
            })
            .await?;

        // 4. ルーム全員に通知
        self.coordinator
            .broadcast_to_room(
                room_id,
                &ServerEvent::PollMessage {
                    message: message.clone(),
                    poll: poll.clone(),
                },
            )
            .await;

        tracing::info!(
            "Poll {} created by '{}' in room '{}' with {} options",
            poll.poll.id,
            nickname,
            room_id,
            poll.results.options.len()
        );
        Ok(CreatedPoll { message, poll })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockPollRepository, RepositoryError},
        infrastructure::repository::InMemoryChatRepository,
        usecase::{
            error::ErrorCode,
            testing::{RecordingPusher, build_coordinator, conn, join},
        },
    };
    use hiroba_shared::time::ManualClock;

    struct Fixture {
        usecase: CreatePollUseCase,
        coordinator: Arc<RoomCoordinator>,
        store: Arc<InMemoryChatRepository>,
        pusher: Arc<RecordingPusher>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryChatRepository::new());
        let pusher = Arc::new(RecordingPusher::new());
        let clock = Arc::new(ManualClock::new(50_000));
        let coordinator = build_coordinator(store.clone(), pusher.clone(), clock.clone());
        let usecase =
            CreatePollUseCase::new(coordinator.clone(), store.clone(), store.clone(), clock);
        Fixture {
            usecase,
            coordinator,
            store,
            pusher,
        }
    }

    fn options(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_poll_broadcasts_zero_vote_results() {
        // テスト項目: 投票を作成すると票数 0 の集計付きで poll_message がルーム全員に届く
        // given (前提条件):
        let f = fixture();
        let alice = join(&f.coordinator, "a", "lobby", "alice").await;
        let _bob = join(&f.coordinator, "b", "lobby", "bob").await;
        f.pusher.clear().await;

        // when (操作):
        let created = f
            .usecase
            .execute(
                &alice,
                "  Lunch?  ",
                &options(&["ramen", " sushi "]),
                Some(60_000),
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(created.message.text, "Lunch?");
        assert!(!created.message.is_highlighted);
        assert_eq!(created.poll.poll.message_id, created.message.id);
        assert_eq!(created.poll.poll.expires_at, Some(Timestamp::new(60_000)));
        let texts: Vec<&str> = created
            .poll
            .results
            .options
            .iter()
            .map(|tally| tally.option.text.as_str())
            .collect();
        assert_eq!(texts, vec!["ramen", "sushi"]);
        assert_eq!(created.poll.results.total_votes, 0);
        assert!(
            created
                .poll
                .results
                .options
                .iter()
                .all(|tally| tally.vote_count == 0 && tally.vote_rate == 0.0)
        );

        let expected = ServerEvent::PollMessage {
            message: created.message.clone(),
            poll: created.poll.clone(),
        };
        assert_eq!(f.pusher.events_for(&conn("b")).await, vec![expected]);
        assert_eq!(f.store.count_polls().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_polls_are_rejected_without_side_effects() {
        // テスト項目: 選択肢の数・重複・締め切りが不正な場合は InvalidParams で、何も保存されない
        // given (前提条件):
        let f = fixture();
        let alice = join(&f.coordinator, "a", "lobby", "alice").await;

        // when (操作):
        let too_few = f
            .usecase
            .execute(&alice, "Q", &options(&["only"]), None)
            .await;
        let duplicated = f
            .usecase
            .execute(&alice, "Q", &options(&["a", " a"]), None)
            .await;
        let past = f
            .usecase
            .execute(&alice, "Q", &options(&["a", "b"]), Some(50_000))
            .await;
        let untitled = f
            .usecase
            .execute(&alice, "  ", &options(&["a", "b"]), None)
            .await;

        // then (期待する結果):
        for result in [too_few, duplicated, past, untitled] {
            assert_eq!(result.unwrap_err().code(), "InvalidParams");
        }
        assert_eq!(f.store.count_messages().await, 0);
        assert_eq!(f.store.count_polls().await, 0);
    }

    #[tokio::test]
    async fn test_create_poll_requires_joined_session() {
        // テスト項目: 未入室の接続は NotInRoom
        // given (前提条件):
        let f = fixture();

        // when (操作):
        let result = f
            .usecase
            .execute(&Session::new(), "Q", &options(&["a", "b"]), None)
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().code(), "NotInRoom");
    }

    #[tokio::test]
    async fn test_create_poll_storage_failure() {
        // テスト項目: 投票の保存に失敗すると CreatePollError になり、通知されない
        // given (前提条件):
        let store = Arc::new(InMemoryChatRepository::new());
        let pusher = Arc::new(RecordingPusher::new());
        let clock = Arc::new(ManualClock::new(0));
        let coordinator = build_coordinator(store.clone(), pusher.clone(), clock.clone());
        let mut polls = MockPollRepository::new();
        polls
            .expect_create_poll()
            .returning(|_| Err(RepositoryError::Storage("constraint failed".to_string())));
        let usecase = CreatePollUseCase::new(coordinator.clone(), store, Arc::new(polls), clock);
        let alice = join(&coordinator, "a", "lobby", "alice").await;

        // when (操作):
        let result = usecase
            .execute(&alice, "Q", &options(&["a", "b"]), None)
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().code(), "CreatePollError");
        assert_eq!(pusher.events_for(&conn("a")).await, vec![]);
    }
}
