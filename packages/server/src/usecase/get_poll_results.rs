//! UseCase: 投票結果の取得（再表示用）
//!
//! 入室していなくても取得できる。

use std::sync::Arc;

use crate::domain::{ConnectionId, PollId, PollOptionId, PollRepository, PollResults};

use super::error::GetPollResultsError;

#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    pub results: PollResults,
    /// 要求した接続が現在選んでいる選択肢
    pub user_vote: Option<PollOptionId>,
}

pub struct GetPollResultsUseCase {
    poll_repository: Arc<dyn PollRepository>,
}

impl GetPollResultsUseCase {
    pub fn new(poll_repository: Arc<dyn PollRepository>) -> Self {
        Self { poll_repository }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        poll_id: Option<i64>,
    ) -> Result<PollSnapshot, GetPollResultsError> {
        let poll_id = poll_id
            .map(PollId::new)
            .ok_or_else(|| GetPollResultsError::InvalidParams("pollId is required".to_string()))?;

        let results = self
            .poll_repository
            .get_poll_results(poll_id)
            .await?
            .ok_or(GetPollResultsError::PollNotFound(poll_id.value()))?;
        let user_vote = self
            .poll_repository
            .get_user_vote(poll_id, connection_id)
            .await?;

        Ok(PollSnapshot { results, user_vote })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MessageRepository, MockPollRepository, NewMessage, NewPoll, RepositoryError, Timestamp},
        infrastructure::repository::InMemoryChatRepository,
        usecase::{
            error::ErrorCode,
            testing::{conn, nick, room},
        },
    };

    #[tokio::test]
    async fn test_results_include_requesters_vote() {
        // テスト項目: 集計結果と、要求した接続自身の選択が返される
        // given (前提条件):
        let store = Arc::new(InMemoryChatRepository::new());
        let message = store
            .save_message(NewMessage {
                room_id: room("lobby"),
                nickname: nick("alice"),
                text: "Q".to_string(),
                created_at: Timestamp::new(0),
                parent_message_id: None,
                is_highlighted: false,
            })
            .await
            .unwrap();
        let detail = store
            .create_poll(NewPoll {
                message_id: message.id,
                options: vec!["a".to_string(), "b".to_string()],
                expires_at: None,
                created_at: Timestamp::new(0),
            })
            .await
            .unwrap();
        let option_b = detail.results.options[1].option.id;
        store
            .cast_vote(detail.poll.id, option_b, &conn("voter"), Timestamp::new(1))
            .await
            .unwrap();
        let usecase = GetPollResultsUseCase::new(store);

        // when (操作):
        let mine = usecase
            .execute(&conn("voter"), Some(detail.poll.id.value()))
            .await
            .unwrap();
        let theirs = usecase
            .execute(&conn("someone"), Some(detail.poll.id.value()))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(mine.user_vote, Some(option_b));
        assert_eq!(mine.results.total_votes, 1);
        assert_eq!(theirs.user_vote, None);
    }

    #[tokio::test]
    async fn test_missing_or_unknown_poll() {
        // テスト項目: pollId の欠落は InvalidParams、存在しない投票は PollNotFound
        // given (前提条件):
        let usecase = GetPollResultsUseCase::new(Arc::new(InMemoryChatRepository::new()));

        // when (操作):
        let missing = usecase.execute(&conn("x"), None).await;
        let unknown = usecase.execute(&conn("x"), Some(42)).await;

        // then (期待する結果):
        assert_eq!(missing.unwrap_err().code(), "InvalidParams");
        assert_eq!(unknown.unwrap_err(), GetPollResultsError::PollNotFound(42));
    }

    #[tokio::test]
    async fn test_storage_failure() {
        // テスト項目: 永続化層の障害は GetPollResultsError
        // given (前提条件):
        let mut polls = MockPollRepository::new();
        polls
            .expect_get_poll_results()
            .returning(|_| Err(RepositoryError::Storage("busy".to_string())));
        let usecase = GetPollResultsUseCase::new(Arc::new(polls));

        // when (操作):
        let result = usecase.execute(&conn("x"), Some(1)).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().code(), "GetPollResultsError");
    }
}
