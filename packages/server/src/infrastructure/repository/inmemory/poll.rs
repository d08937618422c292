//! PollRepository のインメモリ実装

use async_trait::async_trait;

use crate::domain::{
    ConnectionId, NewPoll, Poll, PollDetail, PollId, PollOption, PollOptionId, PollRepository,
    PollResults, RepositoryError, Timestamp, Vote, VoteReceipt, tally,
};

use super::{InMemoryChatRepository, StoreState};

impl StoreState {
    fn results_of(&self, poll_id: PollId) -> PollResults {
        tally(poll_id, self.options_of(poll_id), self.votes_of(poll_id))
    }
}

#[async_trait]
impl PollRepository for InMemoryChatRepository {
    async fn create_poll(&self, poll: NewPoll) -> Result<PollDetail, RepositoryError> {
        let mut state = self.state.lock().await;

        if !state.messages.contains_key(&poll.message_id) {
            return Err(RepositoryError::Storage(format!(
                "message {} does not exist",
                poll.message_id
            )));
        }
        if state
            .polls
            .values()
            .any(|existing| existing.message_id == poll.message_id)
        {
            return Err(RepositoryError::UniqueViolation(format!(
                "message {} already has a poll",
                poll.message_id
            )));
        }

        let poll_id = state.next_poll_id();
        let stored = Poll {
            id: poll_id,
            message_id: poll.message_id,
            expires_at: poll.expires_at,
            created_at: poll.created_at,
        };
        state.polls.insert(poll_id, stored.clone());

        for (index, text) in (0u32..).zip(poll.options) {
            let id = state.next_option_id();
            state.poll_options.insert(
                id,
                PollOption {
                    id,
                    poll_id,
                    text,
                    index,
                },
            );
        }

        Ok(PollDetail {
            results: state.results_of(poll_id),
            poll: stored,
        })
    }

    async fn get_poll(&self, poll_id: PollId) -> Result<Option<Poll>, RepositoryError> {
        Ok(self.state.lock().await.polls.get(&poll_id).cloned())
    }

    async fn get_poll_results(
        &self,
        poll_id: PollId,
    ) -> Result<Option<PollResults>, RepositoryError> {
        let state = self.state.lock().await;
        if !state.polls.contains_key(&poll_id) {
            return Ok(None);
        }
        Ok(Some(state.results_of(poll_id)))
    }

    async fn cast_vote(
        &self,
        poll_id: PollId,
        option_id: PollOptionId,
        voter: &ConnectionId,
        at: Timestamp,
    ) -> Result<VoteReceipt, RepositoryError> {
        let mut state = self.state.lock().await;

        if !state.polls.contains_key(&poll_id) {
            return Err(RepositoryError::PollNotFound(poll_id.value()));
        }
        if state
            .poll_options
            .get(&option_id)
            .is_none_or(|option| option.poll_id != poll_id)
        {
            return Err(RepositoryError::OptionNotInPoll {
                poll_id: poll_id.value(),
                option_id: option_id.value(),
            });
        }

        let previous = state.votes.insert(
            (poll_id, voter.clone()),
            Vote {
                option_id,
                voter: voter.clone(),
                created_at: at,
            },
        );

        Ok(VoteReceipt {
            changed: previous.is_some(),
        })
    }

    async fn get_user_vote(
        &self,
        poll_id: PollId,
        voter: &ConnectionId,
    ) -> Result<Option<PollOptionId>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .votes
            .get(&(poll_id, voter.clone()))
            .map(|vote| vote.option_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, MessageRepository, NewMessage, Nickname, RoomId};

    async fn repository_with_poll(options: &[&str]) -> (InMemoryChatRepository, PollDetail) {
        let repository = InMemoryChatRepository::new();
        let message = repository
            .save_message(NewMessage {
                room_id: RoomId::new("lobby".to_string()).unwrap(),
                nickname: Nickname::new("alice".to_string()).unwrap(),
                text: "Lunch?".to_string(),
                created_at: Timestamp::new(1),
                parent_message_id: None,
                is_highlighted: false,
            })
            .await
            .unwrap();
        let detail = repository
            .create_poll(NewPoll {
                message_id: message.id,
                options: options.iter().map(|o| o.to_string()).collect(),
                expires_at: None,
                created_at: Timestamp::new(1),
            })
            .await
            .unwrap();
        (repository, detail)
    }

    fn voter(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_poll_keeps_option_order_with_zero_votes() {
        // テスト項目: 作成した投票の選択肢は入力順で、票数 0 の集計が返される
        // given (前提条件):

        // when (操作):
        let (_repository, detail) = repository_with_poll(&["ramen", "sushi", "curry"]).await;

        // then (期待する結果):
        let texts: Vec<&str> = detail
            .results
            .options
            .iter()
            .map(|t| t.option.text.as_str())
            .collect();
        assert_eq!(texts, vec!["ramen", "sushi", "curry"]);
        assert_eq!(detail.results.total_votes, 0);
        assert!(detail.results.options.iter().all(|t| t.vote_rate == 0.0));
    }

    #[tokio::test]
    async fn test_create_poll_requires_existing_message() {
        // テスト項目: 存在しないメッセージには投票を作成できない
        // given (前提条件):
        let repository = InMemoryChatRepository::new();

        // when (操作):
        let result = repository
            .create_poll(NewPoll {
                message_id: MessageId::new(99),
                options: vec!["a".to_string(), "b".to_string()],
                expires_at: None,
                created_at: Timestamp::new(1),
            })
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::Storage(_))));
    }

    #[tokio::test]
    async fn test_change_vote_keeps_single_vote_per_voter() {
        // テスト項目: A に投票してから B に投票すると、票は B の 1 票のみになる
        // given (前提条件):
        let (repository, detail) = repository_with_poll(&["a", "b"]).await;
        let poll_id = detail.poll.id;
        let a = detail.results.options[0].option.id;
        let b = detail.results.options[1].option.id;
        repository
            .cast_vote(poll_id, a, &voter("v2"), Timestamp::new(2))
            .await
            .unwrap();

        // when (操作):
        let first = repository
            .cast_vote(poll_id, a, &voter("v1"), Timestamp::new(3))
            .await
            .unwrap();
        let second = repository
            .cast_vote(poll_id, b, &voter("v1"), Timestamp::new(4))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!first.changed);
        assert!(second.changed);
        let results = repository.get_poll_results(poll_id).await.unwrap().unwrap();
        assert_eq!(results.total_votes, 2);
        assert_eq!(results.count_for(a), Some(1));
        assert_eq!(results.count_for(b), Some(1));
        assert_eq!(
            repository.get_user_vote(poll_id, &voter("v1")).await.unwrap(),
            Some(b)
        );
    }

    #[tokio::test]
    async fn test_vote_rejects_unknown_poll_and_foreign_option() {
        // テスト項目: 存在しない投票・他の投票の選択肢への投票はエラー
        // given (前提条件):
        let (repository, detail) = repository_with_poll(&["a", "b"]).await;

        // when (操作):
        let unknown_poll = repository
            .cast_vote(
                PollId::new(999),
                detail.results.options[0].option.id,
                &voter("v1"),
                Timestamp::new(2),
            )
            .await;
        let foreign_option = repository
            .cast_vote(
                detail.poll.id,
                PollOptionId::new(999),
                &voter("v1"),
                Timestamp::new(2),
            )
            .await;

        // then (期待する結果):
        assert_eq!(unknown_poll, Err(RepositoryError::PollNotFound(999)));
        assert_eq!(
            foreign_option,
            Err(RepositoryError::OptionNotInPoll {
                poll_id: detail.poll.id.value(),
                option_id: 999
            })
        );
    }

    #[tokio::test]
    async fn test_results_of_missing_poll_is_none() {
        // テスト項目: 存在しない投票の集計は None
        // given (前提条件):
        let repository = InMemoryChatRepository::new();

        // when (操作):
        let results = repository.get_poll_results(PollId::new(1)).await.unwrap();

        // then (期待する結果):
        assert_eq!(results, None);
    }
}
