//! UseCase: 投票
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - VoteUseCase::execute() メソッド
//! - 改投（1 人 1 票、既存の票は置き換え）と集計結果のブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 同じ投票者の票が常に 1 票に保たれることを保証
//! - 締め切り後の投票が受け付けられないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：初回の投票、別の選択肢への改投
//! - 異常系：締め切り後、存在しない投票、他の投票の選択肢、ID の欠落

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ConnectionId, PollId, PollOptionId, PollRepository, PollResults, ServerEvent, Session,
    Timestamp,
};

use super::{error::VoteError, room_coordinator::RoomCoordinator};

/// 投票の結果
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    pub poll_id: PollId,
    pub option_id: PollOptionId,
    pub results: PollResults,
    /// 既存の票を置き換えたか
    pub changed: bool,
}

pub struct VoteUseCase {
    coordinator: Arc<RoomCoordinator>,
    poll_repository: Arc<dyn PollRepository>,
    clock: Arc<dyn Clock>,
}

impl VoteUseCase {
    pub fn new(
        coordinator: Arc<RoomCoordinator>,
        poll_repository: Arc<dyn PollRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            coordinator,
            poll_repository,
            clock,
        }
    }

    /// 投票を実行
    ///
    /// 投票者は接続 ID で識別される。同じ投票に既に票があれば置き換える。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session: &Session,
        poll_id: Option<i64>,
        option_id: Option<i64>,
    ) -> Result<VoteOutcome, VoteError> {
        let (room_id, _) = session.joined()?;
        let (Some(poll_id), Some(option_id)) = (poll_id, option_id) else {
            return Err(VoteError::InvalidParams(
                "pollId and optionId are required".to_string(),
            ));
        };
        let poll_id = PollId::new(poll_id);
        let option_id = PollOptionId::new(option_id);

        // 1. 投票の存在と締め切りの確認
        let poll = self
            .poll_repository
            .get_poll(poll_id)
            .await?
            .ok_or(VoteError::PollNotFound(poll_id.value()))?;
        let now = Timestamp::new(self.clock.now_millis());
        if poll.is_expired(now) {
            return Err(VoteError::PollExpired(poll_id.value()));
        }

        // 2. 投票（既存の票は置き換え）
        let receipt = self
            .poll_repository
            .cast_vote(poll_id, option_id, connection_id, now)
            .await?;

        // 3. 集計してルーム全員に通知
        let results = self
            .poll_repository
            .get_poll_results(poll_id)
            .await?
            .ok_or(VoteError::PollNotFound(poll_id.value()))?;
        self.coordinator
            .broadcast_to_room(
                room_id,
                &ServerEvent::PollResults {
                    poll_id,
                    message_id: poll.message_id,
                    results: results.clone(),
                    voter: connection_id.clone(),
                    user_vote: option_id,
                },
            )
            .await;

        tracing::debug!(
            "'{}' voted for option {} in poll {} (changed: {})",
            connection_id,
            option_id,
            poll_id,
            receipt.changed
        );
        Ok(VoteOutcome {
            poll_id,
            option_id,
            results,
            changed: receipt.changed,
        })
    }
}
