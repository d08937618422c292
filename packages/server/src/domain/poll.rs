//! 投票の作成ルールと集計
//!
//! - 選択肢は 2〜10 個、各選択肢は空白除去後に 1〜100 文字、重複不可
//! - 締め切りは（指定する場合）現在時刻より後
//! - 得票率 = 得票数 / 総数（総数 0 のときは 0）

use std::collections::HashMap;

use thiserror::Error;

use super::{
    MessageText, OptionTally, PollId, PollOption, PollOptionId, PollResults, Timestamp,
    ValueObjectError,
};

pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 10;
pub const MAX_OPTION_CHARS: usize = 100;

/// 投票作成時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollRuleError {
    #[error("poll title: {0}")]
    InvalidTitle(ValueObjectError),

    #[error("a poll needs between {min} and {max} options, got {got}")]
    OptionCount { min: usize, max: usize, got: usize },

    #[error("option {position} must not be empty")]
    EmptyOption { position: usize },

    #[error("option {position} must be at most {max} characters")]
    OptionTooLong { position: usize, max: usize },

    #[error("option '{0}' appears more than once")]
    DuplicateOption(String),

    #[error("expiresAt must be in the future")]
    ExpiryNotInFuture,
}

/// 検証済みの投票内容
#[derive(Debug, Clone, PartialEq)]
pub struct PollDraft {
    pub title: MessageText,
    pub options: Vec<String>,
    pub expires_at: Option<Timestamp>,
}

impl PollDraft {
    /// 入力を検証して PollDraft を作成（タイトルと選択肢は空白除去される）
    pub fn new(
        title: &str,
        options: &[String],
        expires_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<Self, PollRuleError> {
        let title =
            MessageText::new(title.trim().to_string()).map_err(PollRuleError::InvalidTitle)?;

        if !(MIN_POLL_OPTIONS..=MAX_POLL_OPTIONS).contains(&options.len()) {
            return Err(PollRuleError::OptionCount {
                min: MIN_POLL_OPTIONS,
                max: MAX_POLL_OPTIONS,
                got: options.len(),
            });
        }

        let mut accepted: Vec<String> = Vec::with_capacity(options.len());
        for (i, raw) in options.iter().enumerate() {
            let position = i + 1;
            let text = raw.trim();
            if text.is_empty() {
                return Err(PollRuleError::EmptyOption { position });
            }
            if text.chars().count() > MAX_OPTION_CHARS {
                return Err(PollRuleError::OptionTooLong {
                    position,
                    max: MAX_OPTION_CHARS,
                });
            }
            if accepted.iter().any(|existing| existing == text) {
                return Err(PollRuleError::DuplicateOption(text.to_string()));
            }
            accepted.push(text.to_string());
        }

        if expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(PollRuleError::ExpiryNotInFuture);
        }

        Ok(Self {
            title,
            options: accepted,
            expires_at,
        })
    }
}

/// 選択肢と票（選択肢 ID の列）から集計結果を作る
///
/// 選択肢は `index` 順に並べ替えられる。どの選択肢にも属さない票は数えない。
pub fn tally<'a>(
    poll_id: PollId,
    options: impl IntoIterator<Item = &'a PollOption>,
    votes: impl IntoIterator<Item = PollOptionId>,
) -> PollResults {
    let mut options: Vec<&PollOption> = options.into_iter().collect();
    options.sort_by_key(|option| option.index);

    let mut counts: HashMap<PollOptionId, u64> =
        options.iter().map(|option| (option.id, 0)).collect();
    for option_id in votes {
        if let Some(count) = counts.get_mut(&option_id) {
            *count += 1;
        }
    }

    let total_votes: u64 = counts.values().sum();
    let options = options
        .into_iter()
        .map(|option| {
            let vote_count = counts.get(&option.id).copied().unwrap_or(0);
            let vote_rate = if total_votes == 0 {
                0.0
            } else {
                vote_count as f64 / total_votes as f64
            };
            OptionTally {
                option: option.clone(),
                vote_count,
                vote_rate,
            }
        })
        .collect();

    PollResults {
        poll_id,
        options,
        total_votes,
    }
}
