//! Domain 層
//!
//! ビジネスルールと、外部（永続化・通知）へのインターフェースを定義します。
//! Infrastructure 層・UI 層には依存しません。

pub mod entity;
pub mod error;
pub mod event;
pub mod highlight;
pub mod poll;
pub mod pusher;
pub mod rate_limit;
pub mod registry;
pub mod repository;
pub mod session;
pub mod value_object;

pub use entity::*;
pub use error::*;
pub use event::ServerEvent;
pub use highlight::{looks_like_heading, resolve_highlight};
pub use poll::{PollDraft, PollRuleError, tally};
pub use pusher::*;
pub use rate_limit::{RateLimitPolicy, RateLimiter, SlidingWindow};
pub use registry::{Member, Removal, RoomRegistry};
pub use repository::*;
pub use session::Session;
pub use value_object::*;
