//! 永続化（Persistence Gateway）の実装
//!
//! - `inmemory`: プロセス内メモリ（再起動で消える）

pub mod inmemory;

pub use inmemory::InMemoryChatRepository;
