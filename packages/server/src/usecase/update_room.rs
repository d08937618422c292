//! UseCase: ルーム情報の更新（作成者のみ）
//!
//! パスワードを変更（設定・解除）すると、そのルームのメッセージは全て削除され、
//! 在室者全員に `room_refresh` が通知されてから新しいルーム情報が通知される。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessageRepository, RoomRepository, RoomUpdate, RoomView, ServerEvent, Session,
};

use super::{error::UpdateRoomError, room_coordinator::RoomCoordinator};

/// パスワード変更時の通知文
pub const ROOM_REFRESH_NOTICE: &str = "The room password has changed and its message history was cleared";

/// 更新内容（None = 変更しない、空文字列 = クリア）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub password: Option<String>,
}

impl RoomEdit {
    fn into_update(self) -> RoomUpdate {
        fn normalize(value: Option<String>) -> Option<Option<String>> {
            value.map(|v| Some(v.trim().to_string()).filter(|v| !v.is_empty()))
        }

        RoomUpdate {
            name: normalize(self.name),
            description: normalize(self.description),
            password: normalize(self.password),
            creator: None,
        }
    }
}

pub struct UpdateRoomUseCase {
    coordinator: Arc<RoomCoordinator>,
    room_repository: Arc<dyn RoomRepository>,
    message_repository: Arc<dyn MessageRepository>,
}

impl UpdateRoomUseCase {
    pub fn new(
        coordinator: Arc<RoomCoordinator>,
        room_repository: Arc<dyn RoomRepository>,
        message_repository: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            coordinator,
            room_repository,
            message_repository,
        }
    }

    /// ルーム情報を更新し、更新した接続から見たルーム情報を返す
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session: &Session,
        edit: RoomEdit,
    ) -> Result<RoomView, UpdateRoomError> {
        let (room_id, _) = session.joined()?;

        // 既定ルームではパスワード欄の指定自体を拒否する（空文字による解除も含め、作成者かどうかに関係なく）
        if room_id.is_default() && edit.password.is_some() {
            return Err(UpdateRoomError::DefaultRoomNoPassword);
        }
        let update = edit.into_update();

        let room = self.room_repository.get_room(room_id).await?;
        let Some(room) = room.filter(|room| room.is_created_by(connection_id)) else {
            return Err(UpdateRoomError::NotCreator);
        };
        if update.is_empty() {
            return Ok(RoomView::of(room_id, Some(&room), connection_id));
        }

        let touches_password = update.touches_password();
        let updated = self.room_repository.update_room(room_id, update).await?;

        if touches_password {
            let purged = self
                .message_repository
                .clear_messages_for_room(room_id)
                .await?;
            tracing::info!(
                "Password of room '{}' changed by '{}', {} messages purged",
                room_id,
                connection_id,
                purged
            );
            self.coordinator
                .broadcast_to_room(
                    room_id,
                    &ServerEvent::RoomRefresh {
                        notice: ROOM_REFRESH_NOTICE.to_string(),
                    },
                )
                .await;
        }

        self.coordinator.broadcast_room_info(&updated).await;
        Ok(RoomView::of(room_id, Some(&updated), connection_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{NewMessage, RepositoryError, Timestamp},
        infrastructure::repository::InMemoryChatRepository,
        usecase::{
            error::ErrorCode,
            testing::{RecordingPusher, build_coordinator, conn, join, nick, room},
        },
    };
    use hiroba_shared::time::ManualClock;

    struct Fixture {
        usecase: UpdateRoomUseCase,
        coordinator: Arc<RoomCoordinator>,
        store: Arc<InMemoryChatRepository>,
        pusher: Arc<RecordingPusher>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryChatRepository::new());
        let pusher = Arc::new(RecordingPusher::new());
        let coordinator =
            build_coordinator(store.clone(), pusher.clone(), Arc::new(ManualClock::new(0)));
        let usecase = UpdateRoomUseCase::new(coordinator.clone(), store.clone(), store.clone());
        Fixture {
            usecase,
            coordinator,
            store,
            pusher,
        }
    }

    async fn say(store: &InMemoryChatRepository, room_id: &str, text: &str) {
        store
            .save_message(NewMessage {
                room_id: room(room_id),
                nickname: nick("alice"),
                text: text.to_string(),
                created_at: Timestamp::new(1),
                parent_message_id: None,
                is_highlighted: false,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_creator_updates_name_and_description() {
        // テスト項目: 作成者は名前と説明を変更でき、メッセージは残り、在室者ごとの room_info が届く
        // given (前提条件):
        let f = fixture();
        let alice = join(&f.coordinator, "a", "lobby", "alice").await;
        let _bob = join(&f.coordinator, "b", "lobby", "bob").await;
        say(&f.store, "lobby", "hello").await;
        f.pusher.clear().await;

        // when (操作):
        let view = f
            .usecase
            .execute(
                &conn("a"),
                &alice,
                RoomEdit {
                    name: Some("  Lobby  ".to_string()),
                    description: Some("".to_string()),
                    password: None,
                },
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(view.name.as_deref(), Some("Lobby"));
        assert_eq!(view.description, None);
        assert!(view.is_creator);
        assert_eq!(f.store.count_messages().await, 1);
        assert_eq!(f.pusher.event_names_for(&conn("a")).await, vec!["room_info"]);
        match &f.pusher.events_for(&conn("b")).await[..] {
            [ServerEvent::RoomInfo(view)] => {
                assert!(!view.is_creator);
                assert_eq!(view.name.as_deref(), Some("Lobby"));
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_password_change_purges_and_refreshes() {
        // テスト項目: パスワードを設定するとメッセージが削除され、room_refresh の後に room_info が届く
        // given (前提条件):
        let f = fixture();
        let alice = join(&f.coordinator, "a", "vault", "alice").await;
        let _bob = join(&f.coordinator, "b", "vault", "bob").await;
        say(&f.store, "vault", "before").await;
        say(&f.store, "lobby", "other room").await;
        f.pusher.clear().await;

        // when (操作):
        let view = f
            .usecase
            .execute(
                &conn("a"),
                &alice,
                RoomEdit {
                    password: Some("secret".to_string()),
                    ..RoomEdit::default()
                },
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert!(view.has_password);
        assert_eq!(
            f.store.get_recent_messages(&room("vault"), 20).await.unwrap(),
            vec![]
        );
        assert_eq!(f.store.count_messages().await, 1);
        assert_eq!(
            f.pusher.event_names_for(&conn("b")).await,
            vec!["room_refresh", "room_info"]
        );
        let stored = f.store.get_room(&room("vault")).await.unwrap().unwrap();
        assert_eq!(stored.password.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_empty_password_removes_it() {
        // テスト項目: 空文字列のパスワードはパスワードの解除として扱われ、削除と通知も行われる
        // given (前提条件):
        let f = fixture();
        let alice = join(&f.coordinator, "a", "vault", "alice").await;
        f.usecase
            .execute(
                &conn("a"),
                &alice,
                RoomEdit {
                    password: Some("secret".to_string()),
                    ..RoomEdit::default()
                },
            )
            .await
            .unwrap();
        f.pusher.clear().await;

        // when (操作):
        let view = f
            .usecase
            .execute(
                &conn("a"),
                &alice,
                RoomEdit {
                    password: Some("  ".to_string()),
                    ..RoomEdit::default()
                },
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!view.has_password);
        assert_eq!(
            f.pusher.event_names_for(&conn("a")).await,
            vec!["room_refresh", "room_info"]
        );
    }

    #[tokio::test]
    async fn test_non_creator_is_rejected() {
        // テスト項目: 作成者以外の更新は NotCreator
        // given (前提条件):
        let f = fixture();
        let _alice = join(&f.coordinator, "a", "lobby", "alice").await;
        let bob = join(&f.coordinator, "b", "lobby", "bob").await;

        // when (操作):
        let result = f
            .usecase
            .execute(
                &conn("b"),
                &bob,
                RoomEdit {
                    name: Some("mine".to_string()),
                    ..RoomEdit::default()
                },
            )
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), UpdateRoomError::NotCreator);
    }

    #[tokio::test]
    async fn test_default_room_rejects_password_for_anyone() {
        // テスト項目: 既定ルームへのパスワード設定は作成者であっても DefaultRoomNoPassword
        // given (前提条件):
        let f = fixture();
        let creator = join(&f.coordinator, "a", "1", "alice").await;
        let guest = join(&f.coordinator, "b", "1", "bob").await;

        // when (操作):
        let edit = RoomEdit {
            password: Some("secret".to_string()),
            ..RoomEdit::default()
        };
        let by_creator = f.usecase.execute(&conn("a"), &creator, edit.clone()).await;
        let by_guest = f.usecase.execute(&conn("b"), &guest, edit).await;

        // then (期待する結果):
        assert_eq!(by_creator.unwrap_err(), UpdateRoomError::DefaultRoomNoPassword);
        assert_eq!(by_guest.unwrap_err(), UpdateRoomError::DefaultRoomNoPassword);
        let stored = f.store.get_room(&room("1")).await.unwrap().unwrap();
        assert_eq!(stored.password, None);
    }

    #[tokio::test]
    async fn test_default_room_rejects_blank_password_and_keeps_history() {
        // テスト項目: 既定ルームでは空文字・空白のみのパスワードも DefaultRoomNoPassword で、履歴は消えない
        // given (前提条件):
        let f = fixture();
        let creator = join(&f.coordinator, "a", "1", "alice").await;
        say(&f.store, "1", "hello").await;
        f.pusher.clear().await;

        // when (操作):
        let empty = f
            .usecase
            .execute(
                &conn("a"),
                &creator,
                RoomEdit {
                    password: Some(String::new()),
                    ..RoomEdit::default()
                },
            )
            .await;
        let blank = f
            .usecase
            .execute(
                &conn("a"),
                &creator,
                RoomEdit {
                    password: Some("   ".to_string()),
                    ..RoomEdit::default()
                },
            )
            .await;

        // then (期待する結果):
        assert_eq!(empty.unwrap_err(), UpdateRoomError::DefaultRoomNoPassword);
        assert_eq!(blank.unwrap_err(), UpdateRoomError::DefaultRoomNoPassword);
        assert_eq!(f.store.count_messages().await, 1);
        assert!(f.pusher.events_for(&conn("a")).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_joined_session() {
        // テスト項目: 未入室の接続は NotInRoom
        // given (前提条件):
        let f = fixture();

        // when (操作):
        let result = f
            .usecase
            .execute(&conn("x"), &Session::new(), RoomEdit::default())
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().code(), "NotInRoom");
    }

    #[tokio::test]
    async fn test_update_storage_failure() {
        // テスト項目: 永続化層の障害は UpdateRoomError
        // given (前提条件):
        let store = Arc::new(InMemoryChatRepository::new());
        let pusher = Arc::new(RecordingPusher::new());
        let coordinator =
            build_coordinator(store.clone(), pusher.clone(), Arc::new(ManualClock::new(0)));
        let alice = join(&coordinator, "a", "lobby", "alice").await;
        let mut rooms = crate::domain::MockRoomRepository::new();
        let snapshot = store.get_room(&room("lobby")).await.unwrap();
        rooms
            .expect_get_room()
            .returning(move |_| Ok(snapshot.clone()));
        rooms
            .expect_update_room()
            .returning(|_, _| Err(RepositoryError::Storage("readonly".to_string())));
        let usecase = UpdateRoomUseCase::new(coordinator, Arc::new(rooms), store);

        // when (操作):
        let result = usecase
            .execute(
                &conn("a"),
                &alice,
                RoomEdit {
                    name: Some("x".to_string()),
                    ..RoomEdit::default()
                },
            )
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().code(), "UpdateRoomError");
        assert_eq!(pusher.event_names_for(&conn("a")).await, Vec::<&str>::new());
    }
}
