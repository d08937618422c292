//! Server state and dependency wiring.

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::{
    config::ChatConfig,
    domain::RateLimiter,
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryChatRepository},
    usecase::{
        ConnectParticipantUseCase, CreatePollUseCase, DisconnectParticipantUseCase,
        GetPollResultsUseCase, GetRecentMessagesUseCase, GetRoomInfoUseCase, GetRoomUsersUseCase,
        JoinRoomUseCase, LeaveRoomUseCase, PurgeExpiredMessagesUseCase, RoomCoordinator,
        SendMessageUseCase, UpdateRoomUseCase, VoteUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub get_room_info_usecase: Arc<GetRoomInfoUseCase>,
    pub update_room_usecase: Arc<UpdateRoomUseCase>,
    pub create_poll_usecase: Arc<CreatePollUseCase>,
    pub vote_usecase: Arc<VoteUseCase>,
    pub get_poll_results_usecase: Arc<GetPollResultsUseCase>,
    /// HTTP API 用
    pub get_recent_messages_usecase: Arc<GetRecentMessagesUseCase>,
    pub get_room_users_usecase: Arc<GetRoomUsersUseCase>,
    /// バックグラウンドの保持期間スイープ
    pub purge_expired_messages_usecase: Arc<PurgeExpiredMessagesUseCase>,
    /// 生存確認の応答（ack）を受け渡すため、具体型で保持する
    pub message_pusher: Arc<WebSocketMessagePusher>,
}

impl AppState {
    /// インメモリの永続化と WebSocket の MessagePusher で全 UseCase を組み立てる
    pub fn build(config: &ChatConfig, clock: Arc<dyn Clock>) -> Self {
        // Initialize dependencies in order:
        // 1. Repository
        // 2. MessagePusher
        // 3. Domain services (RateLimiter, RoomCoordinator)
        // 4. UseCases

        // 1. Create Repository (in-memory database)
        let repository = Arc::new(InMemoryChatRepository::new());

        // 2. Create MessagePusher (WebSocket implementation, also the liveness probe)
        let message_pusher = Arc::new(WebSocketMessagePusher::new());

        // 3. Create domain services
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit, clock.clone()));
        let coordinator = Arc::new(RoomCoordinator::new(
            repository.clone(),
            repository.clone(),
            message_pusher.clone(),
            message_pusher.clone(),
            config.probe_timeout,
            clock.clone(),
        ));

        // 4. Create UseCases
        let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
            message_pusher.clone(),
            rate_limiter.clone(),
        ));
        let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
            coordinator.clone(),
            rate_limiter.clone(),
            message_pusher.clone(),
        ));
        let join_room_usecase = Arc::new(JoinRoomUseCase::new(
            coordinator.clone(),
            repository.clone(),
            message_pusher.clone(),
            config.history_limit,
        ));
        let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(coordinator.clone()));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(
            coordinator.clone(),
            repository.clone(),
            rate_limiter,
            clock.clone(),
        ));
        let get_room_info_usecase = Arc::new(GetRoomInfoUseCase::new(repository.clone()));
        let update_room_usecase = Arc::new(UpdateRoomUseCase::new(
            coordinator.clone(),
            repository.clone(),
            repository.clone(),
        ));
        let create_poll_usecase = Arc::new(CreatePollUseCase::new(
            coordinator.clone(),
            repository.clone(),
            repository.clone(),
            clock.clone(),
        ));
        let vote_usecase = Arc::new(VoteUseCase::new(
            coordinator.clone(),
            repository.clone(),
            clock.clone(),
        ));
        let get_poll_results_usecase = Arc::new(GetPollResultsUseCase::new(repository.clone()));
        let get_recent_messages_usecase =
            Arc::new(GetRecentMessagesUseCase::new(repository.clone()));
        let get_room_users_usecase = Arc::new(GetRoomUsersUseCase::new(coordinator));
        let purge_expired_messages_usecase = Arc::new(PurgeExpiredMessagesUseCase::new(
            repository,
            clock,
            config.retention_millis(),
        ));

        Self {
            connect_participant_usecase,
            disconnect_participant_usecase,
            join_room_usecase,
            leave_room_usecase,
            send_message_usecase,
            get_room_info_usecase,
            update_room_usecase,
            create_poll_usecase,
            vote_usecase,
            get_poll_results_usecase,
            get_recent_messages_usecase,
            get_room_users_usecase,
            purge_expired_messages_usecase,
            message_pusher,
        }
    }
}
