//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tsudoi_shared::time::Clock;

use crate::{
    config::ServerConfig,
    domain::{
        IdentityVerifier, MessagePusher, PresenceRepository, RoomPersistence, RoomRepository,
        SnapshotStore,
    },
    infrastructure::{
        auth::JwtIdentityVerifier,
        message_pusher::WebSocketMessagePusher,
        persistence::{JsonFileSnapshotStore, PersistenceHandle, spawn_persistence_worker},
        repository::{InMemoryPresenceRepository, InMemoryRoomRepository},
    },
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, EditDocumentUseCase, GetRoomsUseCase,
        JoinRoomUseCase, LeaveRoomUseCase, RestoreRoomsUseCase, RosterBroadcaster,
        SendMessageUseCase, TypingUseCase,
    },
};

use super::{
    handler::{get_room_detail, get_rooms, health_check, upload_file, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket chat server
///
/// Owns the shared state and the persistence worker. Rooms are restored from
/// the snapshot while building, and a final snapshot is written after the
/// listener stops.
///
/// # Example
///
/// ```ignore
/// let server = Server::build(&ServerConfig::default(), Arc::new(SystemClock)).await;
/// server.run("127.0.0.1".to_string(), 3000).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    persistence: PersistenceHandle,
    persistence_task: JoinHandle<()>,
    max_upload_bytes: usize,
}

impl Server {
    /// Wire every layer together
    ///
    /// Initialization order:
    /// 1. Repositories
    /// 2. Snapshot restore (and default rooms)
    /// 3. Persistence worker
    /// 4. MessagePusher
    /// 5. UseCases
    /// 6. AppState
    pub async fn build(config: &ServerConfig, clock: Arc<dyn Clock>) -> Self {
        // 1. Repositories (in-memory)
        let rooms: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new(clock.clone()));
        let presence: Arc<dyn PresenceRepository> = Arc::new(InMemoryPresenceRepository::new());

        // 2. Restore rooms before accepting connections
        let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileSnapshotStore::new(
            &config.persistence.data_dir,
            clock.clone(),
        ));
        RestoreRoomsUseCase::new(rooms.clone(), store.clone())
            .execute()
            .await;

        // 3. Persistence worker
        let (persistence, persistence_task) = spawn_persistence_worker(
            rooms.clone(),
            store,
            config.persistence.debounce,
            config.persistence.save_interval,
        );
        let room_persistence: Arc<dyn RoomPersistence> = Arc::new(persistence.clone());

        // 4. MessagePusher (WebSocket implementation)
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

        // 5. UseCases
        let roster = RosterBroadcaster::new(presence.clone(), rooms.clone(), message_pusher.clone());
        let leave_room = Arc::new(LeaveRoomUseCase::new(
            rooms.clone(),
            presence.clone(),
            message_pusher.clone(),
            room_persistence.clone(),
            roster.clone(),
        ));
        let connect_client_usecase = Arc::new(ConnectClientUseCase::new(
            presence.clone(),
            rooms.clone(),
            message_pusher.clone(),
            roster.clone(),
        ));
        let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(
            presence.clone(),
            message_pusher.clone(),
            roster.clone(),
            leave_room.clone(),
        ));
        let join_room_usecase = Arc::new(JoinRoomUseCase::new(
            rooms.clone(),
            presence.clone(),
            message_pusher.clone(),
            room_persistence.clone(),
            roster,
            leave_room,
        ));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(
            rooms.clone(),
            presence.clone(),
            message_pusher.clone(),
            room_persistence.clone(),
            clock.clone(),
        ));
        let edit_document_usecase = Arc::new(EditDocumentUseCase::new(
            rooms.clone(),
            presence.clone(),
            message_pusher.clone(),
            room_persistence,
        ));
        let typing_usecase = Arc::new(TypingUseCase::new(
            rooms.clone(),
            presence.clone(),
            message_pusher,
        ));
        let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(rooms, presence));

        // 6. AppState
        let identity_verifier: Arc<dyn IdentityVerifier> =
            Arc::new(JwtIdentityVerifier::new(&config.jwt_secret));
        let state = Arc::new(AppState {
            connect_client_usecase,
            disconnect_client_usecase,
            join_room_usecase,
            send_message_usecase,
            edit_document_usecase,
            typing_usecase,
            get_rooms_usecase,
            identity_verifier,
            uploads_dir: config.uploads_dir.clone(),
            clock,
        });

        Self {
            state,
            persistence,
            persistence_task,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Build the axum router
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route(
                "/api/upload",
                post(upload_file).layer(DefaultBodyLimit::max(self.max_upload_bytes)),
            )
            .nest_service("/uploads", ServeDir::new(&self.state.uploads_dir))
            // ブラウザクライアントは別オリジンから接続する
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the WebSocket chat server until Ctrl+C / SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 3000)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves, then
    /// write the final snapshot
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        tracing::info!("Tsudoi server listening on {}", listener.local_addr()?);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Err(e) = self.persistence.shutdown().await {
            tracing::error!("Final snapshot was not written: {}", e);
        }
        if let Err(e) = self.persistence_task.await {
            tracing::error!("Persistence worker panicked: {}", e);
        }
        tracing::info!("Server shutdown complete");

        result
    }
}
