//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use async_trait::async_trait;
use futures_util::{
    sink::SinkExt,
    stream::{Stream, StreamExt},
};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{
        ConnectionId, DocumentOperation, FileMetadata, Identity, IdentityVerifier, Notification,
    },
    infrastructure::{
        dto::websocket::{ClientEvent, ClientFrame},
        message_pusher::encode_notification,
    },
    ui::state::AppState,
    usecase::{EditDocumentError, SendMessageError},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// 接続トークン（JWT）
    pub token: Option<String>,
    /// ゲスト時の表示名のヒント
    pub username: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    let identity = resolve_identity(state.identity_verifier.as_ref(), &query);
    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// トークンを検証して本人情報を決める
///
/// トークンがない・検証に失敗した場合は接続を拒否せず、ゲストとして扱う。
fn resolve_identity(verifier: &dyn IdentityVerifier, query: &ConnectQuery) -> Identity {
    let hint = query.username.as_deref();
    let Some(token) = query.token.as_deref().filter(|t| !t.trim().is_empty()) else {
        return Identity::guest(hint);
    };
    match verifier.verify(token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Token rejected, connecting as guest: {}", e);
            Identity::guest(hint)
        }
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// Broadcasts from other connections and replies to this connection share the
/// same channel, so they reach the client in the order they were queued.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Identity) {
    let connection_id = ConnectionId::generate();
    let (sender, receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    // 送信タスクを先に起動しておき、接続直後の通知を取りこぼさない
    let mut send_task = pusher_loop(rx, sender);

    tracing::info!(
        "'{}' connected as {} (connection '{}')",
        identity.username,
        if identity.authenticated {
            "user"
        } else {
            "guest"
        },
        connection_id
    );
    if let Err(e) = state
        .connect_client_usecase
        .execute(connection_id, identity.clone(), tx.clone())
        .await
    {
        tracing::warn!("Failed to greet connection '{}': {}", connection_id, e);
    }

    let session = Session {
        state: state.clone(),
        connection_id,
        identity,
        replies: tx,
    };

    // Spawn a task to receive messages from this client
    let (stop_tx, stop_rx) = oneshot::channel();
    let mut recv_task =
        tokio::spawn(async move { read_frames(receiver, stop_rx, &session).await });

    // 送信側が先に終わった場合は受信を止めるだけで、処理中のイベントは完了させる
    let sender_closed = tokio::select! {
        _ = &mut recv_task => false,
        _ = &mut send_task => true,
    };
    if sender_closed {
        let _ = stop_tx.send(());
        if let Err(e) = recv_task.await {
            tracing::error!("Receive task for '{}' failed: {}", connection_id, e);
        }
    } else {
        send_task.abort();
    }

    state
        .disconnect_client_usecase
        .execute(connection_id)
        .await;
}

/// 受信したテキストフレームの処理先
#[async_trait]
trait TextFrameHandler: Send + Sync {
    async fn handle_text(&self, text: &str);
}

/// Reads frames until the socket closes or `stop` fires.
///
/// `stop` is only observed between frames, so a frame that is being handled
/// always runs to completion.
async fn read_frames<S, E>(
    mut receiver: S,
    mut stop: oneshot::Receiver<()>,
    handler: &dyn TextFrameHandler,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = &mut stop => break,
            next = receiver.next() => next,
        };
        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => handler.handle_text(text.as_str()).await,
            Message::Ping(_) => {
                tracing::debug!("Received ping");
                // Ping/pong is handled automatically by the WebSocket protocol
            }
            Message::Close(_) => {
                tracing::info!("Client requested close");
                break;
            }
            _ => {}
        }
    }
}

/// 失敗したイベントの結果
#[derive(Debug, Clone, PartialEq, Eq)]
struct EventFailure {
    message: String,
    /// Presence レコードが失われていた
    session_missing: bool,
}

impl EventFailure {
    fn rejected(message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
            session_missing: false,
        }
    }

    fn new(message: impl ToString, session_missing: bool) -> Self {
        Self {
            message: message.to_string(),
            session_missing,
        }
    }
}

/// 1 本の WebSocket 接続の受信側
struct Session {
    state: Arc<AppState>,
    connection_id: ConnectionId,
    identity: Identity,
    /// この接続への送信キュー（ack / error の返信用）
    replies: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl TextFrameHandler for Session {
    async fn handle_text(&self, text: &str) {
        let frame = match ClientFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping frame from '{}': {}", self.connection_id, e);
                self.reply(None, Err(EventFailure::rejected(e)));
                return;
            }
        };

        let ack_id = frame.ack_id;
        let outcome = match frame.into_event() {
            Ok(event) => self.dispatch(event).await,
            Err(e) => Err(EventFailure::rejected(e)),
        };

        if let Err(failure) = &outcome {
            tracing::debug!(
                "Event from '{}' failed: {}",
                self.connection_id,
                failure.message
            );
            if failure.session_missing {
                self.state
                    .connect_client_usecase
                    .recover_session(self.connection_id, self.identity.clone())
                    .await;
            }
        }
        self.reply(ack_id, outcome);
    }
}

impl Session {
    async fn dispatch(&self, event: ClientEvent) -> Result<(), EventFailure> {
        let id = self.connection_id;
        match event {
            ClientEvent::JoinRoom(room_id) => self
                .state
                .join_room_usecase
                .execute(id, room_id)
                .await
                .map(|_| ())
                .map_err(|e| EventFailure::new(&e, e.is_session_missing())),
            ClientEvent::Message(payload) => self
                .state
                .send_message_usecase
                .post_message(id, payload.text)
                .await
                .map(|_| ())
                .map_err(|e| EventFailure::new(&e, e.is_session_missing())),
            ClientEvent::FileUpload(payload) => {
                let file = FileMetadata::try_from(payload)
                    .map_err(|e| EventFailure::rejected(SendMessageError::InvalidFile(e)))?;
                self.state
                    .send_message_usecase
                    .post_file(id, file)
                    .await
                    .map(|_| ())
                    .map_err(|e| EventFailure::new(&e, e.is_session_missing()))
            }
            ClientEvent::TypingStart => self
                .state
                .typing_usecase
                .start(id)
                .await
                .map_err(|e| EventFailure::new(&e, e.is_session_missing())),
            ClientEvent::TypingStop => self
                .state
                .typing_usecase
                .stop(id)
                .await
                .map_err(|e| EventFailure::new(&e, e.is_session_missing())),
            ClientEvent::DocumentChange(payload) => {
                let operation = DocumentOperation::try_from(payload)
                    .map_err(|e| EventFailure::rejected(EditDocumentError::InvalidOperation(e)))?;
                self.state
                    .edit_document_usecase
                    .apply_operation(id, operation)
                    .await
                    .map_err(|e| EventFailure::new(&e, e.is_session_missing()))
            }
            ClientEvent::CursorUpdate(payload) => self
                .state
                .edit_document_usecase
                .update_cursor(id, payload.position, payload.color)
                .await
                .map_err(|e| EventFailure::new(&e, e.is_session_missing())),
        }
    }

    /// `ackId` があれば ack を、なければ失敗時のみ error を送信者に返す
    fn reply(&self, ack_id: Option<u64>, outcome: Result<(), EventFailure>) {
        let Some(notification) = reply_notification(ack_id, outcome) else {
            return;
        };
        match encode_notification(&notification) {
            Ok(json) => {
                if self.replies.send(json).is_err() {
                    tracing::debug!("Connection '{}' is closing", self.connection_id);
                }
            }
            Err(e) => tracing::error!("Failed to encode reply: {}", e),
        }
    }
}

fn reply_notification(
    ack_id: Option<u64>,
    outcome: Result<(), EventFailure>,
) -> Option<Notification> {
    match (ack_id, outcome) {
        (Some(ack_id), outcome) => Some(Notification::Ack {
            ack_id,
            result: outcome.map_err(|failure| failure.message),
        }),
        (None, Ok(())) => None,
        (None, Err(failure)) => Some(Notification::Error {
            message: failure.message,
        }),
    }
}
