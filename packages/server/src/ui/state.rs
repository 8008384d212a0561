//! Shared application state.

use std::{path::PathBuf, sync::Arc};

use tsudoi_shared::time::Clock;

use crate::{
    domain::IdentityVerifier,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, EditDocumentUseCase, GetRoomsUseCase,
        JoinRoomUseCase, SendMessageUseCase, TypingUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// JoinRoomUseCase（ルーム入室のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// SendMessageUseCase（メッセージ・ファイル通知送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// EditDocumentUseCase（ドキュメント編集・カーソル更新のユースケース）
    pub edit_document_usecase: Arc<EditDocumentUseCase>,
    /// TypingUseCase（入力中インジケーターのユースケース）
    pub typing_usecase: Arc<TypingUseCase>,
    /// GetRoomsUseCase（ルーム一覧・詳細取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// 接続トークンの検証
    pub identity_verifier: Arc<dyn IdentityVerifier>,
    /// アップロードされたファイルの保存先
    pub uploads_dir: PathBuf,
    pub clock: Arc<dyn Clock>,
}
