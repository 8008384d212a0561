//! End-to-end tests of the WebSocket event protocol.

mod common;

use std::time::{SystemTime, UNIX_EPOCH};

use common::{TEST_JWT_SECRET, TestServer, WsClient};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

#[tokio::test]
async fn test_two_clients_chat_in_general() {
    // テスト項目: 後から入室したクライアントに履歴が届き、その後のメッセージは双方に届く
    // given (前提条件):
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;
    let (mut alice, _) = WsClient::connect_guest(&server, "alice").await;
    let joined = alice.join("general").await;
    assert_eq!(joined["messages"], json!([]));

    // when (操作):
    alice
        .send_with_ack("message", json!({"text": "hi"}), 1)
        .await;
    let own = alice.expect_event("message").await;
    let ack = alice.expect_event("ack").await;

    let (mut bob, _) = WsClient::connect_guest(&server, "bob").await;
    let bob_joined = bob.join("general").await;
    let bob_arrival = alice.expect_event("user-joined").await;

    bob.send("message", json!({"text": "  yo  "})).await;
    let received = alice.expect_event("message").await;

    // then (期待する結果):
    assert_eq!(own["text"], "hi");
    assert_eq!(own["username"], "alice");
    assert_eq!(own["type"], "text");
    assert_eq!(ack, json!({"ackId": 1, "success": true}));
    assert_eq!(bob_joined["messages"][0]["text"], "hi");
    assert_eq!(bob_arrival["username"], "bob");
    assert_eq!(received["text"], "yo");
    assert_eq!(received["roomId"], "general");

    alice.close().await;
    bob.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_failures_are_reported_to_sender() {
    // テスト項目: 未入室での送信・空メッセージ・未知のイベントは送信者にだけ ack / error で報告される
    // given (前提条件):
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;
    let (mut alice, _) = WsClient::connect_guest(&server, "alice").await;

    // when (操作):
    alice
        .send_with_ack("message", json!({"text": "lost"}), 5)
        .await;
    let not_in_room = alice.expect_event("ack").await;

    alice.send("dance", json!({})).await;
    let unknown = alice.expect_event("error").await;

    alice.join("general").await;
    alice
        .send_with_ack("message", json!({"text": "   "}), 6)
        .await;
    let empty = alice.expect_event("ack").await;

    alice.send_raw("not json".to_string()).await;
    let malformed = alice.expect_event("error").await;

    // then (期待する結果):
    assert_eq!(
        not_in_room,
        json!({"ackId": 5, "success": false, "error": "Join a room first"})
    );
    assert!(unknown["message"].as_str().unwrap().contains("dance"));
    assert_eq!(
        empty,
        json!({"ackId": 6, "success": false, "error": "Message text cannot be empty"})
    );
    assert!(malformed["message"].as_str().unwrap().starts_with("malformed frame"));

    alice.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_document_edits_reach_other_members() {
    // テスト項目: 新しいルームの作成が全接続に通知され、ドキュメント編集とカーソルが他のメンバーに届く
    // given (前提条件):
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;
    let (mut alice, _) = WsClient::connect_guest(&server, "alice").await;
    let (mut bob, _) = WsClient::connect_guest(&server, "bob").await;

    // when (操作):
    alice.join("notes").await;
    let rooms = bob.expect_event("rooms-list").await;
    bob.join("notes").await;

    alice
        .send(
            "document-change",
            json!({"operation": "insert", "position": 0, "text": "hello"}),
        )
        .await;
    let update = bob.expect_event("document-updated").await;
    alice
        .send("cursor-update", json!({"position": 5, "color": "#f00"}))
        .await;
    let cursor = bob.expect_event("cursor-updated").await;

    let detail: serde_json::Value = reqwest::get(server.http_url("/api/rooms/notes"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(rooms, json!(["development", "general", "notes", "random"]));
    assert_eq!(update["operation"], "insert");
    assert_eq!(update["text"], "hello");
    assert_eq!(cursor["position"], 5);
    assert_eq!(cursor["username"], "alice");
    assert_eq!(detail["content"], "hello");
    assert_eq!(detail["members"].as_array().unwrap().len(), 2);

    alice.close().await;
    bob.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_typing_indicator_and_leave_on_disconnect() {
    // テスト項目: 入力中の通知が届き、切断したユーザーはルームから退出扱いになる
    // given (前提条件):
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;
    let (mut alice, _) = WsClient::connect_guest(&server, "alice").await;
    let (mut bob, _) = WsClient::connect_guest(&server, "bob").await;
    alice.join("random").await;
    bob.join("random").await;

    // when (操作):
    alice.send("typing-start", json!(null)).await;
    let typing = bob.expect_event("user-typing").await;
    alice.close().await;
    let left = bob.expect_event("user-left").await;
    let roster = bob.expect_event("room-users-updated").await;

    // then (期待する結果):
    assert_eq!(typing["username"], "alice");
    assert_eq!(left["username"], "alice");
    assert_eq!(roster.as_array().unwrap().len(), 1);
    assert_eq!(roster[0]["username"], "bob");

    bob.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_token_identity_and_guest_fallback() {
    // テスト項目: 有効なトークンの本人情報が使われ、不正なトークンはゲストとして接続される
    // given (前提条件):
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;
    let exp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() + 3600;
    let token = encode(
        &Header::default(),
        &json!({"userId": "user-42", "email": "carol@example.com", "exp": exp}),
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    // when (操作):
    let mut carol = WsClient::connect(&server.ws_url(&format!("token={}", token))).await;
    let carol_me = carol.expect_event("user-connected").await;
    let mut guest = WsClient::connect(&server.ws_url("token=garbage&username=dave")).await;
    let guest_me = guest.expect_event("user-connected").await;

    // then (期待する結果):
    assert_eq!(carol_me["userId"], "user-42");
    assert_eq!(carol_me["username"], "carol");
    assert_ne!(guest_me["userId"], "user-42");
    assert_eq!(guest_me["username"], "dave");

    carol.close().await;
    guest.close().await;
    server.stop().await;
}
