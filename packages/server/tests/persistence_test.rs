//! End-to-end tests of snapshot persistence across restarts.

mod common;

use std::time::Duration;

use common::{TestServer, WsClient};
use serde_json::{Value, json};

#[tokio::test]
async fn test_history_and_document_survive_restart() {
    // テスト項目: 停止時の最終保存により、再起動後もメッセージ履歴とドキュメントが復元される
    // given (前提条件):
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;
    let (mut alice, _) = WsClient::connect_guest(&server, "alice").await;
    alice.join("general").await;
    alice
        .send_with_ack("message", json!({"text": "persist me"}), 1)
        .await;
    alice.expect_event("ack").await;
    alice
        .send_with_ack(
            "document-change",
            json!({"operation": "insert", "position": 0, "text": "draft"}),
            2,
        )
        .await;
    alice.expect_event("ack").await;
    alice.close().await;

    // when (操作):
    server.stop().await;
    let snapshot: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("data").join("rooms.json")).unwrap(),
    )
    .unwrap();
    let restarted = TestServer::start(dir.path()).await;
    let (mut bob, _) = WsClient::connect_guest(&restarted, "bob").await;
    let joined = bob.join("general").await;

    // then (期待する結果):
    assert_eq!(snapshot["general"]["content"], "draft");
    assert_eq!(joined["content"], "draft");
    assert_eq!(joined["messages"][0]["text"], "persist me");
    assert_eq!(joined["messages"][0]["username"], "alice");
    assert!(!dir.path().join("data").join("rooms.json.tmp").exists());

    bob.close().await;
    restarted.stop().await;
}

#[tokio::test]
async fn test_debounced_save_without_shutdown() {
    // テスト項目: 編集後、デバウンス期間が過ぎるとサーバー稼働中にスナップショットが書き込まれる
    // given (前提条件):
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path()).await;
    let (mut alice, _) = WsClient::connect_guest(&server, "alice").await;
    alice.join("random").await;

    // when (操作):
    alice
        .send_with_ack("message", json!({"text": "autosaved"}), 1)
        .await;
    alice.expect_event("ack").await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let snapshot = std::fs::read_to_string(dir.path().join("data").join("rooms.json")).unwrap();

    // then (期待する結果):
    assert!(snapshot.contains("autosaved"));

    alice.close().await;
    server.stop().await;
}
