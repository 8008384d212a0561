//! Persistence worker
//!
//! スナップショットの書き込みを 1 つのバックグラウンドタスクに集約します。
//! 書き込み要求はチャネル経由で受け取り、次の 4 つのタイミングで保存します。
//!
//! - `Debounced`: 最後の要求から `debounce` 経過後（要求のたびに期限を延長）
//! - `Immediate`: 即時。呼び出し元は書き込み完了まで待機する
//! - 定期保存: `save_interval` ごと
//! - シャットダウン: 最終保存を行ってタスクを終了
//!
//! 保存時点のメモリ上の状態をそのまま書き込むため、要求の内容は保持しません。

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::domain::{
    FlushPolicy, PersistenceError, RoomPersistence, RoomRepository, SnapshotStore,
};

enum Command {
    Debounced,
    Immediate(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Persistence worker への送信口
///
/// `RoomPersistence` を実装し、ユースケースから保存要求を受け付けます。
#[derive(Clone)]
pub struct PersistenceHandle {
    sender: mpsc::UnboundedSender<Command>,
}

impl PersistenceHandle {
    /// 最終保存を要求し、完了まで待機する
    pub async fn shutdown(&self) -> Result<(), PersistenceError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.sender
            .send(Command::Shutdown(done_tx))
            .map_err(|_| PersistenceError::WorkerStopped)?;
        done_rx.await.map_err(|_| PersistenceError::WorkerStopped)
    }

    async fn flush_now(&self) -> Result<(), PersistenceError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.sender
            .send(Command::Immediate(done_tx))
            .map_err(|_| PersistenceError::WorkerStopped)?;
        done_rx.await.map_err(|_| PersistenceError::WorkerStopped)
    }
}

#[async_trait]
impl RoomPersistence for PersistenceHandle {
    async fn persist(&self, policy: FlushPolicy) {
        let result = match policy {
            FlushPolicy::Debounced => self
                .sender
                .send(Command::Debounced)
                .map_err(|_| PersistenceError::WorkerStopped),
            FlushPolicy::Immediate => self.flush_now().await,
        };
        if let Err(e) = result {
            tracing::warn!("Persistence request ({:?}) dropped: {}", policy, e);
        }
    }
}

struct PersistenceWorker {
    rooms: Arc<dyn RoomRepository>,
    store: Arc<dyn SnapshotStore>,
    debounce: Duration,
    save_interval: Duration,
    receiver: mpsc::UnboundedReceiver<Command>,
}

/// Persistence worker を起動する
///
/// # Returns
///
/// 保存要求の送信口と、ワーカータスクの JoinHandle
pub fn spawn_persistence_worker(
    rooms: Arc<dyn RoomRepository>,
    store: Arc<dyn SnapshotStore>,
    debounce: Duration,
    save_interval: Duration,
) -> (PersistenceHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let worker = PersistenceWorker {
        rooms,
        store,
        debounce,
        save_interval,
        receiver,
    };
    let join_handle = tokio::spawn(worker.run());
    (PersistenceHandle { sender }, join_handle)
}

impl PersistenceWorker {
    async fn run(mut self) {
        tracing::info!(
            "Persistence worker started (debounce: {:?}, interval: {:?})",
            self.debounce,
            self.save_interval
        );
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.save_interval, self.save_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(Command::Debounced) => {
                        deadline = Some(Instant::now() + self.debounce);
                    }
                    Some(Command::Immediate(done)) => {
                        deadline = None;
                        self.flush("immediate").await;
                        let _ = done.send(());
                    }
                    Some(Command::Shutdown(done)) => {
                        self.flush("shutdown").await;
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        if deadline.is_some() {
                            self.flush("pending").await;
                        }
                        break;
                    }
                },
                _ = wait_until(deadline) => {
                    deadline = None;
                    self.flush("debounced").await;
                }
                _ = ticker.tick() => {
                    self.flush("periodic").await;
                }
            }
        }
        tracing::info!("Persistence worker stopped");
    }

    async fn flush(&self, reason: &str) {
        let rooms = self.rooms.snapshot().await;
        match self.store.save(&rooms).await {
            Ok(()) => tracing::debug!("Snapshot saved ({}, {} room(s))", reason, rooms.len()),
            Err(e) => tracing::error!("Failed to save snapshot ({}): {}", reason, e),
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Room, RoomId},
        infrastructure::repository::InMemoryRoomRepository,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tsudoi_shared::time::SystemClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Debounced 要求が連続しても書き込みは 1 回にまとめられること
    // - Immediate 要求は完了を待ってから戻ること
    // - 定期保存が行われること
    // - シャットダウン時に最終保存が行われること
    // - 保存に失敗してもワーカーは動き続けること
    // ========================================

    #[derive(Default)]
    struct CountingStore {
        saves: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SnapshotStore for CountingStore {
        async fn load(&self) -> Result<Vec<Room>, PersistenceError> {
            Ok(Vec::new())
        }

        async fn save(&self, _rooms: &[Room]) -> Result<(), PersistenceError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PersistenceError::Io(std::io::Error::other("disk full")));
            }
            Ok(())
        }
    }

    async fn rooms() -> Arc<dyn RoomRepository> {
        let repo = InMemoryRoomRepository::new(Arc::new(SystemClock));
        repo.get_or_create(&RoomId::new("general".to_string()).unwrap())
            .await;
        Arc::new(repo)
    }

    #[tokio::test]
    async fn test_debounced_requests_are_coalesced() {
        // テスト項目: 連続した Debounced 要求は 1 回の書き込みにまとめられる
        // given (前提条件):
        let store = Arc::new(CountingStore::default());
        let (handle, _join) = spawn_persistence_worker(
            rooms().await,
            store.clone(),
            Duration::from_millis(100),
            Duration::from_secs(3600),
        );

        // when (操作):
        for _ in 0..5 {
            handle.persist(FlushPolicy::Debounced).await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let before_deadline = store.saves.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(400)).await;

        // then (期待する結果):
        assert_eq!(before_deadline, 0);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_immediate_request_waits_for_write() {
        // テスト項目: Immediate 要求は書き込み完了後に戻り、保留中の Debounced 書き込みを取り消す
        // given (前提条件):
        let store = Arc::new(CountingStore::default());
        let (handle, _join) = spawn_persistence_worker(
            rooms().await,
            store.clone(),
            Duration::from_millis(100),
            Duration::from_secs(3600),
        );
        handle.persist(FlushPolicy::Debounced).await;

        // when (操作):
        handle.persist(FlushPolicy::Immediate).await;
        let after_immediate = store.saves.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(300)).await;

        // then (期待する結果):
        assert_eq!(after_immediate, 1);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_periodic_save() {
        // テスト項目: 要求がなくても一定間隔で保存される
        // given (前提条件):
        let store = Arc::new(CountingStore::default());
        let (_handle, _join) = spawn_persistence_worker(
            rooms().await,
            store.clone(),
            Duration::from_secs(3600),
            Duration::from_millis(50),
        );

        // when (操作):
        tokio::time::sleep(Duration::from_millis(180)).await;

        // then (期待する結果):
        assert!(store.saves.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_and_stops() {
        // テスト項目: シャットダウンで最終保存が行われ、以降の要求は受け付けられない
        // given (前提条件):
        let store = Arc::new(CountingStore::default());
        let (handle, join) = spawn_persistence_worker(
            rooms().await,
            store.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );

        // when (操作):
        let result = handle.shutdown().await;
        join.await.unwrap();
        let second = handle.shutdown().await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert!(matches!(second, Err(PersistenceError::WorkerStopped)));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_worker_running() {
        // テスト項目: 保存に失敗してもワーカーは停止せず、次の要求を処理する
        // given (前提条件):
        let store = Arc::new(CountingStore {
            saves: AtomicUsize::new(0),
            fail: true,
        });
        let (handle, _join) = spawn_persistence_worker(
            rooms().await,
            store.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );

        // when (操作):
        handle.persist(FlushPolicy::Immediate).await;
        handle.persist(FlushPolicy::Immediate).await;

        // then (期待する結果):
        assert_eq!(store.saves.load(Ordering::SeqCst), 2);
    }
}
