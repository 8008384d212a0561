//! ルーム状態の永続化
//!
//! - `json_file`: スナップショットを JSON ファイルとして読み書きする `SnapshotStore` 実装
//! - `worker`: 書き込みを 1 つのバックグラウンドタスクに集約する `RoomPersistence` 実装

pub mod json_file;
pub mod worker;

pub use json_file::{JsonFileSnapshotStore, SNAPSHOT_FILE_NAME};
pub use worker::{PersistenceHandle, spawn_persistence_worker};
