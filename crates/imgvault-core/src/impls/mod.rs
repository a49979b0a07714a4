//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryContentStore**: 開発・テスト用のコンテンツストア
//! - **MongoContentStore**: 本番用のコンテンツストア
//! - **HttpJsonSource**: control-plane API のステータス取得
//! - **TracingEventSink / RecordingEventSink / NoopEventSink**

pub mod event_sinks;
pub mod http_status;
pub mod inmem_store;
pub mod mongo_store;

pub use self::event_sinks::{NoopEventSink, RecordingEventSink, TracingEventSink};
pub use self::http_status::HttpJsonSource;
pub use self::inmem_store::InMemoryContentStore;
pub use self::mongo_store::MongoContentStore;
