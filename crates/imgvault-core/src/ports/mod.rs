//! Ports - 抽象化レイヤー
//!
//! 外部システム（MongoDB, control-plane API, ログ基盤, 時計）への
//! インターフェースを定義します。

pub mod clock;
pub mod content_store;
pub mod event_sink;
pub mod id_generator;
pub mod status_source;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::content_store::ContentStore;
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::status_source::StatusSource;
