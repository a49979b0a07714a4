//! App - アプリケーション層
//!
//! ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **ImageFiles**: 取り込み対象ファイルの遅延列挙
//! - **IngestPipeline**: discover → read → encode → put（1 ファイルの失敗で止まらない）
//! - **restore_image**: get → decode → ファイル書き出し
//! - **Poller**: 条件を満たすまで一定間隔で fetch
//! - **Readiness**: cluster / online archive の判定

pub mod discovery;
pub mod ingest;
pub mod poll;
pub mod readiness;
pub mod restore;

pub use self::discovery::{IMAGE_EXTENSIONS, ImageFiles, is_image_path};
pub use self::ingest::{IngestPipeline, IngestRun};
pub use self::poll::{PollOutcome, PollPolicy, Poller};
pub use self::readiness::Readiness;
pub use self::restore::restore_image;
