//! EventSink port - イベント記録の抽象化
//!
//! # 実装
//! - TracingEventSink: tracing でログ出力
//! - RecordingEventSink: テスト用にイベントを保持
//! - NoopEventSink: 何もしない

use crate::domain::DomainEvent;

/// EventSink はドメインイベントを受け取る
///
/// 呼び出し側の制御フローを止めないよう、emit は失敗しません。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DomainEvent);
}
