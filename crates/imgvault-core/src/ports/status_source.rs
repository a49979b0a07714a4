//! StatusSource port - ポーリング対象の現在状態を取得
//!
//! 状態はローカルに保持しません。毎回外部システムから取り直します。

use async_trait::async_trait;

use crate::domain::FetchError;

#[async_trait]
pub trait StatusSource: Send + Sync {
    type State: Send;

    async fn fetch(&self) -> Result<Self::State, FetchError>;
}
