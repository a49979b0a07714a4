//! ContentStore port - 画像レコードの正本
//!
//! # 設計原則
//! - name は一意。一意性はバックエンド自身の制約（unique index など）で保証する
//! - 「存在確認してから insert」は禁止（並行 writer で競合するため）
//! - レコードは不変。put は新規作成のみ
//!
//! # 実装
//! - InMemoryContentStore（テスト・dry-run 用）
//! - MongoContentStore（本番用）

use async_trait::async_trait;

use crate::domain::{StoreError, StoredImage};

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// name の一意制約を用意する。起動のたびに呼んでよい（冪等）。
    async fn initialize(&self) -> Result<(), StoreError>;

    /// 新しいレコードを保存する。
    ///
    /// 同じ name が既にあれば `StoreError::DuplicateKey` を返し、何も変更しない。
    async fn put(&self, image: StoredImage) -> Result<(), StoreError>;

    /// name でレコードを取得する。なければ `StoreError::NotFound`。
    async fn get(&self, name: &str) -> Result<StoredImage, StoreError>;
}
