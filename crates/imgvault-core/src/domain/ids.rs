//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID + ジェネリック実装
//! 画像レコードと取り込み実行（run）はどちらも ULID で識別します。
//! Phantom type パターンで `ImageId` と `RunId` を別の型として扱います。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: 取り込み順に並べられる
//! - **分散生成可能**: 複数の取り込みプロセスが調整なしで生成できる

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"img-", "run-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData なので実行時のサイズは Ulid と同じです。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }

    /// Display 形式（"img-01H..."）から復元
    ///
    /// ストアに文字列で保存された ID を読み戻すときに使います。
    pub fn parse(s: &str) -> Option<Self> {
        let raw = s.strip_prefix(T::prefix())?;
        Ulid::from_string(raw).ok().map(Self::from_ulid)
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// 保存済み画像のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Image {}

impl IdMarker for Image {
    fn prefix() -> &'static str {
        "img-"
    }
}

/// 取り込み実行のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Run {}

impl IdMarker for Run {
    fn prefix() -> &'static str {
        "run-"
    }
}

/// Identifier of a stored image record.
pub type ImageId = Id<Image>;

/// Identifier of one ingestion run (correlates its events and report).
pub type RunId = Id<Run>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let image = ImageId::from_ulid(ulid1);
        let run = RunId::from_ulid(ulid2);

        assert_eq!(image.as_ulid(), ulid1);
        assert_eq!(run.as_ulid(), ulid2);

        assert!(image.to_string().starts_with("img-"));
        assert!(run.to_string().starts_with("run-"));
    }

    #[test]
    fn display_form_parses_back() {
        let id = ImageId::from_ulid(Ulid::new());
        let parsed = ImageId::parse(&id.to_string());
        assert_eq!(parsed, Some(id));
    }

    #[test]
    fn parse_rejects_foreign_prefix() {
        let run = RunId::from_ulid(Ulid::new());
        // run- の文字列は ImageId としては読めない
        assert_eq!(ImageId::parse(&run.to_string()), None);
        assert_eq!(ImageId::parse("img-not-a-ulid"), None);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<ImageId>(), size_of::<Ulid>());
        assert_eq!(size_of::<RunId>(), 16);
    }
}
