//! Errors - エラー型と分類
//!
//! 各コンポーネントのエラーは `kind()` で運用上の分類（ErrorKind）を返します。
//! 取り込みパイプラインはこの分類をファイル単位の失敗レポートに記録します。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ErrorKind は実行エラーの分類
///
/// - Transient: 一時的なエラー（リトライ推奨）
/// - Permanent: 恒久的なエラー（リトライ無意味）
/// - Infrastructure: インフラエラー（DB / ファイルシステムの障害）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// Codec failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input bytes are not an image we can decode.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// Stored bytes failed decompression or are not a valid canonical image.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Permanent
    }
}

/// Content store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An image with this name is already stored. Nothing was written.
    #[error("duplicate key: an image named '{0}' is already stored")]
    DuplicateKey(String),

    #[error("not found: no image named '{0}'")]
    NotFound(String),

    /// The backing store failed (connection, auth, malformed document, ...).
    #[error("content store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::DuplicateKey(_) | StoreError::NotFound(_) => ErrorKind::Permanent,
            StoreError::Backend(_) => ErrorKind::Infrastructure,
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }
}

/// Failure to fetch the current state of a polled resource.
///
/// Every variant is transient: the poller logs it and tries again.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response could not be decoded: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Transient
    }
}

/// Reasons a poll ends without the predicate holding.
///
/// Only reachable when the caller opts into a bound or a cancellation signal.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("resource not ready after {attempts} attempts")]
    AttemptsExhausted { attempts: u32 },

    #[error("resource not ready within {deadline:?} ({attempts} attempts)")]
    DeadlineExceeded { deadline: Duration, attempts: u32 },

    #[error("polling cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl PollError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PollError::Cancelled { .. } => ErrorKind::Permanent,
            _ => ErrorKind::Transient,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollError::AttemptsExhausted { attempts }
            | PollError::DeadlineExceeded { attempts, .. }
            | PollError::Cancelled { attempts } => *attempts,
        }
    }
}

/// A failure confined to one file of an ingestion run.
#[derive(Debug, Error)]
pub enum FileError {
    /// Directory traversal failed for an entry (permissions, vanished file, ...).
    #[error("cannot walk {}: {message}", display_opt(path.as_deref()))]
    Walk {
        path: Option<PathBuf>,
        message: String,
    },

    /// The base name is not valid UTF-8 and cannot be used as a record name.
    #[error("{}: file name is not valid UTF-8", path.display())]
    InvalidName { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("{}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

impl FileError {
    pub fn path(&self) -> Option<&Path> {
        match self {
            FileError::Walk { path, .. } => path.as_deref(),
            FileError::InvalidName { path }
            | FileError::Io { path, .. }
            | FileError::Codec { path, .. }
            | FileError::Store { path, .. } => Some(path),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FileError::Walk { .. } | FileError::Io { .. } => ErrorKind::Infrastructure,
            FileError::InvalidName { .. } => ErrorKind::Permanent,
            FileError::Codec { source, .. } => source.kind(),
            FileError::Store { source, .. } => source.kind(),
        }
    }
}

fn display_opt(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Failures while restoring a stored image to disk.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("cannot write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
}

impl RestoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RestoreError::Store(e) => e.kind(),
            RestoreError::Codec(e) => e.kind(),
            RestoreError::Write { .. } => ErrorKind::Infrastructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_kinds() {
        assert_eq!(
            StoreError::DuplicateKey("a.png".into()).kind(),
            ErrorKind::Permanent
        );
        assert_eq!(
            StoreError::Backend("connection reset".into()).kind(),
            ErrorKind::Infrastructure
        );
        assert!(StoreError::DuplicateKey("a.png".into()).is_duplicate_key());
        assert!(!StoreError::NotFound("a.png".into()).is_duplicate_key());
    }

    #[test]
    fn file_error_delegates_kind_and_path() {
        let err = FileError::Codec {
            path: PathBuf::from("/tmp/x.png"),
            source: CodecError::UnsupportedInput("garbage".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert_eq!(err.path(), Some(Path::new("/tmp/x.png")));
        assert!(err.to_string().starts_with("/tmp/x.png: unsupported input"));

        let walk = FileError::Walk {
            path: None,
            message: "permission denied".into(),
        };
        assert_eq!(walk.path(), None);
        assert_eq!(walk.to_string(), "cannot walk <unknown>: permission denied");
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let s = serde_json::to_string(&ErrorKind::Infrastructure).unwrap();
        assert_eq!(s, "\"infrastructure\"");
    }
}
