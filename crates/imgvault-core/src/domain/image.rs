//! Stored image record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ImageId;

/// A compressed image persisted in a content store.
///
/// Records are created once by the ingestion pipeline and never mutated.
/// `name` is the lookup key and is unique across a store; `source_path` and
/// `directory` are provenance only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: ImageId,

    /// Logical name (the source file's base name).
    pub name: String,

    /// Where the file was read from at ingestion time.
    pub source_path: String,

    /// Directory containing the source file.
    pub directory: String,

    /// Output of `ImageCodec::encode`.
    pub payload: Vec<u8>,

    /// Size of the source file in bytes.
    pub original_size: u64,

    pub ingested_at: DateTime<Utc>,
}

impl StoredImage {
    /// Size of the stored payload in bytes.
    pub fn stored_size(&self) -> u64 {
        self.payload.len() as u64
    }
}
