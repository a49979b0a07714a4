//! MongoContentStore - MongoDB 上のコンテンツストア（本番用）
//!
//! # 一意性
//! - `name` に unique index を張る（initialize、冪等）
//! - insert_one が duplicate key（code 11000）で失敗したら DuplicateKey に変換
//! - アプリ側で事前の存在確認はしない

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{Binary, DateTime as BsonDateTime, doc};
use mongodb::error::{ErrorKind as MongoErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::domain::{ImageId, StoreError, StoredImage};
use crate::ports::ContentStore;

const DUPLICATE_KEY_CODE: i32 = 11000;
const NAME_INDEX: &str = "name_unique";

/// Shape of a record inside the collection.
#[derive(Debug, Serialize, Deserialize)]
struct ImageDocument {
    image_id: String,
    name: String,
    source_path: String,
    directory: String,
    payload: Binary,
    original_size: i64,
    ingested_at: BsonDateTime,
}

impl From<StoredImage> for ImageDocument {
    fn from(image: StoredImage) -> Self {
        Self {
            image_id: image.id.to_string(),
            name: image.name,
            source_path: image.source_path,
            directory: image.directory,
            payload: Binary {
                subtype: BinarySubtype::Generic,
                bytes: image.payload,
            },
            original_size: i64::try_from(image.original_size).unwrap_or(i64::MAX),
            ingested_at: BsonDateTime::from_millis(image.ingested_at.timestamp_millis()),
        }
    }
}

impl TryFrom<ImageDocument> for StoredImage {
    type Error = StoreError;

    fn try_from(doc: ImageDocument) -> Result<Self, Self::Error> {
        let id = ImageId::parse(&doc.image_id).ok_or_else(|| {
            StoreError::Backend(format!(
                "malformed image_id '{}' for '{}'",
                doc.image_id, doc.name
            ))
        })?;
        let ingested_at: DateTime<Utc> =
            DateTime::from_timestamp_millis(doc.ingested_at.timestamp_millis()).ok_or_else(
                || StoreError::Backend(format!("ingested_at out of range for '{}'", doc.name)),
            )?;
        Ok(Self {
            id,
            name: doc.name,
            source_path: doc.source_path,
            directory: doc.directory,
            payload: doc.payload.bytes,
            original_size: u64::try_from(doc.original_size).unwrap_or(0),
            ingested_at,
        })
    }
}

pub struct MongoContentStore {
    collection: Collection<ImageDocument>,
}

impl MongoContentStore {
    /// Connect and ping so that a bad URI or unreachable cluster fails here,
    /// before any file is processed.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.uri).await.map_err(backend)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(backend)?;
        info!(
            database = %config.database,
            collection = %config.collection,
            "connected to content store"
        );

        let collection = client
            .database(&config.database)
            .collection::<ImageDocument>(&config.collection);
        Ok(Self { collection })
    }
}

#[async_trait]
impl ContentStore for MongoContentStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(
                IndexOptions::builder()
                    .name(NAME_INDEX.to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        // 同じ定義の index が既にあれば何もしない
        let created = self.collection.create_index(index).await.map_err(backend)?;
        debug!(index = %created.index_name, "unique name index ensured");
        Ok(())
    }

    async fn put(&self, image: StoredImage) -> Result<(), StoreError> {
        let name = image.name.clone();
        match self.collection.insert_one(ImageDocument::from(image)).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::DuplicateKey(name)),
            Err(e) => Err(backend(e)),
        }
    }

    async fn get(&self, name: &str) -> Result<StoredImage, StoreError> {
        let found = self
            .collection
            .find_one(doc! { "name": name })
            .await
            .map_err(backend)?;
        match found {
            Some(document) => StoredImage::try_from(document),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        MongoErrorKind::Write(failure) => is_duplicate_write(failure),
        _ => false,
    }
}

/// Only a per-document write error can carry the unique-index violation.
fn is_duplicate_write(failure: &WriteFailure) -> bool {
    match failure {
        WriteFailure::WriteError(write_error) => write_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn backend(err: mongodb::error::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mongodb::error::WriteError;
    use rstest::rstest;
    use ulid::Ulid;

    /// A write error as the server reports it for `insert_one`.
    fn server_write_error(code: i32, code_name: &str) -> WriteError {
        mongodb::bson::from_document(doc! {
            "index": 0,
            "code": code,
            "codeName": code_name,
            "errmsg": format!("E{code} {code_name} collection: imgvault.images index: name_unique"),
        })
        .unwrap()
    }

    #[rstest]
    #[case::duplicate_key(11000, "DuplicateKey", true)]
    #[case::validation(121, "DocumentValidationFailure", false)]
    #[case::too_large(10334, "BSONObjectTooLarge", false)]
    fn only_code_11000_is_a_duplicate(
        #[case] code: i32,
        #[case] code_name: &str,
        #[case] expected: bool,
    ) {
        let failure = WriteFailure::WriteError(server_write_error(code, code_name));
        assert_eq!(is_duplicate_write(&failure), expected);

        let err = mongodb::error::Error::from(MongoErrorKind::Write(failure));
        assert_eq!(is_duplicate_key(&err), expected);
    }

    #[test]
    fn document_conversion_roundtrip() {
        let image = StoredImage {
            id: ImageId::from_ulid(Ulid::new()),
            name: "logo.png".to_string(),
            source_path: "/in/brand/logo.png".to_string(),
            directory: "/in/brand".to_string(),
            payload: vec![1, 2, 3, 4],
            original_size: 2048,
            ingested_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
        };

        let document = ImageDocument::from(image.clone());
        assert_eq!(document.image_id, image.id.to_string());
        assert_eq!(document.payload.subtype, BinarySubtype::Generic);

        let back = StoredImage::try_from(document).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn malformed_image_id_is_a_backend_error() {
        let document = ImageDocument {
            image_id: "not-an-id".to_string(),
            name: "x.png".to_string(),
            source_path: String::new(),
            directory: String::new(),
            payload: Binary {
                subtype: BinarySubtype::Generic,
                bytes: Vec::new(),
            },
            original_size: 0,
            ingested_at: BsonDateTime::from_millis(0),
        };
        let err = StoredImage::try_from(document).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
