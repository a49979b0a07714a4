//! Restore - 保存済み画像を取り出してファイルに書き戻す
//!
//! ContentStore::get → ImageCodec::decode → `output_dir/name` に保存。
//! 出力形式は name の拡張子から決まります。

use std::path::{Path, PathBuf};

use tracing::info;

use crate::codec::ImageCodec;
use crate::domain::RestoreError;
use crate::ports::ContentStore;

/// Fetch `name`, decode it and write it under `output_dir`.
///
/// Nothing is written when the record is missing or its payload is corrupt.
pub async fn restore_image(
    store: &dyn ContentStore,
    codec: &ImageCodec,
    name: &str,
    output_dir: &Path,
) -> Result<PathBuf, RestoreError> {
    let record = store.get(name).await?;
    let image = codec.decode(&record.payload)?;

    // 保存名はベース名のみ（ストア側の値にパス区切りが入っていても外に書かない）
    let file_name = Path::new(&record.name)
        .file_name()
        .ok_or_else(|| RestoreError::Write {
            path: output_dir.to_path_buf(),
            message: format!("record name '{}' is not a file name", record.name),
        })?
        .to_owned();
    let target = output_dir.join(file_name);

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| RestoreError::Write {
            path: output_dir.to_path_buf(),
            message: e.to_string(),
        })?;

    let path = target.clone();
    tokio::task::spawn_blocking(move || image.save(&path))
        .await
        .map_err(|e| RestoreError::Write {
            path: target.clone(),
            message: format!("writer task failed: {e}"),
        })?
        .map_err(|e| RestoreError::Write {
            path: target.clone(),
            message: e.to_string(),
        })?;

    info!(image = %record.name, path = %target.display(), "restored image");
    Ok(target)
}
