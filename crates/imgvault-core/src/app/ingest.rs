//! IngestPipeline - ディレクトリ配下の画像をコンテンツストアに取り込む
//!
//! # フロー（ファイルごと）
//! 1. ImageFiles で次のファイルを取得（遅延列挙、readdir は spawn_blocking 上）
//! 2. ファイルを読み込み、ImageCodec::encode（spawn_blocking）
//! 3. ContentStore::put（name = ファイルのベース名）
//! 4. 結果を `Result<FileOutcome, FileError>` として返し、EventSink に通知
//!
//! # 設計原則
//! - 1 ファイルの失敗で実行全体を止めない
//! - DuplicateKey は失敗ではなく AlreadyPresent（再実行で冪等）
//! - 報告（EventSink）と制御フロー（戻り値）を分離する

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::time::Instant;

use crate::app::discovery::ImageFiles;
use crate::codec::ImageCodec;
use crate::domain::{
    CodecError, DomainEvent, FileError, FileOutcome, IngestReport, RunId, StoreError, StoredImage,
};
use crate::impls::NoopEventSink;
use crate::ports::{Clock, ContentStore, EventSink, IdGenerator, SystemClock, UlidGenerator};

pub struct IngestPipeline {
    store: Arc<dyn ContentStore>,
    codec: ImageCodec,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn ContentStore>, codec: ImageCodec) -> Self {
        Self {
            store,
            codec,
            events: Arc::new(NoopEventSink),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UlidGenerator::new(SystemClock)),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Begin a run over `root`. Nothing is read until [`IngestRun::next`].
    pub fn start(&self, root: impl AsRef<Path>) -> IngestRun<'_> {
        let root = root.as_ref().to_path_buf();
        let run_id = self.ids.generate_run_id();
        self.events.emit(&DomainEvent::RunStarted {
            run_id,
            root: root.clone(),
        });
        IngestRun {
            pipeline: self,
            run_id,
            files: Some(ImageFiles::new(&root)),
            started: Instant::now(),
            stored: 0,
            already_present: 0,
            failed: 0,
            finished: false,
        }
    }

    /// Visit every image under `root` and summarize the run.
    pub async fn run(&self, root: impl AsRef<Path>) -> IngestReport {
        let mut run = self.start(root);
        let mut report = IngestReport::new(run.run_id());
        while let Some(result) = run.next().await {
            report.record(&result);
        }
        report
    }

    async fn ingest_file(&self, path: PathBuf) -> Result<FileOutcome, FileError> {
        let name = base_name(&path)?;
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|source| FileError::Io {
                path: path.clone(),
                source,
            })?;
        let original_size = raw.len() as u64;

        let codec = self.codec;
        let payload = tokio::task::spawn_blocking(move || codec.encode(&raw))
            .await
            .map_err(|e| FileError::Codec {
                path: path.clone(),
                source: CodecError::UnsupportedInput(format!("encoder task failed: {e}")),
            })?
            .map_err(|source| FileError::Codec {
                path: path.clone(),
                source,
            })?;

        let image = StoredImage {
            id: self.ids.generate_image_id(),
            name: name.clone(),
            source_path: path.display().to_string(),
            directory: path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            payload,
            original_size,
            ingested_at: self.clock.now(),
        };
        let stored_size = image.stored_size();

        match self.store.put(image).await {
            Ok(()) => Ok(FileOutcome::Stored {
                name,
                path,
                original_size,
                stored_size,
            }),
            Err(StoreError::DuplicateKey(_)) => Ok(FileOutcome::AlreadyPresent { name, path }),
            Err(source) => Err(FileError::Store { path, source }),
        }
    }
}

/// One in-progress ingestion run; a lazy sequence of per-file results.
///
/// Restartable only by calling [`IngestPipeline::start`] again.
pub struct IngestRun<'a> {
    pipeline: &'a IngestPipeline,
    run_id: RunId,
    /// `None` once the walk is exhausted or its task failed.
    files: Option<ImageFiles>,
    started: Instant,
    stored: usize,
    already_present: usize,
    failed: usize,
    finished: bool,
}

impl IngestRun<'_> {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Process the next matched file. `None` once every file was visited.
    pub async fn next(&mut self) -> Option<Result<FileOutcome, FileError>> {
        let item = match self.next_path().await {
            Some(item) => item,
            None => {
                self.finish();
                return None;
            }
        };

        let file_started = Instant::now();
        let result = match item {
            Ok(path) => self.pipeline.ingest_file(path).await,
            Err(err) => Err(err),
        };
        self.observe(&result, file_started.elapsed());
        Some(result)
    }

    /// Advance the walk on the blocking pool; walkdir reads directories synchronously.
    async fn next_path(&mut self) -> Option<Result<PathBuf, FileError>> {
        let mut files = self.files.take()?;
        let step = tokio::task::spawn_blocking(move || {
            let item = files.next();
            (files, item)
        })
        .await;

        match step {
            Ok((files, Some(item))) => {
                self.files = Some(files);
                Some(item)
            }
            Ok((_, None)) => None,
            // 列挙タスクが落ちたら残りは辿れない
            Err(e) => Some(Err(FileError::Walk {
                path: None,
                message: format!("discovery task failed: {e}"),
            })),
        }
    }

    fn observe(&mut self, result: &Result<FileOutcome, FileError>, elapsed: std::time::Duration) {
        let run_id = self.run_id;
        let event = match result {
            Ok(FileOutcome::Stored {
                name,
                path,
                original_size,
                stored_size,
            }) => {
                self.stored += 1;
                DomainEvent::FileStored {
                    run_id,
                    name: name.clone(),
                    path: path.clone(),
                    original_size: *original_size,
                    stored_size: *stored_size,
                    elapsed,
                }
            }
            Ok(FileOutcome::AlreadyPresent { name, path }) => {
                self.already_present += 1;
                DomainEvent::FileAlreadyPresent {
                    run_id,
                    name: name.clone(),
                    path: path.clone(),
                }
            }
            Err(err) => {
                self.failed += 1;
                DomainEvent::FileFailed {
                    run_id,
                    path: err.path().map(Path::to_path_buf),
                    kind: err.kind(),
                    reason: err.to_string(),
                }
            }
        };
        self.pipeline.events.emit(&event);
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.pipeline.events.emit(&DomainEvent::RunFinished {
            run_id: self.run_id,
            stored: self.stored,
            already_present: self.already_present,
            failed: self.failed,
            elapsed: self.started.elapsed(),
        });
    }
}

/// Record name of a file. Lossy conversion would let distinct files collide.
fn base_name(path: &Path) -> Result<String, FileError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| FileError::InvalidName {
            path: path.to_path_buf(),
        })
}
