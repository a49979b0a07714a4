//! imgvault-core
//!
//! Core building blocks for the imgvault image ingestion service.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, image, outcome, errors, events）
//! - **ports**: 抽象化レイヤー（ContentStore, StatusSource, EventSink, Clock, IdGenerator）
//! - **codec**: 画像の正規化（PNG RGB8）+ zlib 圧縮
//! - **app**: アプリケーションロジック（discovery, ingest, restore, poll, readiness）
//! - **impls**: 実装（InMemoryContentStore, MongoContentStore, HttpJsonSource, event sinks）
//! - **config**: 環境変数からの設定読み込み

pub mod app;
pub mod codec;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
mod testing;
