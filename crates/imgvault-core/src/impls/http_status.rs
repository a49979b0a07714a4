//! HttpJsonSource - control-plane API の JSON を GET する StatusSource
//!
//! クラスタやオンラインアーカイブの状態を毎回取り直します。
//! 失敗（接続・HTTP ステータス・JSON デコード）はすべて FetchError として返し、
//! リトライするかどうかはポーラー側が決めます。

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::Value;
use tracing::debug;

use crate::config::ControlPlaneConfig;
use crate::domain::FetchError;
use crate::ports::StatusSource;

/// Upper bound on how much of an error body is kept in the error message.
const MAX_ERROR_BODY: usize = 512;

pub struct HttpJsonSource {
    client: Client,
    url: String,
    token: Option<String>,
    accept: String,
}

impl HttpJsonSource {
    pub fn new(url: impl Into<String>, config: &ControlPlaneConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            token: config.token.clone(),
            accept: config.accept.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StatusSource for HttpJsonSource {
    type State = Value;

    async fn fetch(&self) -> Result<Value, FetchError> {
        let mut request = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, &self.accept);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        debug!(url = %self.url, "fetched status document");
        Ok(value)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}
