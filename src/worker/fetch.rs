//! Fetch operation: materialize a remote clip into the file store
//!
//! Steam UGC CDN links point at plain video payloads, so the fetcher is a
//! streaming HTTP GET into a staged file. Exactly one attempt per job; a
//! failed submission is resubmitted by the user, never retried here.

use crate::config::FetchConfig;
use crate::humanize::ByteSize;
use crate::storage::{FileStore, StagingClip, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("source responded with HTTP {0}")]
    UpstreamStatus(u16),

    #[error("connection timed out")]
    Timeout,

    #[error("clip exceeds the {limit} size limit")]
    TooLarge { limit: ByteSize },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// A clip materialized on disk under its published name.
#[derive(Debug, Clone)]
pub struct FetchedClip {
    pub file_name: String,
    pub bytes: u64,
}

/// The opaque fetch operation invoked by the worker loop.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, job_id: Uuid, url: &str, store: &FileStore) -> Result<FetchedClip>;
}

/// HTTP fetcher streaming the CDN payload through a staged write.
pub struct HttpFetcher {
    client: Client,
    max_clip_bytes: ByteSize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            max_clip_bytes: config.max_clip_bytes,
        })
    }

    async fn stream_body(
        &self,
        response: reqwest::Response,
        staging: &mut StagingClip,
    ) -> Result<u64> {
        let limit = self.max_clip_bytes.as_u64();

        if let Some(length) = response.content_length() {
            if length > limit {
                return Err(FetchError::TooLarge {
                    limit: self.max_clip_bytes,
                });
            }
        }

        let mut total: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk: Bytes = chunk.map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::RequestFailed(e.to_string())
                }
            })?;

            total += chunk.len() as u64;
            if total > limit {
                return Err(FetchError::TooLarge {
                    limit: self.max_clip_bytes,
                });
            }

            staging.write_chunk(&chunk).await?;
        }

        Ok(total)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, job_id: Uuid, url: &str, store: &FileStore) -> Result<FetchedClip> {
        debug!(%job_id, url, "Starting fetch");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamStatus(status.as_u16()));
        }

        let ext = extension_for(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        let mut staging = store.begin(job_id).await?;

        match self.stream_body(response, &mut staging).await {
            Ok(bytes) => {
                let file_name = staging.publish(job_id, ext).await?;
                debug!(%job_id, file = %file_name, bytes, "Fetch complete");
                Ok(FetchedClip { file_name, bytes })
            }
            Err(err) => {
                staging.discard().await;
                Err(err)
            }
        }
    }
}

/// Map the response media type to a stored file extension.
///
/// Steam UGC payloads are mp4 unless the CDN says otherwise.
fn extension_for(content_type: Option<&str>) -> &'static str {
    let Some(raw) = content_type else {
        return "mp4";
    };
    let Ok(media) = raw.parse::<mime::Mime>() else {
        return "mp4";
    };

    if media.type_() != mime::VIDEO {
        return "mp4";
    }

    match media.subtype().as_str() {
        "mp4" => "mp4",
        "webm" => "webm",
        "x-matroska" => "mkv",
        "quicktime" => "mov",
        "x-msvideo" => "avi",
        "x-flv" => "flv",
        _ => "mp4",
    }
}
