//! Tavus video-generation adapter.
//!
//! Implements [`VideoGenerator`] against the hosted v2 video API: one POST to
//! create a rendering job, then status polls until the job reaches a terminal
//! state. The status mapping is the interesting part — everything the service
//! has not explicitly finished or failed counts as pending.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TavusConfig;
use crate::providers::{JobHandle, JobStatus, ProviderError, VideoGenerator};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Tavus API payload types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CreateVideoRequest<'a> {
    replica_id: &'a str,
    script: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateVideoResponse {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoStatusResponse {
    status: Option<String>,
    stream_url: Option<String>,
    download_url: Option<String>,
}

/// Map a status payload onto [`JobStatus`].
fn map_status(resp: VideoStatusResponse) -> Result<JobStatus, ProviderError> {
    let status = resp.status.ok_or(ProviderError::MalformedResponse {
        provider: "tavus",
        detail: "status field missing".to_string(),
    })?;

    let non_empty = |uri: Option<String>| uri.filter(|u| !u.trim().is_empty());

    match status.as_str() {
        "ready" => Ok(JobStatus::Completed {
            result_uri: non_empty(resp.stream_url).or_else(|| non_empty(resp.download_url)),
        }),
        "error" | "deleted" => Ok(JobStatus::Failed {
            reason: format!("job entered '{status}' state"),
        }),
        other => {
            if other != "queued" && other != "generating" {
                debug!(status = other, "unrecognized video job status, treating as pending");
            }
            Ok(JobStatus::Pending)
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Tavus hosted video client.
pub struct TavusClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    replica_id: String,
}

impl TavusClient {
    /// Create a new client from the `[tavus]` config section.
    pub fn new(config: &TavusConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            replica_id: config.replica_id.clone(),
        }
    }

    fn check_configured(&self) -> Result<(), ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Unconfigured {
                provider: "tavus",
                missing: "api_key",
            });
        }
        if self.replica_id.is_empty() {
            return Err(ProviderError::Unconfigured {
                provider: "tavus",
                missing: "replica_id",
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VideoGenerator for TavusClient {
    fn name(&self) -> &'static str {
        "tavus"
    }

    async fn create_job(&self, script: &str) -> Result<JobHandle, ProviderError> {
        self.check_configured()?;

        let resp = self
            .client
            .post(format!("{}/v2/videos", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&CreateVideoRequest {
                replica_id: &self.replica_id,
                script,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: "tavus",
                status,
                body,
            });
        }

        let parsed: CreateVideoResponse = resp.json().await?;
        match parsed.video_id {
            Some(id) if !id.trim().is_empty() => Ok(JobHandle(id)),
            _ => Err(ProviderError::MalformedResponse {
                provider: "tavus",
                detail: "no video id in response".to_string(),
            }),
        }
    }

    async fn job_status(&self, handle: &JobHandle) -> Result<JobStatus, ProviderError> {
        self.check_configured()?;

        let resp = self
            .client
            .get(format!("{}/v2/videos/{}", self.base_url, handle))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: "tavus",
                status,
                body,
            });
        }

        let parsed: VideoStatusResponse = resp.json().await?;
        map_status(parsed)
    }
}
