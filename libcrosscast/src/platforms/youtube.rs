//! YouTube Data API v3 upload
//!
//! Videos go through the resumable upload protocol: a metadata POST returns an
//! upload session URL in the `Location` header, then the bytes are PUT there
//! in one request. The adapter returns as soon as YouTube accepts the upload;
//! it does not wait for processing.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::PlatformError;
use crate::platforms::http::{ensure_success, read_json, transport_error};
use crate::platforms::{PublishJob, Publisher};
use crate::types::{non_empty, Draft, ExternalRef, Platform};

const NAME: &str = "YouTube";
const MAX_TITLE_CHARS: usize = 100;
/// "People & Blogs"
const DEFAULT_CATEGORY_ID: &str = "22";

pub struct YouTubePublisher {
    http: Client,
    token_url: String,
    upload_base: String,
    privacy: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

impl YouTubePublisher {
    pub fn new(http: Client, api: &ApiConfig) -> Self {
        Self {
            http,
            token_url: api.google_token_url.clone(),
            upload_base: api.youtube_upload_base.trim_end_matches('/').to_string(),
            privacy: api.youtube_privacy.clone(),
        }
    }

    /// Exchange the refresh token when an OAuth client is configured,
    /// otherwise use the stored access token
    async fn access_token(&self, job: &PublishJob<'_>) -> Result<String, PlatformError> {
        let client = job.credentials.and_then(|c| c.oauth_client());

        if let (Some(refresh_token), Some((client_id, client_secret))) =
            (non_empty(&job.account.refresh_token), client)
        {
            debug!(account = %job.account.id, "Refreshing YouTube access token");
            let params = [
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ];

            let response = self
                .http
                .post(&self.token_url)
                .form(&params)
                .send()
                .await
                .map_err(|e| transport_error(NAME, "token refresh", e))?;

            let token: TokenResponse = read_json(NAME, "token refresh", response)
                .await
                .map_err(|e| match e {
                    PlatformError::Validation(msg) | PlatformError::Posting(msg) => {
                        PlatformError::Authentication(msg)
                    }
                    other => other,
                })?;
            return Ok(token.access_token);
        }

        non_empty(&job.account.access_token)
            .map(str::to_string)
            .ok_or_else(|| {
                PlatformError::Authentication(
                    "YouTube account has no access token; reconnect the account".to_string(),
                )
            })
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn publish(&self, job: &PublishJob<'_>) -> Result<ExternalRef, PlatformError> {
        let blob = job.media.blob().ok_or_else(|| {
            PlatformError::Validation("YouTube upload requires a video file".to_string())
        })?;

        let token = self.access_token(job).await?;
        let metadata = video_metadata(job.draft, job.multi_target, &self.privacy);

        let url = format!(
            "{}/videos?uploadType=resumable&part=snippet,status",
            self.upload_base
        );

        debug!(
            account = %job.account.id,
            bytes = blob.len(),
            mime = %blob.mime_type,
            "Starting YouTube resumable upload"
        );

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header("X-Upload-Content-Length", blob.len().to_string())
            .header("X-Upload-Content-Type", blob.mime_type.as_str())
            .json(&metadata)
            .send()
            .await
            .map_err(|e| transport_error(NAME, "upload session", e))?;

        let response = ensure_success(NAME, "upload session", response).await?;

        let session_url = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                PlatformError::Posting("YouTube upload session returned no Location".to_string())
            })?;

        let response = self
            .http
            .put(&session_url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, blob.mime_type.as_str())
            .header(CONTENT_LENGTH, blob.len())
            .body(blob.bytes.clone())
            .send()
            .await
            .map_err(|e| transport_error(NAME, "video upload", e))?;

        let video: VideoResource = read_json(NAME, "video upload", response).await?;

        Ok(ExternalRef::new(
            video.id.clone(),
            Some(format!("https://www.youtube.com/watch?v={}", video.id)),
        ))
    }
}

/// First line of the text, trimmed and capped, or "Untitled"
pub fn video_title(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return "Untitled".to_string();
    }
    first_line.chars().take(MAX_TITLE_CHARS).collect()
}

/// Lines after the title, or the dedicated YouTube description when
/// publishing to several targets at once
pub fn video_description(draft: &Draft, multi_target: bool) -> String {
    if multi_target {
        if let Some(description) = non_empty(&draft.youtube_description) {
            return description.to_string();
        }
    }

    draft
        .text
        .lines()
        .skip(1)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn video_metadata(draft: &Draft, multi_target: bool, privacy: &str) -> serde_json::Value {
    let status = match draft.scheduled_at {
        Some(at) => json!({
            "privacyStatus": "private",
            "publishAt": at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "selfDeclaredMadeForKids": false,
        }),
        None => json!({
            "privacyStatus": privacy,
            "selfDeclaredMadeForKids": false,
        }),
    };

    json!({
        "snippet": {
            "title": video_title(&draft.text),
            "description": video_description(draft, multi_target),
            "categoryId": DEFAULT_CATEGORY_ID,
        },
        "status": status,
    })
}
