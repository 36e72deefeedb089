//! Twitter/X: v1.1 chunked media upload and v2 tweet creation
//!
//! Every request is signed with OAuth 1.0a using the keys stored on the
//! account. Upload commands travel as query parameters so they are covered by
//! the signature; media segments are sent as multipart bodies.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::PlatformError;
use crate::media::MediaBlob;
use crate::platforms::http::{ensure_success, read_json, transport_error};
use crate::platforms::oauth1::{authorization_header, OAuth1Credentials};
use crate::platforms::{PublishJob, Publisher};
use crate::types::{non_empty, ExternalRef, Platform, SocialAccount};

const NAME: &str = "Twitter";
const CHUNK_SIZE: usize = 1024 * 1024;
const MAX_STATUS_CHECKS: usize = 60;

pub struct TwitterPublisher {
    http: Client,
    api_base: String,
    upload_base: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
    processing_info: Option<ProcessingInfo>,
}

#[derive(Debug, Deserialize)]
struct ProcessingInfo {
    state: String,
    check_after_secs: Option<u64>,
    error: Option<ProcessingError>,
}

#[derive(Debug, Deserialize)]
struct ProcessingError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

impl TwitterPublisher {
    pub fn new(http: Client, api: &ApiConfig) -> Self {
        Self {
            http,
            api_base: api.twitter_api_base.trim_end_matches('/').to_string(),
            upload_base: api.twitter_upload_base.trim_end_matches('/').to_string(),
        }
    }

    fn media_endpoint(&self) -> String {
        format!("{}/media/upload.json", self.upload_base)
    }

    /// POST a signed upload command. `params` go in the query string.
    async fn upload_command(
        &self,
        credentials: &OAuth1Credentials<'_>,
        context: &str,
        params: &[(&str, &str)],
        body: Option<Form>,
    ) -> Result<reqwest::Response, PlatformError> {
        let url = self.media_endpoint();
        let auth = authorization_header(credentials, "POST", &url, params)?;

        let mut request = self
            .http
            .post(&url)
            .header(AUTHORIZATION, auth)
            .query(params);
        if let Some(form) = body {
            request = request.multipart(form);
        }

        request
            .send()
            .await
            .map_err(|e| transport_error(NAME, context, e))
    }

    async fn upload_media(
        &self,
        credentials: &OAuth1Credentials<'_>,
        blob: &MediaBlob,
    ) -> Result<String, PlatformError> {
        // v1.1 upload does not accept video/quicktime
        let media_type = if blob.mime_type.is_video() {
            "video/mp4"
        } else {
            blob.mime_type.as_str()
        };
        let total_bytes = blob.len().to_string();

        debug!(bytes = blob.len(), media_type, "Twitter media INIT");
        let response = self
            .upload_command(
                credentials,
                "media INIT",
                &[
                    ("command", "INIT"),
                    ("total_bytes", &total_bytes),
                    ("media_type", media_type),
                    ("media_category", media_category(media_type)),
                ],
                None,
            )
            .await?;
        let init: MediaUploadResponse = read_json(NAME, "media INIT", response).await?;
        let media_id = init.media_id_string;

        for (index, chunk) in blob.bytes.chunks(CHUNK_SIZE).enumerate() {
            let segment_index = index.to_string();
            debug!(media_id = %media_id, segment = index, "Twitter media APPEND");

            let part = Part::stream_with_length(blob.bytes.slice_ref(chunk), chunk.len() as u64)
                .file_name(blob.file_name.clone())
                .mime_str("application/octet-stream")
                .map_err(|e| PlatformError::Posting(format!("Invalid media part: {}", e)))?;

            let response = self
                .upload_command(
                    credentials,
                    "media APPEND",
                    &[
                        ("command", "APPEND"),
                        ("media_id", &media_id),
                        ("segment_index", &segment_index),
                    ],
                    Some(Form::new().part("media", part)),
                )
                .await?;
            ensure_success(NAME, "media APPEND", response).await?;
        }

        debug!(media_id = %media_id, "Twitter media FINALIZE");
        let response = self
            .upload_command(
                credentials,
                "media FINALIZE",
                &[("command", "FINALIZE"), ("media_id", &media_id)],
                None,
            )
            .await?;
        let finalize: MediaUploadResponse = read_json(NAME, "media FINALIZE", response).await?;

        if let Some(info) = finalize.processing_info {
            self.wait_for_processing(credentials, &media_id, info).await?;
        }

        Ok(media_id)
    }

    /// Poll STATUS until the upload is usable in a tweet
    async fn wait_for_processing(
        &self,
        credentials: &OAuth1Credentials<'_>,
        media_id: &str,
        mut info: ProcessingInfo,
    ) -> Result<(), PlatformError> {
        for _ in 0..MAX_STATUS_CHECKS {
            match info.state.as_str() {
                "succeeded" => return Ok(()),
                "failed" => {
                    let reason = info
                        .error
                        .and_then(|e| e.message)
                        .unwrap_or_else(|| "unknown error".to_string());
                    return Err(PlatformError::Posting(format!(
                        "Twitter media processing failed: {}",
                        reason
                    )));
                }
                _ => {
                    let wait = info.check_after_secs.unwrap_or(5);
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
            }

            let url = self.media_endpoint();
            let params = [("command", "STATUS"), ("media_id", media_id)];
            let auth = authorization_header(credentials, "GET", &url, &params)?;
            let response = self
                .http
                .get(&url)
                .header(AUTHORIZATION, auth)
                .query(&params)
                .send()
                .await
                .map_err(|e| transport_error(NAME, "media STATUS", e))?;

            let status: MediaUploadResponse = read_json(NAME, "media STATUS", response).await?;
            match status.processing_info {
                Some(next) => info = next,
                None => return Ok(()),
            }
        }

        Err(PlatformError::Posting(
            "Twitter media processing did not finish".to_string(),
        ))
    }
}

fn media_category(media_type: &str) -> &'static str {
    if media_type.starts_with("video/") {
        "tweet_video"
    } else if media_type == "image/gif" {
        "tweet_gif"
    } else {
        "tweet_image"
    }
}

fn account_credentials(account: &SocialAccount) -> Result<OAuth1Credentials<'_>, PlatformError> {
    Ok(OAuth1Credentials {
        consumer_key: required(&account.api_key, "apiKey")?,
        consumer_secret: required(&account.api_secret, "apiSecret")?,
        token: required(&account.access_token, "accessToken")?,
        token_secret: required(&account.access_token_secret, "accessTokenSecret")?,
    })
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, PlatformError> {
    non_empty(value)
        .ok_or_else(|| PlatformError::Authentication(format!("Twitter account is missing {}", name)))
}

/// Tweet text for a URL-only draft: the URL is appended unless the text
/// already contains it
pub fn tweet_text(text: &str, media_url: Option<&str>) -> String {
    match media_url {
        Some(url) if !text.contains(url) => {
            let text = text.trim_end();
            if text.is_empty() {
                url.to_string()
            } else {
                format!("{} {}", text, url)
            }
        }
        _ => text.to_string(),
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish(&self, job: &PublishJob<'_>) -> Result<ExternalRef, PlatformError> {
        let credentials = account_credentials(job.account)?;

        let media_id = match job.media.blob() {
            Some(blob) => Some(self.upload_media(&credentials, blob).await?),
            None => None,
        };

        let mut body = json!({ "text": tweet_text(&job.draft.text, job.media.url()) });
        if let Some(id) = &media_id {
            body["media"] = json!({ "media_ids": [id] });
        }

        let url = format!("{}/tweets", self.api_base);
        // JSON bodies are not part of the OAuth 1.0a signature
        let auth = authorization_header(&credentials, "POST", &url, &[])?;

        debug!(account = %job.account.id, with_media = media_id.is_some(), "Creating tweet");
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(NAME, "tweet", e))?;

        let tweet: TweetResponse = read_json(NAME, "tweet", response).await?;
        let url = format!("https://x.com/i/web/status/{}", tweet.data.id);

        Ok(ExternalRef::new(tweet.data.id, Some(url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tweet_text_appends_url() {
        assert_eq!(
            tweet_text("Check this out", Some("https://example.com/a.jpg")),
            "Check this out https://example.com/a.jpg"
        );
        assert_eq!(
            tweet_text("", Some("https://example.com/a.jpg")),
            "https://example.com/a.jpg"
        );
    }

    #[test]
    fn test_tweet_text_keeps_existing_url() {
        let text = "Already here https://example.com/a.jpg";
        assert_eq!(tweet_text(text, Some("https://example.com/a.jpg")), text);
        assert_eq!(tweet_text("No media", None), "No media");
    }

    #[test]
    fn test_media_category() {
        assert_eq!(media_category("video/mp4"), "tweet_video");
        assert_eq!(media_category("image/gif"), "tweet_gif");
        assert_eq!(media_category("image/png"), "tweet_image");
    }

    #[test]
    fn test_account_credentials_require_all_fields() {
        let mut account = SocialAccount::new("t1", Platform::Twitter, "someone");
        account.api_key = Some("key".to_string());
        account.api_secret = Some("secret".to_string());
        account.access_token = Some("token".to_string());

        match account_credentials(&account) {
            Err(PlatformError::Authentication(msg)) => assert!(msg.contains("accessTokenSecret")),
            other => panic!("Expected authentication error, got {:?}", other),
        }

        account.access_token_secret = Some("token-secret".to_string());
        let credentials = account_credentials(&account).unwrap();
        assert_eq!(credentials.consumer_key, "key");
        assert_eq!(credentials.token_secret, "token-secret");
    }

    #[test]
    fn test_processing_info_parses() {
        let parsed: MediaUploadResponse = serde_json::from_str(
            r#"{"media_id":1,"media_id_string":"1","processing_info":{"state":"pending","check_after_secs":1}}"#,
        )
        .unwrap();
        assert_eq!(parsed.media_id_string, "1");
        assert_eq!(parsed.processing_info.unwrap().state, "pending");
    }
}
