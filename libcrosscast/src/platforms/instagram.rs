//! Instagram content publishing through the Graph API
//!
//! Create a media container from a public URL, then publish the container.
//! Video containers are processed asynchronously, so their `status_code` is
//! polled until it reads `FINISHED` before publishing. Every call is
//! authorised with the linked Facebook Page's token.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::PlatformError;
use crate::media::url_is_video;
use crate::platforms::http::{read_json, transport_error};
use crate::platforms::{PublishJob, Publisher};
use crate::types::{non_empty, ExternalRef, Platform};

const NAME: &str = "Instagram";
const MAX_CONTAINER_CHECKS: usize = 30;
const CONTAINER_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct InstagramPublisher {
    http: Client,
    graph_base: String,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct GraphId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ContainerStatus {
    status_code: Option<String>,
    status: Option<String>,
}

impl InstagramPublisher {
    pub fn new(http: Client, api: &ApiConfig) -> Self {
        Self {
            http,
            graph_base: api.graph_base.trim_end_matches('/').to_string(),
            poll_interval: CONTAINER_POLL_INTERVAL,
        }
    }

    /// Time between container status checks
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn post_form(
        &self,
        context: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<GraphId, PlatformError> {
        let response = self
            .http
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| transport_error(NAME, context, e))?;

        read_json(NAME, context, response).await
    }

    /// Poll a video container until Instagram has finished processing it
    async fn wait_for_container(
        &self,
        container_id: &str,
        page_token: &str,
    ) -> Result<(), PlatformError> {
        let url = format!("{}/{}", self.graph_base, container_id);

        for attempt in 0..MAX_CONTAINER_CHECKS {
            if attempt > 0 {
                tokio::time::sleep(self.poll_interval).await;
            }

            let response = self
                .http
                .get(&url)
                .query(&[("fields", "status_code,status"), ("access_token", page_token)])
                .send()
                .await
                .map_err(|e| transport_error(NAME, "container status", e))?;
            let container: ContainerStatus = read_json(NAME, "container status", response).await?;

            match container.status_code.as_deref() {
                Some("FINISHED") => return Ok(()),
                Some(code @ ("ERROR" | "EXPIRED")) => {
                    let detail = container.status.unwrap_or_else(|| code.to_string());
                    return Err(PlatformError::Posting(format!(
                        "Instagram media processing failed: {}",
                        detail
                    )));
                }
                code => debug!(container = %container_id, ?code, "Instagram container not ready"),
            }
        }

        Err(PlatformError::Posting(
            "Instagram media processing did not finish".to_string(),
        ))
    }
}

/// Container fields for a media URL: Reels for video, a photo otherwise
pub fn container_params<'a>(media_url: &'a str, caption: &'a str) -> Vec<(&'static str, &'a str)> {
    let mut params = if url_is_video(media_url) {
        vec![("video_url", media_url), ("media_type", "REELS")]
    } else {
        vec![("image_url", media_url)]
    };
    params.push(("caption", caption));
    params
}

#[async_trait]
impl Publisher for InstagramPublisher {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn publish(&self, job: &PublishJob<'_>) -> Result<ExternalRef, PlatformError> {
        let ig_id = non_empty(&job.account.instagram_id).ok_or_else(|| {
            PlatformError::Validation("Instagram account has no Instagram user id".to_string())
        })?;

        // Checked before any request: user tokens cannot publish
        let page_token = non_empty(&job.account.page_access_token).ok_or_else(|| {
            PlatformError::Authentication(
                "Instagram publishing requires a Facebook Page access token; reconnect the account"
                    .to_string(),
            )
        })?;

        let media_url = job.media.url().ok_or_else(|| {
            PlatformError::Validation("Instagram requires a public media URL".to_string())
        })?;

        if job.draft.scheduled_at.is_some() {
            warn!(
                account = %job.account.id,
                "Instagram does not support scheduled publishing; publishing now"
            );
        }

        let mut params = container_params(media_url, &job.draft.text);
        params.push(("access_token", page_token));

        debug!(account = %job.account.id, ig_id, "Creating Instagram media container");
        let container = self
            .post_form(
                "container creation",
                &format!("{}/{}/media", self.graph_base, ig_id),
                &params,
            )
            .await?;

        if url_is_video(media_url) {
            self.wait_for_container(&container.id, page_token).await?;
        }

        debug!(account = %job.account.id, container = %container.id, "Publishing Instagram container");
        let published = self
            .post_form(
                "publish",
                &format!("{}/{}/media_publish", self.graph_base, ig_id),
                &[("creation_id", container.id.as_str()), ("access_token", page_token)],
            )
            .await?;

        Ok(ExternalRef::new(published.id, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_container_params() {
        let params = container_params("https://cdn.example.com/a.jpg", "caption");
        assert_eq!(
            params,
            vec![
                ("image_url", "https://cdn.example.com/a.jpg"),
                ("caption", "caption")
            ]
        );
    }

    #[test]
    fn test_video_container_params_use_reels() {
        let params = container_params("https://cdn.example.com/clip.mp4", "caption");
        assert_eq!(
            params,
            vec![
                ("video_url", "https://cdn.example.com/clip.mp4"),
                ("media_type", "REELS"),
                ("caption", "caption")
            ]
        );
    }

    #[test]
    fn test_graph_base_trailing_slash() {
        let api = ApiConfig {
            graph_base: "https://graph.example.com/v19.0/".to_string(),
            ..Default::default()
        };
        let publisher = InstagramPublisher::new(Client::new(), &api);
        assert_eq!(publisher.graph_base, "https://graph.example.com/v19.0");
    }
}
