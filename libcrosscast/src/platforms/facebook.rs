//! Facebook Page feed posts through the Graph API

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::PlatformError;
use crate::platforms::http::{read_json, transport_error};
use crate::platforms::{PublishJob, Publisher};
use crate::types::{non_empty, Draft, ExternalRef, Platform};

const NAME: &str = "Facebook";

pub struct FacebookPublisher {
    http: Client,
    graph_base: String,
}

#[derive(Debug, Deserialize)]
struct FeedPost {
    id: String,
}

impl FacebookPublisher {
    pub fn new(http: Client, api: &ApiConfig) -> Self {
        Self {
            http,
            graph_base: api.graph_base.trim_end_matches('/').to_string(),
        }
    }
}

/// Form fields for `/{page_id}/feed`, without the access token
pub fn feed_params(draft: &Draft, link: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![("message", draft.text.clone())];

    if let Some(link) = link {
        params.push(("link", link.to_string()));
    }

    if let Some(at) = draft.scheduled_at {
        params.push(("published", "false".to_string()));
        params.push(("scheduled_publish_time", at.timestamp().to_string()));
    }

    params
}

#[async_trait]
impl Publisher for FacebookPublisher {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn publish(&self, job: &PublishJob<'_>) -> Result<ExternalRef, PlatformError> {
        let page_id = non_empty(&job.account.facebook_page_id).ok_or_else(|| {
            PlatformError::Validation("No Facebook Page is linked to this account".to_string())
        })?;
        let page_token = non_empty(&job.account.page_access_token).ok_or_else(|| {
            PlatformError::Authentication("Facebook Page access token is missing".to_string())
        })?;

        let mut params = feed_params(job.draft, job.media.url());
        params.push(("access_token", page_token.to_string()));

        debug!(account = %job.account.id, page_id, "Posting to Facebook Page feed");
        let response = self
            .http
            .post(format!("{}/{}/feed", self.graph_base, page_id))
            .form(&params)
            .send()
            .await
            .map_err(|e| transport_error(NAME, "feed post", e))?;

        let post: FeedPost = read_json(NAME, "feed post", response).await?;
        let url = format!("https://www.facebook.com/{}", post.id);

        Ok(ExternalRef::new(post.id, Some(url)))
    }
}
