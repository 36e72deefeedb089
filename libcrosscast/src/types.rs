//! Core types for Crosscast

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CrosscastError, PlatformError, ValidationError};

/// The four supported publish destinations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Instagram,
    Facebook,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::YouTube,
        Platform::Instagram,
        Platform::Facebook,
        Platform::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
        }
    }

    /// Human-readable name used in reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "Twitter",
        }
    }

    /// Platform whose connection record carries this platform's identity.
    ///
    /// Facebook Pages are reached through the Instagram (Graph API) login.
    pub fn account_platform(&self) -> Platform {
        match self {
            Platform::Facebook => Platform::Instagram,
            other => *other,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CrosscastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" | "yt" => Ok(Platform::YouTube),
            "instagram" => Ok(Platform::Instagram),
            "facebook" => Ok(Platform::Facebook),
            "twitter" | "x" => Ok(Platform::Twitter),
            other => Err(CrosscastError::InvalidInput(format!(
                "Unknown platform '{}'. Valid options: youtube, instagram, facebook, twitter",
                other
            ))),
        }
    }
}

/// A connected social account owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialAccount {
    pub id: String,
    pub platform: Platform,
    pub username: String,
    #[serde(default)]
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_secret: Option<String>,
}

impl SocialAccount {
    /// Create a disconnected account with no platform fields set
    pub fn new(id: impl Into<String>, platform: Platform, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            platform,
            username: username.into(),
            connected: false,
            instagram_id: None,
            facebook_page_id: None,
            page_access_token: None,
            access_token: None,
            refresh_token: None,
            api_key: None,
            api_secret: None,
            access_token_secret: None,
        }
    }

    /// Identity fields that must be non-empty while the account is connected
    pub fn missing_identity_fields(&self) -> Vec<&'static str> {
        let required: Vec<(&'static str, &Option<String>)> = match self.platform {
            Platform::YouTube => vec![("accessToken", &self.access_token)],
            Platform::Instagram => vec![("instagramId", &self.instagram_id)],
            Platform::Facebook => vec![
                ("facebookPageId", &self.facebook_page_id),
                ("pageAccessToken", &self.page_access_token),
            ],
            Platform::Twitter => vec![
                ("apiKey", &self.api_key),
                ("apiSecret", &self.api_secret),
                ("accessToken", &self.access_token),
                ("accessTokenSecret", &self.access_token_secret),
            ],
        };

        required
            .into_iter()
            .filter(|(_, value)| non_empty(value).is_none())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Returns the value if it is present and not blank
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Content being published. Not persisted until dispatch.
///
/// A draft may carry both a URL and a local file: URL-only platforms get the
/// URL and byte-upload platforms get the file, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Draft {
    pub text: String,
    pub youtube_description: Option<String>,
    pub media_url: Option<String>,
    pub media_file: Option<PathBuf>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Draft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_media_url(mut self, url: impl Into<String>) -> Self {
        self.media_url = Some(url.into());
        self
    }

    pub fn with_media_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.media_file = Some(path.into());
        self
    }

    pub fn with_youtube_description(mut self, description: impl Into<String>) -> Self {
        self.youtube_description = Some(description.into());
        self
    }

    pub fn scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    /// The media URL, if one is set and non-blank
    pub fn media_url(&self) -> Option<&str> {
        non_empty(&self.media_url)
    }

    /// Whether `platform` is sent the local file instead of the URL
    pub fn uploads_file_to(&self, platform: Platform) -> bool {
        match platform {
            Platform::YouTube => true,
            Platform::Twitter => self.media_file.is_some(),
            Platform::Instagram | Platform::Facebook => false,
        }
    }
}

/// One (platform, account) pair a draft is published to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    pub platform: Platform,
    pub account_id: String,
}

impl Target {
    pub fn new(platform: Platform, account_id: impl Into<String>) -> Self {
        Self {
            platform,
            account_id: account_id.into(),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.platform, self.account_id)
    }
}

impl FromStr for Target {
    type Err = CrosscastError;

    /// Parse `platform:account_id`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (platform, account) = s.split_once(':').ok_or_else(|| {
            CrosscastError::InvalidInput(format!(
                "Invalid target '{}'. Expected format: platform:account_id",
                s
            ))
        })?;

        let account = account.trim();
        if account.is_empty() {
            return Err(CrosscastError::InvalidInput(format!(
                "Invalid target '{}': account id cannot be empty",
                s
            )));
        }

        Ok(Target::new(platform.parse()?, account))
    }
}

/// Reference to the published item on the remote platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub id: String,
    pub url: Option<String>,
}

impl ExternalRef {
    pub fn new(id: impl Into<String>, url: Option<String>) -> Self {
        Self {
            id: id.into(),
            url,
        }
    }
}

/// Terminal status of one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    ValidationFailed,
    ExternalApiFailed,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Success => write!(f, "success"),
            OutcomeStatus::ValidationFailed => write!(f, "validation_failed"),
            OutcomeStatus::ExternalApiFailed => write!(f, "external_api_failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeResult {
    Success { external_ref: ExternalRef },
    ValidationFailed(ValidationError),
    ExternalApiFailed(PlatformError),
}

/// Result recorded for one target after validation and/or dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub target: Target,
    pub result: OutcomeResult,
}

impl PublishOutcome {
    pub fn success(target: Target, external_ref: ExternalRef) -> Self {
        Self {
            target,
            result: OutcomeResult::Success { external_ref },
        }
    }

    pub fn validation_failed(target: Target, error: ValidationError) -> Self {
        Self {
            target,
            result: OutcomeResult::ValidationFailed(error),
        }
    }

    pub fn external_api_failed(target: Target, error: PlatformError) -> Self {
        Self {
            target,
            result: OutcomeResult::ExternalApiFailed(error),
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        match self.result {
            OutcomeResult::Success { .. } => OutcomeStatus::Success,
            OutcomeResult::ValidationFailed(_) => OutcomeStatus::ValidationFailed,
            OutcomeResult::ExternalApiFailed(_) => OutcomeStatus::ExternalApiFailed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == OutcomeStatus::Success
    }

    /// Failure reason, if the target did not succeed
    pub fn reason(&self) -> Option<String> {
        match &self.result {
            OutcomeResult::Success { .. } => None,
            OutcomeResult::ValidationFailed(e) => Some(e.to_string()),
            OutcomeResult::ExternalApiFailed(e) => Some(e.to_string()),
        }
    }

    pub fn external_ref(&self) -> Option<&ExternalRef> {
        match &self.result {
            OutcomeResult::Success { external_ref } => Some(external_ref),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Published,
    Scheduled,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
        }
    }
}

impl FromStr for PostStatus {
    type Err = CrosscastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(PostStatus::Published),
            "scheduled" => Ok(PostStatus::Scheduled),
            other => Err(CrosscastError::InvalidInput(format!(
                "Unknown post status: {}",
                other
            ))),
        }
    }
}

/// Canonical record of one successful publish
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRecord {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub platform: Platform,
    pub platform_post_id: Option<String>,
    pub content: String,
    pub media_url: Option<String>,
    pub status: PostStatus,
    pub scheduled_at: Option<i64>,
    pub created_at: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub views: i64,
}

impl PostRecord {
    /// Build the record for a successful target. Counters start at zero.
    pub fn for_success(
        user_id: &str,
        target: &Target,
        draft: &Draft,
        external_ref: Option<&ExternalRef>,
    ) -> Self {
        let status = if draft.scheduled_at.is_some() {
            PostStatus::Scheduled
        } else {
            PostStatus::Published
        };

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            account_id: target.account_id.clone(),
            platform: target.platform,
            platform_post_id: external_ref.map(|r| r.id.clone()),
            content: draft.text.clone(),
            media_url: if draft.uploads_file_to(target.platform) {
                None
            } else {
                draft.media_url().map(str::to_string)
            },
            status,
            scheduled_at: draft.scheduled_at.map(|at| at.timestamp()),
            created_at: Utc::now().timestamp(),
            likes: 0,
            comments: 0,
            shares: 0,
            views: 0,
        }
    }
}
