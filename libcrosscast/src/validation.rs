//! Per-platform publish preconditions
//!
//! [`validate`] decides, without any I/O, whether a draft may be published to
//! one account. Targets that fail here never reach an adapter.

use reqwest::Url;

use crate::error::ValidationError;
use crate::types::{non_empty, Draft, Platform, SocialAccount};

/// Check that `draft` can be published to `account` on `platform`.
///
/// For Facebook targets `account` is the Instagram connection record that
/// carries the page id and page token.
pub fn validate(
    platform: Platform,
    account: &SocialAccount,
    draft: &Draft,
) -> Result<(), ValidationError> {
    if !account.connected {
        return Err(ValidationError::NotConnected);
    }

    match platform {
        Platform::YouTube => validate_youtube(draft),
        Platform::Instagram => validate_instagram(account, draft),
        Platform::Facebook => validate_facebook(account, draft),
        Platform::Twitter => validate_twitter(account),
    }
}

fn validate_youtube(draft: &Draft) -> Result<(), ValidationError> {
    if draft.media_file.is_some() {
        return Ok(());
    }

    match draft.media_url() {
        Some(_) => Err(ValidationError::UnsupportedMediaForPlatform(
            "YouTube requires an uploaded video file, not a URL".to_string(),
        )),
        None => Err(ValidationError::MissingRequiredField("videoFile".to_string())),
    }
}

fn validate_instagram(account: &SocialAccount, draft: &Draft) -> Result<(), ValidationError> {
    if non_empty(&account.instagram_id).is_none() {
        return Err(ValidationError::MissingRequiredField(
            "instagramId".to_string(),
        ));
    }

    if draft.text.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField("caption".to_string()));
    }

    require_public_url(Platform::Instagram, draft)
}

fn validate_facebook(account: &SocialAccount, draft: &Draft) -> Result<(), ValidationError> {
    if non_empty(&account.facebook_page_id).is_none() {
        return Err(ValidationError::MissingRequiredField(
            "facebookPageId".to_string(),
        ));
    }

    if non_empty(&account.page_access_token).is_none() {
        return Err(ValidationError::MissingCredentials(
            "pageAccessToken".to_string(),
        ));
    }

    require_public_url(Platform::Facebook, draft)
}

fn validate_twitter(account: &SocialAccount) -> Result<(), ValidationError> {
    let fields = [
        ("apiKey", &account.api_key),
        ("apiSecret", &account.api_secret),
        ("accessToken", &account.access_token),
        ("accessTokenSecret", &account.access_token_secret),
    ];

    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| non_empty(value).is_none())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingCredentials(missing.join(", ")))
    }
}

/// Graph API platforms fetch media themselves, so they need a URL the
/// platform can reach.
fn require_public_url(platform: Platform, draft: &Draft) -> Result<(), ValidationError> {
    let Some(url) = draft.media_url() else {
        if draft.media_file.is_some() {
            return Err(ValidationError::UnsupportedMediaForPlatform(format!(
                "{} requires a public media URL, not a local file",
                platform.display_name()
            )));
        }
        return Err(ValidationError::MissingRequiredField("mediaUrl".to_string()));
    };

    if is_public_url(url) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedMediaForPlatform(format!(
            "{} cannot fetch media from '{}'",
            platform.display_name(),
            url
        )))
    }
}

fn is_public_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    match parsed.host_str() {
        Some(host) => !matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "0.0.0.0"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(platform: Platform) -> SocialAccount {
        let mut account = SocialAccount::new("acct-1", platform, "someone");
        account.connected = true;
        account
    }

    fn instagram_account() -> SocialAccount {
        let mut account = connected(Platform::Instagram);
        account.instagram_id = Some("17841400000000000".to_string());
        account.facebook_page_id = Some("1000000000".to_string());
        account.page_access_token = Some("page-token".to_string());
        account
    }

    fn twitter_account() -> SocialAccount {
        let mut account = connected(Platform::Twitter);
        account.api_key = Some("key".to_string());
        account.api_secret = Some("secret".to_string());
        account.access_token = Some("token".to_string());
        account.access_token_secret = Some("token-secret".to_string());
        account
    }

    const IMAGE_URL: &str = "https://cdn.example.com/photo.jpg";

    #[test]
    fn test_disconnected_account_rejected_for_every_platform() {
        let draft = Draft::new("hello").with_media_url(IMAGE_URL);
        for platform in Platform::ALL {
            let account = SocialAccount::new("acct-1", platform.account_platform(), "someone");
            assert_eq!(
                validate(platform, &account, &draft),
                Err(ValidationError::NotConnected),
                "{platform}"
            );
        }
    }

    #[test]
    fn test_youtube_requires_video_file() {
        let account = connected(Platform::YouTube);

        assert_eq!(
            validate(Platform::YouTube, &account, &Draft::new("clip")),
            Err(ValidationError::MissingRequiredField("videoFile".to_string()))
        );

        let url_only = Draft::new("clip").with_media_url("https://cdn.example.com/v.mp4");
        assert!(matches!(
            validate(Platform::YouTube, &account, &url_only),
            Err(ValidationError::UnsupportedMediaForPlatform(_))
        ));

        let with_file = Draft::new("clip").with_media_file("/tmp/video.mp4");
        assert_eq!(validate(Platform::YouTube, &account, &with_file), Ok(()));
    }

    #[test]
    fn test_instagram_missing_id() {
        let mut account = instagram_account();
        account.instagram_id = None;
        let draft = Draft::new("caption").with_media_url(IMAGE_URL);

        assert_eq!(
            validate(Platform::Instagram, &account, &draft),
            Err(ValidationError::MissingRequiredField("instagramId".to_string()))
        );
    }

    #[test]
    fn test_instagram_requires_caption() {
        let draft = Draft::new("   ").with_media_url(IMAGE_URL);
        assert_eq!(
            validate(Platform::Instagram, &instagram_account(), &draft),
            Err(ValidationError::MissingRequiredField("caption".to_string()))
        );
    }

    #[test]
    fn test_instagram_media_rules() {
        let account = instagram_account();

        assert_eq!(
            validate(Platform::Instagram, &account, &Draft::new("caption")),
            Err(ValidationError::MissingRequiredField("mediaUrl".to_string()))
        );

        let file_only = Draft::new("caption").with_media_file("/tmp/photo.jpg");
        assert!(matches!(
            validate(Platform::Instagram, &account, &file_only),
            Err(ValidationError::UnsupportedMediaForPlatform(_))
        ));

        for url in ["ftp://cdn.example.com/a.jpg", "http://localhost/a.jpg", "not a url"] {
            let draft = Draft::new("caption").with_media_url(url);
            assert!(
                matches!(
                    validate(Platform::Instagram, &account, &draft),
                    Err(ValidationError::UnsupportedMediaForPlatform(_))
                ),
                "{url}"
            );
        }

        let ok = Draft::new("caption").with_media_url(IMAGE_URL);
        assert_eq!(validate(Platform::Instagram, &account, &ok), Ok(()));
    }

    #[test]
    fn test_instagram_with_file_and_url_uses_url() {
        let draft = Draft::new("caption")
            .with_media_url(IMAGE_URL)
            .with_media_file("/tmp/video.mp4");
        assert_eq!(
            validate(Platform::Instagram, &instagram_account(), &draft),
            Ok(())
        );
    }

    #[test]
    fn test_facebook_page_requirements() {
        let draft = Draft::new("post").with_media_url(IMAGE_URL);

        let mut account = instagram_account();
        account.facebook_page_id = Some(" ".to_string());
        assert_eq!(
            validate(Platform::Facebook, &account, &draft),
            Err(ValidationError::MissingRequiredField("facebookPageId".to_string()))
        );

        let mut account = instagram_account();
        account.page_access_token = None;
        assert_eq!(
            validate(Platform::Facebook, &account, &draft),
            Err(ValidationError::MissingCredentials("pageAccessToken".to_string()))
        );

        assert_eq!(
            validate(Platform::Facebook, &instagram_account(), &draft),
            Ok(())
        );
    }

    #[test]
    fn test_facebook_does_not_need_instagram_id() {
        let mut account = instagram_account();
        account.instagram_id = None;
        let draft = Draft::new("post").with_media_url(IMAGE_URL);

        assert_eq!(validate(Platform::Facebook, &account, &draft), Ok(()));
    }

    #[test]
    fn test_twitter_lists_missing_credentials() {
        let mut account = twitter_account();
        account.api_secret = None;
        account.access_token_secret = Some(String::new());

        assert_eq!(
            validate(Platform::Twitter, &account, &Draft::new("tweet")),
            Err(ValidationError::MissingCredentials(
                "apiSecret, accessTokenSecret".to_string()
            ))
        );
    }

    #[test]
    fn test_twitter_media_optional() {
        let account = twitter_account();
        assert_eq!(validate(Platform::Twitter, &account, &Draft::new("tweet")), Ok(()));

        let with_file = Draft::new("tweet").with_media_file("/tmp/photo.png");
        assert_eq!(validate(Platform::Twitter, &account, &with_file), Ok(()));
    }
}
