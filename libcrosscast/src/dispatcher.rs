//! Fan-out of one draft to many targets
//!
//! Every target ends in exactly one [`PublishOutcome`]:
//!
//! ```text
//! Pending ──validate──► ValidationFailed
//!    │
//!    └──► Dispatched ──► Success | ExternalApiFailed
//! ```
//!
//! Targets are independent. A failure, whether local or remote, never
//! cancels or alters another target.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::accounts::AccountRegistry;
use crate::credentials::CredentialStore;
use crate::error::ValidationError;
use crate::media::{MediaBlob, MediaPayload};
use crate::platforms::{Adapters, PublishJob};
use crate::types::{Draft, Platform, PublishOutcome, SocialAccount, Target};
use crate::validation::validate;

/// A target that passed validation and is waiting for its adapter
struct ReadyTarget {
    index: usize,
    target: Target,
    account: SocialAccount,
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: AccountRegistry,
    credentials: Arc<CredentialStore>,
    adapters: Adapters,
}

impl Dispatcher {
    pub fn new(
        registry: AccountRegistry,
        credentials: Arc<CredentialStore>,
        adapters: Adapters,
    ) -> Self {
        Self {
            registry,
            credentials,
            adapters,
        }
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// Publish `draft` to every target and wait for all of them to settle
    ///
    /// Returns one outcome per target, in request order.
    pub async fn dispatch(&self, draft: &Draft, targets: &[Target]) -> Vec<PublishOutcome> {
        let mut outcomes: Vec<Option<PublishOutcome>> = vec![None; targets.len()];
        let mut ready = Vec::new();

        for (index, target) in targets.iter().enumerate() {
            match self.prepare(target, draft) {
                Ok(account) => ready.push(ReadyTarget {
                    index,
                    target: target.clone(),
                    account,
                }),
                Err(error) => {
                    warn!(
                        platform = %target.platform,
                        account = %target.account_id,
                        reason = %error,
                        "Target failed validation"
                    );
                    outcomes[index] =
                        Some(PublishOutcome::validation_failed(target.clone(), error));
                }
            }
        }

        let blob = self.load_media(draft, &ready).await;
        if let Some(Err(error)) = &blob {
            ready.retain(|r| {
                if draft.uploads_file_to(r.target.platform) {
                    warn!(
                        platform = %r.target.platform,
                        account = %r.target.account_id,
                        reason = %error,
                        "Media unavailable for target"
                    );
                    outcomes[r.index] = Some(PublishOutcome::validation_failed(
                        r.target.clone(),
                        error.clone(),
                    ));
                    false
                } else {
                    true
                }
            });
        }
        let blob = blob.and_then(Result::ok);

        let multi_target = targets.len() > 1;
        let tasks = ready.iter().map(|r| {
            let job = PublishJob {
                account: &r.account,
                credentials: self.credentials.for_platform(r.target.platform),
                draft,
                media: media_for(r.target.platform, draft, blob.as_ref()),
                multi_target,
            };
            let adapter = self.adapters.get(r.target.platform);

            async move {
                let (platform, account) = (r.target.platform, &r.target.account_id);
                info!(%platform, %account, "Dispatching");

                let result = adapter.publish(&job).await;
                match &result {
                    Ok(external) => info!(%platform, %account, id = %external.id, "Published"),
                    Err(error) => warn!(%platform, %account, %error, "Publish failed"),
                }
                result
            }
        });

        let results = join_all(tasks).await;

        for (r, result) in ready.iter().zip(results) {
            outcomes[r.index] = Some(match result {
                Ok(external) => PublishOutcome::success(r.target.clone(), external),
                Err(error) => PublishOutcome::external_api_failed(r.target.clone(), error),
            });
        }

        outcomes.into_iter().flatten().collect()
    }

    /// Resolve the target's account and run the validation gate
    fn prepare(&self, target: &Target, draft: &Draft) -> Result<SocialAccount, ValidationError> {
        let account = self
            .registry
            .resolve(target)
            .ok_or_else(|| ValidationError::AccountNotFound(target.account_id.clone()))?;

        validate(target.platform, &account, draft)?;
        Ok(account)
    }

    /// Read the media file once, only if a ready target uploads bytes
    async fn load_media(
        &self,
        draft: &Draft,
        ready: &[ReadyTarget],
    ) -> Option<Result<MediaBlob, ValidationError>> {
        let path = draft.media_file.as_ref()?;
        if !ready.iter().any(|r| draft.uploads_file_to(r.target.platform)) {
            return None;
        }

        debug!(path = %path.display(), "Reading media file");
        Some(MediaBlob::load(path).await)
    }
}

/// Exactly one kind of media per target
fn media_for(platform: Platform, draft: &Draft, blob: Option<&MediaBlob>) -> MediaPayload {
    let url = || {
        draft
            .media_url()
            .map(|url| MediaPayload::Url(url.to_string()))
            .unwrap_or_default()
    };

    match platform {
        Platform::YouTube => blob.cloned().map(MediaPayload::Bytes).unwrap_or_default(),
        Platform::Twitter => match blob {
            Some(blob) => MediaPayload::Bytes(blob.clone()),
            None => url(),
        },
        Platform::Instagram | Platform::Facebook => url(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaMimeType;
    use bytes::Bytes;

    fn blob() -> MediaBlob {
        MediaBlob::from_bytes("clip.mp4", MediaMimeType::Mp4, Bytes::from_static(b"video"))
    }

    #[test]
    fn test_uploads_file_to() {
        let plain = Draft::new("text");
        let with_file = Draft::new("text").with_media_file("/tmp/clip.mp4");

        assert!(plain.uploads_file_to(Platform::YouTube));
        assert!(!plain.uploads_file_to(Platform::Twitter));
        assert!(with_file.uploads_file_to(Platform::Twitter));
        assert!(!with_file.uploads_file_to(Platform::Instagram));
        assert!(!with_file.uploads_file_to(Platform::Facebook));
    }

    #[test]
    fn test_media_for_gives_one_kind_per_target() {
        let draft = Draft::new("text")
            .with_media_url("https://cdn.example.com/a.jpg")
            .with_media_file("/tmp/clip.mp4");
        let blob = blob();

        assert!(media_for(Platform::YouTube, &draft, Some(&blob)).blob().is_some());
        assert!(media_for(Platform::Twitter, &draft, Some(&blob)).blob().is_some());
        assert_eq!(
            media_for(Platform::Instagram, &draft, Some(&blob)).url(),
            Some("https://cdn.example.com/a.jpg")
        );
        assert_eq!(
            media_for(Platform::Facebook, &draft, None).url(),
            Some("https://cdn.example.com/a.jpg")
        );
    }

    #[test]
    fn test_twitter_url_only() {
        let draft = Draft::new("text").with_media_url("https://cdn.example.com/a.jpg");
        let payload = media_for(Platform::Twitter, &draft, None);
        assert_eq!(payload.url(), Some("https://cdn.example.com/a.jpg"));
        assert!(matches!(
            media_for(Platform::Twitter, &Draft::new("text"), None),
            MediaPayload::None
        ));
    }
}
