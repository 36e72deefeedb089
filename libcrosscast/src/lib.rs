//! Crosscast - publish one draft to many social platforms at once
//!
//! This library resolves the targeted accounts, validates each target before
//! any network call, publishes to YouTube, Instagram, Facebook and Twitter
//! concurrently, and records every successful publish.

pub mod accounts;
pub mod config;
pub mod credentials;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod media;
pub mod platforms;
pub mod recorder;
pub mod report;
pub mod scheduling;
pub mod service;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use accounts::AccountRegistry;
pub use config::Config;
pub use credentials::{CredentialStore, PlatformCredentials};
pub use db::Database;
pub use dispatcher::Dispatcher;
pub use error::{CrosscastError, PlatformError, Result, ValidationError};
pub use report::{aggregate, Aggregate, TargetReport};
pub use types::{
    Draft, ExternalRef, OutcomeStatus, Platform, PostRecord, PostStatus, PublishOutcome,
    SocialAccount, Target,
};
