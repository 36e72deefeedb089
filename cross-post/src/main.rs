//! cross-post - Publish one draft to several social accounts at once

use clap::Parser;
use libcrosscast::logging::LoggingConfig;
use libcrosscast::scheduling::parse_schedule;
use libcrosscast::service::publishing::{
    PersistenceReport, PublishRequest, PublishResponse, RecordStatus,
};
use libcrosscast::service::CrosscastService;
use libcrosscast::{CrosscastError, Draft, OutcomeStatus, Result, Target, TargetReport};
use serde::Serialize;
use std::io::{IsTerminal, Read};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "cross-post")]
#[command(version)]
#[command(about = "Publish one draft to YouTube, Instagram, Facebook and Twitter")]
#[command(long_about = r#"Publish one draft to several connected social accounts at once.

Every target is validated before any network call. Targets that pass are
published concurrently; one failing target never stops the others.

EXAMPLES:
    # Text post to one Twitter account
    cross-post "Launch day!" --target twitter:acct-1

    # Image to Instagram and a Facebook Page (Pages use the Instagram account id)
    cross-post "New drop" --media-url https://cdn.example.com/drop.jpg \
        --target instagram:ig-1 --target facebook:ig-1

    # Video to YouTube and Twitter, text from stdin
    echo "Behind the scenes" | cross-post --media-file ./bts.mp4 \
        --target youtube:yt-1,twitter:acct-1

    # Schedule the YouTube upload and Facebook post
    cross-post "Premiere" --media-file ./premiere.mp4 --schedule "tomorrow 9am" \
        --target youtube:yt-1

    # JSON report for scripting
    cross-post "Hello" --target twitter:acct-1 --format json | jq '.reports[]'

CONFIGURATION:
    Configuration file: ~/.config/crosscast/config.toml (or $CROSSCAST_CONFIG)

EXIT CODES:
    0 - At least one target was published
    1 - Every target failed, or a runtime error
    2 - Authentication error
    3 - Invalid input
"#)]
struct Cli {
    /// Text to publish (reads from stdin if not provided)
    text: Option<String>,

    /// Target as platform:account_id (repeatable or comma-separated)
    #[arg(short, long = "target", value_name = "PLATFORM:ACCOUNT", value_delimiter = ',')]
    targets: Vec<String>,

    /// Public URL of an image or video
    #[arg(long, value_name = "URL")]
    media_url: Option<String>,

    /// Local media file, uploaded to YouTube and Twitter
    #[arg(long, value_name = "PATH")]
    media_file: Option<std::path::PathBuf>,

    /// Description for the YouTube video
    #[arg(long, value_name = "TEXT")]
    youtube_description: Option<String>,

    /// Publish later: "2h", "tomorrow 9am" or an RFC 3339 time
    #[arg(short, long, value_name = "WHEN")]
    schedule: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// JSON output for one run
#[derive(Serialize)]
struct JsonOutput<'a> {
    request_id: &'a str,
    any_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    reports: &'a [TargetReport],
    records: Vec<JsonRecord>,
}

#[derive(Serialize)]
struct JsonRecord {
    target: String,
    recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors are invalid input; --help and --version are not errors
            let code = if e.use_stderr() { 3 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    LoggingConfig::from_env(cli.verbose).init();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Returns whether at least one target succeeded
async fn run(cli: Cli) -> Result<bool> {
    let text = read_text(cli.text)?;
    let targets = parse_targets(&cli.targets)?;

    let mut draft = Draft::new(text);
    draft.media_url = cli.media_url;
    draft.media_file = cli.media_file;
    draft.youtube_description = cli.youtube_description;
    if let Some(when) = &cli.schedule {
        draft.scheduled_at = Some(parse_schedule(when)?);
    }

    let service = CrosscastService::new().await?;
    let response = service
        .publishing()
        .publish(PublishRequest { draft, targets })
        .await?;

    let PublishResponse {
        request_id,
        aggregate,
        persistence,
        ..
    } = response;
    let persistence = persistence.wait().await;
    debug!(request = %request_id, records = persistence.entries.len(), "Records written");

    match cli.format.as_str() {
        "json" => {
            let output = JsonOutput {
                request_id: &request_id,
                any_success: aggregate.any_success,
                summary: aggregate.summary.as_deref(),
                reports: &aggregate.reports,
                records: json_records(&persistence),
            };
            let json = serde_json::to_string_pretty(&output).map_err(|e| {
                CrosscastError::InvalidInput(format!("Failed to serialize output: {}", e))
            })?;
            println!("{}", json);
        }
        _ => {
            for report in &aggregate.reports {
                println!("{}", format_report(report));
            }
            for (target, status) in persistence.failures() {
                if let RecordStatus::PersistenceFailed(reason) = status {
                    eprintln!("Warning: {} was published but not recorded: {}", target, reason);
                }
            }
            if let Some(summary) = &aggregate.summary {
                println!("{}", summary);
            }
        }
    }

    Ok(aggregate.any_success)
}

/// Use the argument, or stdin when it is piped
fn read_text(arg: Option<String>) -> Result<String> {
    let text = match arg {
        Some(text) => text,
        None => {
            let mut stdin = std::io::stdin();
            if stdin.is_terminal() {
                return Err(CrosscastError::InvalidInput(
                    "No text provided. Pass it as an argument or pipe it on stdin".to_string(),
                ));
            }
            let mut buffer = String::new();
            stdin.read_to_string(&mut buffer).map_err(|e| {
                CrosscastError::InvalidInput(format!("Failed to read stdin: {}", e))
            })?;
            buffer
        }
    };

    Ok(text.trim_end_matches(['\n', '\r']).to_string())
}

/// Parse targets, dropping repeats while keeping the first occurrence's order
fn parse_targets(raw: &[String]) -> Result<Vec<Target>> {
    let mut targets: Vec<Target> = Vec::new();
    for value in raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let target: Target = value.parse()?;
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    if targets.is_empty() {
        return Err(CrosscastError::InvalidInput(
            "No targets given. Use --target platform:account_id".to_string(),
        ));
    }
    Ok(targets)
}

fn format_report(report: &TargetReport) -> String {
    let mark = match report.status {
        OutcomeStatus::Success => "ok",
        OutcomeStatus::ValidationFailed => "invalid",
        OutcomeStatus::ExternalApiFailed => "failed",
    };

    let mut line = format!(
        "{}:{}\t{}\t{}",
        report.platform, report.account_id, mark, report.message
    );
    if let Some(url) = &report.url {
        line.push('\t');
        line.push_str(url);
    }
    line
}

fn json_records(persistence: &PersistenceReport) -> Vec<JsonRecord> {
    persistence
        .entries
        .iter()
        .map(|(target, status)| JsonRecord {
            target: target.to_string(),
            recorded: *status == RecordStatus::Recorded,
            error: match status {
                RecordStatus::Recorded => None,
                RecordStatus::PersistenceFailed(reason) => Some(reason.clone()),
            },
        })
        .collect()
}
