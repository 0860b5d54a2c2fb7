//! underquoted - answer mentions with quotations

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use libunderquoted::config::Config;
use libunderquoted::logging::{LogFormat, LoggingConfig};
use libunderquoted::platforms::mastodon::MastodonTimeline;
use libunderquoted::platforms::Timeline;
use libunderquoted::{
    HttpQuotationSource, MentionPipeline, Result, RetryPolicy, SqliteCursorStore,
    UnderquotedError,
};
use tracing::{info, warn};

const USAGE: &str =
    "You must specify a single command, either 'post_message' or 'reply_to_mentions'";

/// Exit status for command-line usage errors (EX_USAGE)
const USAGE_EXIT_CODE: i32 = 64;

/// Exit status for result codes too large for a process status (EX_SOFTWARE)
const OVERFLOW_EXIT_CODE: i32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
enum Command {
    /// Publish one quotation to the bot's timeline
    PostMessage,
    /// Reply to every mention received since the last run
    ReplyToMentions,
}

#[derive(Parser, Debug)]
#[command(name = "underquoted")]
#[command(version)]
#[command(about = "Answer mentions with quotations", long_about = None)]
struct Cli {
    /// Command to run
    #[arg(value_enum)]
    command: Command,

    /// Path to the configuration file
    #[arg(short, long, env = "UNDERQUOTED_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (text, json or pretty)
    #[arg(long)]
    log_format: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                process::exit(0);
            }
            _ => {
                println!("{}", USAGE);
                process::exit(USAGE_EXIT_CODE);
            }
        },
    };

    let log_format = match parse_log_format(cli.log_format.as_deref()) {
        Ok(format) => format,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    };
    LoggingConfig::resolve(log_format, cli.verbose).init();

    match run(&cli).await {
        Ok(code) => process::exit(exit_status(code)),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn parse_log_format(value: Option<&str>) -> Result<Option<LogFormat>> {
    value
        .map(|v| v.parse::<LogFormat>().map_err(UnderquotedError::InvalidInput))
        .transpose()
}

/// Map a result code onto a process exit status
///
/// Codes that do not fit in an exit status are reported as 70.
fn exit_status(code: u32) -> i32 {
    if code <= 255 {
        code as i32
    } else {
        OVERFLOW_EXIT_CODE
    }
}

async fn run(cli: &Cli) -> Result<u32> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let mut timeline = MastodonTimeline::from_config(&config.mastodon)?;
    if let Err(e) = timeline.fetch_instance_info().await {
        warn!("Using default character limit: {}", e);
    }

    let policy = RetryPolicy::new(config.message_length(timeline.character_limit()))
        .with_max_duplicate_retries(config.bot.max_duplicate_retries);

    let quotations = HttpQuotationSource::with_timeout(
        config.quotations.url.clone(),
        Duration::from_secs(config.quotations.timeout_secs),
    )?;
    let cursor = SqliteCursorStore::new(&config.cursor.path).await?;

    let pipeline = MentionPipeline::new(
        Arc::new(timeline),
        Arc::new(quotations),
        Arc::new(cursor),
        policy,
    )
    .with_mention_batch(config.bot.mention_batch);

    match cli.command {
        Command::PostMessage => {
            let report = pipeline.post_once().await;
            info!(
                "post_message finished with code {} after {} attempt(s)",
                report.code(),
                report.attempts
            );
            Ok(report.code())
        }
        Command::ReplyToMentions => {
            let report = pipeline.process_pending().await?;
            info!(
                "reply_to_mentions processed {} mention(s), {} failed",
                report.processed,
                report.failures.len()
            );
            Ok(report.code())
        }
    }
}
