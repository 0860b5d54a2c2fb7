//! Mastodon timeline implementation
//!
//! This module reads mentions and publishes replies through the megalodon
//! library. Mentions are the `mention` notifications of the bot's account;
//! the notification id orders the feed and the mentioning status is the
//! reply target. Other notification types are excluded server-side, and
//! reads past a cursor page forward from it so older mentions are never
//! crowded out of the window.

use std::cmp::Ordering;
use std::future::Future;

use async_trait::async_trait;
use megalodon::entities::notification::{Notification, NotificationType};
use megalodon::megalodon::{GetNotificationsInputOptions, PostStatusInputOptions};
use megalodon::{Megalodon, SNS};
use secrecy::ExposeSecret;
use tracing::{debug, error};

use crate::config::MastodonConfig;
use crate::error::{PlatformError, Result, UnderquotedError};
use crate::platforms::Timeline;
use crate::types::{Mention, PublishOutcome, DUPLICATE_CONTENT_CODE};

/// Character limit assumed until instance info is fetched
const DEFAULT_CHARACTER_LIMIT: usize = 500;

/// Code reported for failures that carry no HTTP status
const UNKNOWN_FAILURE_CODE: u32 = 1;

/// Largest notifications page Mastodon serves
const MAX_PAGE_SIZE: usize = 80;

/// Notification types that never carry a mention
const EXCLUDED_TYPES: [NotificationType; 11] = [
    NotificationType::Follow,
    NotificationType::FollowRequest,
    NotificationType::Reblog,
    NotificationType::Favourite,
    NotificationType::PollVote,
    NotificationType::PollExpired,
    NotificationType::Status,
    NotificationType::Update,
    NotificationType::Move,
    NotificationType::AdminSignup,
    NotificationType::AdminReport,
];

/// Mastodon timeline client
pub struct MastodonTimeline {
    /// The megalodon client for API interactions
    client: Box<dyn Megalodon + Send + Sync>,

    /// Character limit for posts (instance-specific)
    character_limit: usize,
}

impl MastodonTimeline {
    /// Create a new Mastodon timeline
    ///
    /// # Arguments
    ///
    /// * `instance_url` - The base URL of the Mastodon instance (e.g., "https://mastodon.social")
    /// * `access_token` - OAuth access token of the bot account
    ///
    /// Uses the default 500 character limit; call `fetch_instance_info()` to
    /// pick up the instance-specific one.
    pub fn new(instance_url: String, access_token: String) -> Result<Self> {
        let client = megalodon::generator(SNS::Mastodon, instance_url, Some(access_token), None)
            .map_err(|e| {
                PlatformError::Authentication(format!("Failed to create Mastodon client: {:?}", e))
            })?;

        Ok(Self {
            client,
            character_limit: DEFAULT_CHARACTER_LIMIT,
        })
    }

    /// Create a Mastodon timeline from configuration
    ///
    /// The access token comes from `access_token` when set (environment),
    /// otherwise from the configured token file.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if no token is configured, the token
    /// file cannot be read, or it is empty.
    pub fn from_config(config: &MastodonConfig) -> Result<Self> {
        let token = match (&config.access_token, &config.token_file) {
            (Some(token), _) => token.expose_secret().trim().to_string(),
            (None, Some(token_file)) => read_token_file(token_file)?,
            (None, None) => {
                return Err(PlatformError::Authentication(
                    "No Mastodon access token configured".to_string(),
                )
                .into())
            }
        };

        if token.is_empty() {
            return Err(
                PlatformError::Authentication("Mastodon access token is empty".to_string()).into(),
            );
        }

        Self::new(normalize_instance_url(&config.instance), token)
    }

    /// Fetch the instance's character limit
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is unreachable or the request fails.
    pub async fn fetch_instance_info(&mut self) -> Result<()> {
        let response = self
            .client
            .get_instance()
            .await
            .map_err(|e| map_megalodon_error(e, "fetch instance info"))?;

        let limit = response.json.configuration.statuses.max_characters;
        self.character_limit = limit as usize;

        Ok(())
    }
}

#[async_trait]
impl Timeline for MastodonTimeline {
    async fn mentions(&self, since_id: Option<&str>, limit: usize) -> Result<Vec<Mention>> {
        collect_mentions(since_id, limit, |options| async move {
            let response = self
                .client
                .get_notifications(Some(&options))
                .await
                .map_err(|e| map_megalodon_error(e, "read mentions"))?;

            Ok::<_, UnderquotedError>(NotificationPage::from_notifications(response.json))
        })
        .await
    }

    async fn publish(&self, text: &str, reply_to: Option<&str>) -> PublishOutcome {
        let options = PostStatusInputOptions {
            in_reply_to_id: reply_to.map(str::to_string),
            ..Default::default()
        };

        match self.client.post_status(text.to_string(), Some(&options)).await {
            Ok(_) => {
                debug!("Published status ({} characters)", text.chars().count());
                PublishOutcome::Success
            }
            Err(e) => {
                let error_str = e.to_string();
                error!("Unable to post to mastodon: {}", error_str);
                classify_publish_error(&error_str)
            }
        }
    }

    fn name(&self) -> &str {
        "mastodon"
    }

    fn character_limit(&self) -> usize {
        self.character_limit
    }
}

/// One page of notifications reduced to what the mention reader needs
#[derive(Debug, Default)]
struct NotificationPage {
    /// Highest notification id in the page, of any type
    newest_id: Option<String>,
    /// Mentions in the page, most recent first
    mentions: Vec<Mention>,
}

impl NotificationPage {
    fn from_notifications(mut notifications: Vec<Notification>) -> Self {
        notifications.sort_by(|a, b| compare_ids(&b.id, &a.id));

        let newest_id = notifications.first().map(|n| n.id.clone());
        let mentions = notifications
            .into_iter()
            .filter(|notification| matches!(notification.r#type, NotificationType::Mention))
            .filter_map(|notification| {
                let status = notification.status?;
                let tags = status.tags.into_iter().map(|tag| tag.name).collect();
                Some(
                    Mention::new(notification.id, status.account.acct, tags)
                        .with_status_id(status.id),
                )
            })
            .collect();

        Self {
            newest_id,
            mentions,
        }
    }
}

/// Order Mastodon ids, which are decimal strings without leading zeros
fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Request options for the page of notifications just above `min_id`
fn notification_options(min_id: Option<&str>, limit: usize) -> GetNotificationsInputOptions {
    GetNotificationsInputOptions {
        limit: Some(limit.clamp(1, MAX_PAGE_SIZE) as u32),
        min_id: min_id.map(str::to_string),
        exclude_types: Some(EXCLUDED_TYPES.to_vec()),
        ..Default::default()
    }
}

/// Read up to `limit` mentions newer than `since_id`, most recent first
///
/// With a cursor, pages are walked forward from it (`min_id`), so when more
/// than `limit` mentions are pending the oldest ones are returned and the
/// rest wait for the next pass. Without a cursor only the newest page is read.
async fn collect_mentions<F, Fut>(
    since_id: Option<&str>,
    limit: usize,
    mut fetch: F,
) -> Result<Vec<Mention>>
where
    F: FnMut(GetNotificationsInputOptions) -> Fut,
    Fut: Future<Output = Result<NotificationPage>>,
{
    let Some(since_id) = since_id else {
        let page = fetch(notification_options(None, limit)).await?;
        return Ok(page.mentions.into_iter().take(limit).collect());
    };

    let mut oldest_first = Vec::new();
    let mut min_id = since_id.to_string();
    while oldest_first.len() < limit {
        let page = fetch(notification_options(Some(&min_id), limit - oldest_first.len())).await?;

        let Some(newest_id) = page.newest_id else {
            break;
        };
        if compare_ids(&newest_id, &min_id) != Ordering::Greater {
            break;
        }

        debug!(
            "Read {} mentions up to notification {}",
            page.mentions.len(),
            newest_id
        );
        oldest_first.extend(page.mentions.into_iter().rev());
        min_id = newest_id;
    }

    oldest_first.truncate(limit);
    oldest_first.reverse();
    Ok(oldest_first)
}

fn read_token_file(token_file: &str) -> Result<String> {
    let token_path = shellexpand::full(token_file).map_err(|e| {
        PlatformError::Authentication(format!("Failed to expand token file path: {}", e))
    })?;

    let token = std::fs::read_to_string(token_path.as_ref()).map_err(|e| {
        PlatformError::Authentication(format!("Failed to read Mastodon token file: {}", e))
    })?;

    Ok(token.trim().to_string())
}

/// Ensure the instance URL has a scheme
fn normalize_instance_url(instance: &str) -> String {
    if instance.starts_with("http://") || instance.starts_with("https://") {
        instance.to_string()
    } else {
        format!("https://{}", instance)
    }
}

/// Map a failed publish to a [`PublishOutcome`]
///
/// Rejections that say the status repeats recent content become
/// `DuplicateContent`, everything else is `OtherFailure` carrying the HTTP
/// status when one is present.
fn classify_publish_error(error_str: &str) -> PublishOutcome {
    let error_lower = error_str.to_lowercase();
    let status_code = extract_http_status(error_str);

    let duplicate = error_lower.contains("duplicate")
        || error_lower.contains("already been posted")
        || error_lower.contains("already posted");

    match status_code {
        Some(403) | Some(422) | None if duplicate => {
            PublishOutcome::DuplicateContent(DUPLICATE_CONTENT_CODE)
        }
        Some(code) => PublishOutcome::OtherFailure(code as u32),
        None => PublishOutcome::OtherFailure(UNKNOWN_FAILURE_CODE),
    }
}

/// Map megalodon errors to PlatformError
///
/// - HTTP 401/403 → `PlatformError::Authentication`
/// - HTTP 429 → `PlatformError::RateLimit`
/// - Parse errors → `PlatformError::Parse`
/// - Other errors → `PlatformError::Network`
fn map_megalodon_error(error: megalodon::error::Error, context: &str) -> PlatformError {
    let error_str = error.to_string();
    let error_lower = error_str.to_lowercase();

    match extract_http_status(&error_str) {
        Some(401) | Some(403) => PlatformError::Authentication(format!(
            "Mastodon authentication failed ({}): {}. \
                Suggestion: Verify your access token is valid and has not expired.",
            context, error_str
        )),
        Some(429) => PlatformError::RateLimit(format!(
            "Mastodon rate limit exceeded ({}): {}. \
                Suggestion: Run the next pass later.",
            context, error_str
        )),
        Some(_) => {
            PlatformError::Network(format!("Mastodon HTTP error ({}): {}", context, error_str))
        }
        None => {
            if error_lower.contains("unauthorized") || error_lower.contains("forbidden") {
                PlatformError::Authentication(format!(
                    "Mastodon authentication failed ({}): {}",
                    context, error_str
                ))
            } else if error_lower.contains("parse")
                || error_lower.contains("json")
                || error_lower.contains("deserialize")
            {
                PlatformError::Parse(format!(
                    "Mastodon response parse error ({}): {}",
                    context, error_str
                ))
            } else {
                PlatformError::Network(format!(
                    "Mastodon error ({}): {}. \
                        Suggestion: Check your network connection and instance availability.",
                    context, error_str
                ))
            }
        }
    }
}

/// Extract HTTP status code from error message
///
/// Looks for patterns like "HTTP 401", "status 403", "401:", etc.
fn extract_http_status(error_str: &str) -> Option<u16> {
    let prefixes = ["HTTP ", "status ", "code: ", "status_code: "];

    for prefix in &prefixes {
        if let Some(pos) = error_str.find(prefix) {
            let after_prefix = &error_str[pos + prefix.len()..];
            if let Some(code_str) = after_prefix.get(0..3) {
                if let Ok(code) = code_str.parse::<u16>() {
                    if (100..=599).contains(&code) {
                        return Some(code);
                    }
                }
            }
        }
    }

    // Standalone 3-digit codes followed by colon or space
    let bytes = error_str.as_bytes();
    for (i, window) in bytes.windows(4).enumerate() {
        if window[..3].iter().all(u8::is_ascii_digit) && (window[3] == b':' || window[3] == b' ')
        {
            if i > 0 && bytes[i - 1].is_ascii_digit() {
                continue;
            }
            if let Ok(code) = std::str::from_utf8(&window[..3]).unwrap_or("").parse::<u16>() {
                if (100..=599).contains(&code) {
                    return Some(code);
                }
            }
        }
    }

    None
}
