//! Social timeline abstraction and implementations
//!
//! A [`Timeline`] is the bot's view of its social account: the mentions it
//! has received and the ability to publish statuses, optionally as replies.
//!
//! # Examples
//!
//! ```no_run
//! use libunderquoted::platforms::{Timeline, mastodon::MastodonTimeline};
//!
//! # async fn example() -> libunderquoted::error::Result<()> {
//! let timeline = MastodonTimeline::new(
//!     "https://mastodon.social".to_string(),
//!     "your-access-token".to_string(),
//! )?;
//!
//! // Most recent first
//! let mentions = timeline.mentions(None, 200).await?;
//! for mention in &mentions {
//!     let outcome = timeline
//!         .publish(&format!("{} hello", mention.addressee()), Some(&mention.status_id))
//!         .await;
//!     println!("{}: {:?}", mention.id, outcome);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Mention, PublishOutcome};

pub mod mastodon;

// Mock timeline is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Unified interface to the account the bot posts from
#[async_trait]
pub trait Timeline: Send + Sync {
    /// Mentions newer than `since_id`, most recent first
    ///
    /// `since_id` is the [`Mention::id`] of the last mention handled; `None`
    /// reads without a lower bound. At most `limit` mentions are returned;
    /// when more are pending above `since_id`, the oldest of them are, so a
    /// cursor advanced through the result never passes an unread mention.
    ///
    /// # Errors
    ///
    /// Returns a `PlatformError` if the mentions cannot be read.
    async fn mentions(&self, since_id: Option<&str>, limit: usize) -> Result<Vec<Mention>>;

    /// Publish one status, as a reply to `reply_to` when given
    ///
    /// Failures are reported through the returned [`PublishOutcome`] so the
    /// caller can tell duplicate-content rejections apart from the rest.
    async fn publish(&self, text: &str, reply_to: Option<&str>) -> PublishOutcome;

    /// Lowercase platform identifier (e.g. "mastodon")
    fn name(&self) -> &str;

    /// Maximum number of characters in a single status
    fn character_limit(&self) -> usize;
}
