//! Duplicate-content retry policy
//!
//! Platforms reject statuses that repeat recent content. When that happens
//! the whole quotation is retried with a freshly fetched one, and the last
//! allowed attempt falls back to the deterministic "not found" message so
//! the retries are bounded and the mention still gets an answer.

use tracing::{error, info, warn};

use crate::chunker::chunk;
use crate::platforms::Timeline;
use crate::quotations::{not_found_message, QuotationSource};
use crate::types::{PostReport, PublishOutcome, DUPLICATE_CONTENT_CODE};

/// Attempt index that switches to the fallback message
pub const DEFAULT_MAX_DUPLICATE_RETRIES: u32 = 10;

/// How quotations are split and retried when publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fragment budget in characters
    pub message_length: usize,
    /// Attempt index that publishes the fallback message; one more
    /// duplicate rejection after it abandons the post
    pub max_duplicate_retries: u32,
}

impl RetryPolicy {
    pub fn new(message_length: usize) -> Self {
        Self {
            message_length,
            max_duplicate_retries: DEFAULT_MAX_DUPLICATE_RETRIES,
        }
    }

    pub fn with_max_duplicate_retries(mut self, max_duplicate_retries: u32) -> Self {
        self.max_duplicate_retries = max_duplicate_retries;
        self
    }

    /// Publish `quotation`, retrying with fresh quotations on duplicate rejection
    ///
    /// The first attempt uses `quotation`. Later attempts fetch a new one from
    /// `source` for `tags`, except attempt `max_duplicate_retries`, which uses
    /// the "not found" message for `tags`. A duplicate rejection of that
    /// attempt abandons the post. Any other failure ends it immediately.
    ///
    /// Every fragment is prefixed with `addressee` and sent as a reply to
    /// `reply_to` when those are given.
    pub async fn post_with_retry(
        &self,
        timeline: &dyn Timeline,
        source: &dyn QuotationSource,
        quotation: String,
        tags: &[String],
        addressee: Option<&str>,
        reply_to: Option<&str>,
    ) -> PostReport {
        let mut outcome = PublishOutcome::DuplicateContent(DUPLICATE_CONTENT_CODE);
        let mut attempts: u32 = 0;
        let mut abandoned = false;
        let mut text = quotation;

        while outcome.is_duplicate() {
            if attempts > self.max_duplicate_retries {
                error!(
                    "Unable to post duplicate message to {}: {}",
                    addressee.unwrap_or("timeline"),
                    text
                );
                abandoned = true;
                break;
            } else if attempts == self.max_duplicate_retries {
                text = not_found_message(tags);
            } else if attempts > 0 {
                text = source.fetch(tags).await;
            }

            outcome = self
                .publish_fragments(timeline, &text, addressee, reply_to)
                .await;
            attempts += 1;

            if outcome.is_duplicate() {
                warn!(
                    "Duplicate content rejected by {} (attempt {})",
                    timeline.name(),
                    attempts
                );
            }
        }

        if outcome.is_success() && attempts > 1 {
            info!("Posted to {} on attempt {}", timeline.name(), attempts);
        }

        PostReport {
            outcome,
            attempts,
            abandoned,
            text,
        }
    }

    /// Publish every fragment of `text` in order, stopping at the first failure
    async fn publish_fragments(
        &self,
        timeline: &dyn Timeline,
        text: &str,
        addressee: Option<&str>,
        reply_to: Option<&str>,
    ) -> PublishOutcome {
        for fragment in chunk(text, self.message_length, addressee) {
            let outcome = timeline.publish(&fragment, reply_to).await;
            if !outcome.is_success() {
                if !outcome.is_duplicate() {
                    error!(
                        "Unable to post to {}: code {}",
                        timeline.name(),
                        outcome.code()
                    );
                }
                return outcome;
            }
        }

        PublishOutcome::Success
    }
}
