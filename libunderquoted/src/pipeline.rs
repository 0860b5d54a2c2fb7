//! Mention processing
//!
//! One pass reads the mentions received since the stored cursor, answers
//! them oldest first and advances the cursor after every mention, whether
//! or not the reply went out. Processing order and cursor writes are what
//! make a pass resumable: a crash leaves the cursor at the last mention
//! handled, and older mentions are never skipped.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cursor::CursorStore;
use crate::error::Result;
use crate::platforms::Timeline;
use crate::quotations::QuotationSource;
use crate::retry::RetryPolicy;
use crate::types::{Mention, MentionFailure, PassReport, PostReport};

/// Default number of mentions read per pass
pub const DEFAULT_MENTION_BATCH: usize = 200;

/// Answers mentions with quotations
pub struct MentionPipeline {
    timeline: Arc<dyn Timeline>,
    quotations: Arc<dyn QuotationSource>,
    cursor: Arc<dyn CursorStore>,
    policy: RetryPolicy,
    mention_batch: usize,
}

impl MentionPipeline {
    pub fn new(
        timeline: Arc<dyn Timeline>,
        quotations: Arc<dyn QuotationSource>,
        cursor: Arc<dyn CursorStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            timeline,
            quotations,
            cursor,
            policy,
            mention_batch: DEFAULT_MENTION_BATCH,
        }
    }

    /// Read at most `mention_batch` mentions per pass
    pub fn with_mention_batch(mut self, mention_batch: usize) -> Self {
        self.mention_batch = mention_batch;
        self
    }

    /// Reply to every mention received since the stored cursor
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot be read or written, or the
    /// mentions cannot be fetched. Failed replies are not errors; they are
    /// listed in the returned report.
    pub async fn process_pending(&self) -> Result<PassReport> {
        let since_id = self.cursor.get().await?;
        debug!("Retrieved since_id: {:?}", since_id);

        let mentions = self
            .timeline
            .mentions(since_id.as_deref(), self.mention_batch)
            .await?;
        info!("Retrieved {} mentions", mentions.len());

        let mut report = PassReport::default();

        // The feed is most recent first; answer oldest first so the cursor
        // never moves past an unanswered mention
        for mention in mentions.iter().rev() {
            let post = self.reply_to(mention).await;
            if !post.is_success() {
                warn!(
                    "Reply to mention {} failed with code {}",
                    mention.id,
                    post.code()
                );
                report.failures.push(MentionFailure {
                    mention_id: mention.id.clone(),
                    code: post.code(),
                });
            }

            report.processed += 1;
            info!("Attempting to store since_id: {}", mention.id);
            self.cursor.set(&mention.id).await?;
        }

        Ok(report)
    }

    /// Answer one mention with a quotation matching its tags
    pub async fn reply_to(&self, mention: &Mention) -> PostReport {
        let addressee = mention.addressee();
        let quotation = self.quotations.fetch(&mention.tags).await;

        self.policy
            .post_with_retry(
                self.timeline.as_ref(),
                self.quotations.as_ref(),
                quotation,
                &mention.tags,
                Some(&addressee),
                Some(&mention.status_id),
            )
            .await
    }

    /// Publish one untagged quotation to the timeline
    pub async fn post_once(&self) -> PostReport {
        let quotation = self.quotations.fetch(&[]).await;

        self.policy
            .post_with_retry(
                self.timeline.as_ref(),
                self.quotations.as_ref(),
                quotation,
                &[],
                None,
                None,
            )
            .await
    }
}
