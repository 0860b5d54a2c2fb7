//! Mock timeline implementation for testing
//!
//! This module provides a configurable timeline that serves a fixed batch of
//! mentions and answers publishes with scripted outcomes. It records every
//! call so tests can verify ordering, reply targets and cursor handling
//! without platform credentials or network access.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::Timeline;
use crate::types::{Mention, PublishOutcome, DUPLICATE_CONTENT_CODE};

/// A status handed to [`Timeline::publish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedStatus {
    pub text: String,
    pub reply_to: Option<String>,
}

/// Arguments of one [`Timeline::mentions`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionQuery {
    pub since_id: Option<String>,
    pub limit: usize,
}

/// Mock timeline for testing
pub struct MockTimeline {
    name: String,

    /// Character limit reported to callers
    character_limit: usize,

    /// Mentions served by every read, most recent first
    mentions: Vec<Mention>,

    /// Error returned instead of mentions
    mentions_error: Option<PlatformError>,

    /// Outcomes consumed by successive publishes
    scripted: Mutex<VecDeque<PublishOutcome>>,

    /// Outcome once the script is exhausted
    default_outcome: PublishOutcome,

    /// Statuses that have been published (for verification)
    published: Arc<Mutex<Vec<PublishedStatus>>>,

    /// Mention reads that have been made (for verification)
    mention_queries: Arc<Mutex<Vec<MentionQuery>>>,
}

impl MockTimeline {
    /// Create a mock timeline where every publish succeeds
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            character_limit: 500,
            mentions: Vec::new(),
            mentions_error: None,
            scripted: Mutex::new(VecDeque::new()),
            default_outcome: PublishOutcome::Success,
            published: Arc::new(Mutex::new(Vec::new())),
            mention_queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock timeline that rejects every publish as duplicate content
    pub fn always_duplicate(name: &str) -> Self {
        Self::new(name).with_default(PublishOutcome::DuplicateContent(DUPLICATE_CONTENT_CODE))
    }

    /// Create a mock timeline whose mention reads fail
    pub fn mentions_failure(name: &str, error: PlatformError) -> Self {
        let mut timeline = Self::new(name);
        timeline.mentions_error = Some(error);
        timeline
    }

    /// Serve `mentions` (most recent first) from every read
    pub fn with_mentions(mut self, mentions: Vec<Mention>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Answer publishes with `outcomes` in order before falling back to the default
    pub fn with_script(self, outcomes: Vec<PublishOutcome>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .extend(outcomes);
        self
    }

    pub fn with_default(mut self, outcome: PublishOutcome) -> Self {
        self.default_outcome = outcome;
        self
    }

    /// Get all statuses that were published
    pub fn published(&self) -> Vec<PublishedStatus> {
        self.published.lock().unwrap().clone()
    }

    /// Get the text of every published status
    pub fn published_texts(&self) -> Vec<String> {
        self.published().into_iter().map(|s| s.text).collect()
    }

    /// Get the number of times publish was called
    pub fn publish_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    /// Get every mention read that was made
    pub fn mention_queries(&self) -> Vec<MentionQuery> {
        self.mention_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Timeline for MockTimeline {
    async fn mentions(&self, since_id: Option<&str>, limit: usize) -> Result<Vec<Mention>> {
        self.mention_queries.lock().unwrap().push(MentionQuery {
            since_id: since_id.map(str::to_string),
            limit,
        });

        if let Some(error) = &self.mentions_error {
            return Err(error.clone().into());
        }

        // Oldest `limit` mentions, still most recent first
        let skip = self.mentions.len().saturating_sub(limit);
        Ok(self.mentions.iter().skip(skip).cloned().collect())
    }

    async fn publish(&self, text: &str, reply_to: Option<&str>) -> PublishOutcome {
        self.published.lock().unwrap().push(PublishedStatus {
            text: text.to_string(),
            reply_to: reply_to.map(str::to_string),
        });

        self.scripted
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_outcome)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn character_limit(&self) -> usize {
        self.character_limit
    }
}
