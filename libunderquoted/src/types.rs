//! Core types for Underquoted

/// Platform code for a status rejected as a repeat of recent content.
pub const DUPLICATE_CONTENT_CODE: u32 = 187;

/// An inbound status addressed to the bot's account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// Position in the mentions feed, stored as the cursor value
    pub id: String,
    /// Status to reply to; equal to `id` on platforms with a single id space
    pub status_id: String,
    /// Author handle without the leading `@`
    pub addressee_handle: String,
    /// Hashtag texts, without the leading `#`
    pub tags: Vec<String>,
}

impl Mention {
    pub fn new(id: impl Into<String>, handle: impl Into<String>, tags: Vec<String>) -> Self {
        let id = id.into();
        Self {
            status_id: id.clone(),
            id,
            addressee_handle: handle.into(),
            tags,
        }
    }

    /// Reply to `status_id` while keeping `id` as the feed position
    pub fn with_status_id(mut self, status_id: impl Into<String>) -> Self {
        self.status_id = status_id.into();
        self
    }

    /// The handle as it is prefixed onto replies, e.g. `@jessamyn`
    pub fn addressee(&self) -> String {
        format!("@{}", self.addressee_handle)
    }
}

/// Result of publishing a single fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Success,
    /// The platform rejected the status as duplicate content
    DuplicateContent(u32),
    OtherFailure(u32),
}

impl PublishOutcome {
    /// Numeric result code, 0 for success
    pub fn code(&self) -> u32 {
        match self {
            PublishOutcome::Success => 0,
            PublishOutcome::DuplicateContent(code) | PublishOutcome::OtherFailure(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Success)
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, PublishOutcome::DuplicateContent(_))
    }
}

/// Outcome of one retry-guarded post (a quotation split into fragments)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReport {
    /// Outcome of the last attempt
    pub outcome: PublishOutcome,
    /// Number of attempts made, one per candidate text
    pub attempts: u32,
    /// True when duplicate rejections exhausted the retry bound
    pub abandoned: bool,
    /// Candidate text used by the last attempt
    pub text: String,
}

impl PostReport {
    pub fn code(&self) -> u32 {
        self.outcome.code()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// A mention whose reply ended in failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionFailure {
    pub mention_id: String,
    pub code: u32,
}

/// Summary of one pass over pending mentions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub processed: usize,
    pub failures: Vec<MentionFailure>,
}

impl PassReport {
    /// 0 when every reply succeeded, otherwise the code of the last failure
    pub fn code(&self) -> u32 {
        self.failures.last().map(|f| f.code).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_addressee() {
        let mention = Mention::new("123", "jessamyn", vec!["love".to_string()]);
        assert_eq!(mention.addressee(), "@jessamyn");
        assert_eq!(mention.status_id, "123");
    }

    #[test]
    fn test_mention_with_status_id() {
        let mention = Mention::new("9001", "js", vec![]).with_status_id("110234");
        assert_eq!(mention.id, "9001");
        assert_eq!(mention.status_id, "110234");
    }

    #[test]
    fn test_publish_outcome_codes() {
        assert_eq!(PublishOutcome::Success.code(), 0);
        assert_eq!(
            PublishOutcome::DuplicateContent(DUPLICATE_CONTENT_CODE).code(),
            187
        );
        assert_eq!(PublishOutcome::OtherFailure(503).code(), 503);

        assert!(PublishOutcome::DuplicateContent(187).is_duplicate());
        assert!(!PublishOutcome::OtherFailure(187).is_duplicate());
    }

    #[test]
    fn test_pass_report_code_uses_last_failure() {
        let mut report = PassReport {
            processed: 187,
            failures: vec![],
        };
        assert_eq!(report.code(), 0);

        report.failures.push(MentionFailure {
            mention_id: "1".to_string(),
            code: 187,
        });
        report.failures.push(MentionFailure {
            mention_id: "2".to_string(),
            code: 422,
        });
        assert_eq!(report.code(), 422);
        assert_eq!(report.processed, 187);
    }
}
