//! Underquoted - a quotation bot for the social web
//!
//! This library answers mentions with quotations fetched from a quotation
//! service, splitting long quotations into reply-sized fragments and
//! retrying with fresh quotations when the platform rejects duplicates.

pub mod chunker;
pub mod config;
pub mod cursor;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod platforms;
pub mod quotations;
pub mod retry;
pub mod types;

// Re-export commonly used types
pub use chunker::chunk;
pub use config::Config;
pub use cursor::{CursorStore, MemoryCursorStore, SqliteCursorStore};
pub use error::{Result, UnderquotedError};
pub use pipeline::MentionPipeline;
pub use platforms::Timeline;
pub use quotations::{HttpQuotationSource, QuotationSource};
pub use retry::RetryPolicy;
pub use types::{Mention, PassReport, PostReport, PublishOutcome};
