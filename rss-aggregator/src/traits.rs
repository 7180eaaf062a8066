use crate::publisher::{CanonicalFeed, OutputFormat};
use crate::source::SourceDescriptor;
use crate::types::{RawFeed, Result};
use async_trait::async_trait;

/// Trait for retrieving and parsing one configured feed source
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Read and parse the source.
    ///
    /// `Ok(None)` means the source was skipped: an unreadable local file is not an
    /// error. Remote failures are returned as errors and end the run.
    async fn read(&self, source: &SourceDescriptor) -> Result<Option<RawFeed>>;
}

/// Trait for serializing the aggregated feed in one output format
pub trait FeedEncoder: Send + Sync {
    fn format(&self) -> OutputFormat;

    fn encode(&self, feed: &CanonicalFeed) -> Result<Vec<u8>>;
}
