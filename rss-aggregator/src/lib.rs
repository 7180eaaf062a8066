pub mod types;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod source;
pub mod normalizer;
pub mod aggregator;
pub mod publisher;
pub mod traits;
pub mod rss_utils;

pub use types::*;
pub use config::{AggregatorConfig, AuthorInfo, FeedLinks, FeedMetadata};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use source::{FeedSourceReader, SourceDescriptor};
pub use normalizer::normalize;
pub use aggregator::{ItemCollection, RssAggregator};
pub use publisher::{CanonicalFeed, OutputFormat, PublishedFeeds, Publisher};
pub use traits::{FeedEncoder, SourceReader};
