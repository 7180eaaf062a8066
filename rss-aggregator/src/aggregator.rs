use crate::config::AggregatorConfig;
use crate::normalizer::normalize;
use crate::publisher::{Publisher, PublishedFeeds};
use crate::rss_utils::time::compare_recency;
use crate::source::{FeedSourceReader, SourceDescriptor};
use crate::traits::SourceReader;
use crate::types::{Item, Result};
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Working set of items keyed by title.
///
/// A title appears at most once. Upserting an existing title replaces the whole
/// item in place, so it keeps the position of the first occurrence.
#[derive(Debug, Default, Clone)]
pub struct ItemCollection {
    items: Vec<Item>,
    index: HashMap<String, usize>,
}

impl ItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when an item with the same title was replaced.
    pub fn upsert(&mut self, item: Item) -> bool {
        match self.index.get(&item.title) {
            Some(&position) => {
                debug!("Replacing item: {}", item.title);
                self.items[position] = item;
                true
            }
            None => {
                self.index.insert(item.title.clone(), self.items.len());
                self.items.push(item);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Newest first, undated items last. Equal dates keep insertion order.
    pub fn into_sorted(self) -> Vec<Item> {
        let mut items = self.items;
        items.sort_by(|a, b| compare_recency(a.date, b.date));
        items
    }
}

/// Drives one aggregation pass: read every source, merge, sort, publish.
pub struct RssAggregator<R = FeedSourceReader> {
    config: AggregatorConfig,
    reader: R,
    started_at: DateTime<Utc>,
}

impl RssAggregator<FeedSourceReader> {
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        let reader = FeedSourceReader::new(config.fetch.clone())?;
        Ok(Self::with_reader(config, reader))
    }
}

impl<R: SourceReader> RssAggregator<R> {
    pub fn with_reader(config: AggregatorConfig, reader: R) -> Self {
        Self {
            config,
            reader,
            started_at: Utc::now(),
        }
    }

    /// Aggregate the configured sources.
    pub async fn aggregate(&self) -> Result<Vec<Item>> {
        let sources = self.config.source_descriptors()?;
        self.aggregate_sources(&sources).await
    }

    /// Sources are read one after another, never concurrently: a later source must
    /// see, and may replace, items merged from earlier ones. Any remote failure
    /// aborts the pass.
    pub async fn aggregate_sources(&self, sources: &[SourceDescriptor]) -> Result<Vec<Item>> {
        let mut collection = ItemCollection::new();

        for source in sources {
            let source = match source.clone().resolve() {
                Ok(resolved) => resolved,
                Err(e) => {
                    warn!("Can not resolve source {}: {}", source, e);
                    continue;
                }
            };

            let mut merged = 0usize;
            let mut replaced = 0usize;
            if let Some(feed) = self.reader.read(&source).await? {
                let feed_title = feed.title;
                for entry in feed.entries {
                    if collection.upsert(normalize(entry, feed_title.as_deref())) {
                        replaced += 1;
                    }
                    merged += 1;
                }
            }

            info!(
                "Fetched feed source: {} ({} entries, {} replaced)",
                source, merged, replaced
            );
        }

        Ok(collection.into_sorted())
    }

    /// Aggregate and encode every output format. Nothing is written.
    pub async fn build(&self) -> Result<PublishedFeeds> {
        info!("Starting fetch...");
        let items = self.aggregate().await?;
        info!("Successfully fetched all feeds ({} items)", items.len());

        info!("Starting building final feeds...");
        let metadata = self.config.metadata.for_year(self.started_at.year());
        Publisher::new().publish(&items, &metadata, self.started_at)
    }

    /// Full pass: outputs are written only after every source and every encoder
    /// succeeded.
    pub async fn run(&self) -> Result<Vec<PathBuf>> {
        let feeds = self.build().await?;
        let written = feeds.write_to(&self.config.output_dir).await?;
        info!("Feeds aggregated into {}", self.config.output_dir.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AggregatorError, RawEntry, RawFeed};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned feeds by descriptor and records the read order.
    #[derive(Default)]
    struct MockReader {
        feeds: HashMap<String, RawFeed>,
        failing: Vec<String>,
        reads: Mutex<Vec<String>>,
    }

    impl MockReader {
        fn with_feed(mut self, source: &str, feed: RawFeed) -> Self {
            self.feeds.insert(source.to_string(), feed);
            self
        }

        fn with_failure(mut self, source: &str) -> Self {
            self.failing.push(source.to_string());
            self
        }
    }

    #[async_trait]
    impl SourceReader for MockReader {
        async fn read(&self, source: &SourceDescriptor) -> Result<Option<RawFeed>> {
            let key = match source {
                SourceDescriptor::Remote(url) => url.to_string(),
                SourceDescriptor::Local(path) => path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };
            self.reads.lock().unwrap().push(key.clone());

            if self.failing.contains(&key) {
                return Err(AggregatorError::HttpStatus { url: key, status: 502 });
            }
            Ok(self.feeds.get(&key).cloned())
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn raw(title: &str, description: &str, date: Option<DateTime<Utc>>) -> RawEntry {
        RawEntry {
            title: Some(title.to_string()),
            link: Some(format!("https://example.com/{}", title.replace(' ', "-"))),
            description: Some(description.to_string()),
            iso_date: date,
            pub_date: date,
            ..RawEntry::default()
        }
    }

    fn feed(title: &str, entries: Vec<RawEntry>) -> RawFeed {
        RawFeed {
            title: Some(title.to_string()),
            link: None,
            entries,
        }
    }

    fn item(title: &str, date: Option<i64>) -> Item {
        Item {
            title: title.to_string(),
            description: String::new(),
            url: String::new(),
            date,
            time: None,
            author: String::new(),
            cover: None,
            tags: Vec::new(),
            categories: Vec::new(),
        }
    }

    fn sources(list: &[&str]) -> Vec<SourceDescriptor> {
        list.iter().map(|s| SourceDescriptor::parse(s).unwrap()).collect()
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut collection = ItemCollection::new();
        assert!(!collection.upsert(item("a", Some(1))));
        assert!(!collection.upsert(item("b", Some(2))));
        assert!(collection.upsert(item("a", Some(3))));

        let titles: Vec<&str> = collection.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        let replaced = collection.iter().find(|i| i.title == "a").and_then(|i| i.date);
        assert_eq!(replaced, Some(3));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn sorting_is_newest_first_with_undated_last() {
        let mut collection = ItemCollection::new();
        for (title, date) in [("old", Some(1)), ("undated-1", None), ("new", Some(3)), ("undated-2", None), ("mid", Some(2))] {
            collection.upsert(item(title, date));
        }

        let titles: Vec<String> = collection.into_sorted().into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["new", "mid", "old", "undated-1", "undated-2"]);
    }

    #[test]
    fn untitled_entries_collide() {
        let mut collection = ItemCollection::new();
        collection.upsert(item("", Some(1)));
        collection.upsert(item("", Some(2)));
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn later_source_wins_whole_item() {
        let a = RawEntry {
            tags: vec!["from-a".to_string()],
            ..raw("Episode 1", "from A", Some(day(2)))
        };
        let b = raw("Episode 1", "from B", Some(day(1)));
        let reader = MockReader::default()
            .with_feed("https://a.example.com/feed", feed("Feed A", vec![a]))
            .with_feed("https://b.example.com/feed", feed("Feed B", vec![b]));
        let aggregator = RssAggregator::with_reader(AggregatorConfig::default(), reader);

        let items = aggregator
            .aggregate_sources(&sources(&[
                "missing-history.xml",
                "https://a.example.com/feed",
                "https://b.example.com/feed",
            ]))
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "from B");
        assert_eq!(items[0].author, "Feed B");
        assert_eq!(items[0].date, Some(day(1).timestamp_millis()));
        assert!(items[0].tags.is_empty());
    }

    #[tokio::test]
    async fn sources_are_read_in_order() {
        let reader = MockReader::default();
        let aggregator = RssAggregator::with_reader(AggregatorConfig::default(), reader);
        aggregator
            .aggregate_sources(&sources(&["history.xml", "https://one.example.com/", "https://two.example.com/"]))
            .await
            .unwrap();

        let reads = aggregator.reader.reads.lock().unwrap().clone();
        assert_eq!(reads, vec!["history.xml", "https://one.example.com/", "https://two.example.com/"]);
    }

    #[tokio::test]
    async fn remote_failure_aborts_remaining_sources() {
        let reader = MockReader::default()
            .with_feed("https://ok.example.com/", feed("Ok", vec![raw("x", "x", Some(day(1)))]))
            .with_failure("https://down.example.com/");
        let aggregator = RssAggregator::with_reader(AggregatorConfig::default(), reader);

        let err = aggregator
            .aggregate_sources(&sources(&["https://down.example.com/", "https://ok.example.com/"]))
            .await
            .unwrap_err();

        assert!(err.is_fetch_error());
        let reads = aggregator.reader.reads.lock().unwrap().clone();
        assert_eq!(reads, vec!["https://down.example.com/"]);
    }

    #[tokio::test]
    async fn aggregation_is_repeatable() {
        let reader = MockReader::default().with_feed(
            "https://a.example.com/",
            feed(
                "A",
                vec![
                    raw("one", "1", Some(day(1))),
                    raw("two", "2", Some(day(5))),
                    raw("three", "3", None),
                    raw("four", "4", Some(day(3))),
                ],
            ),
        );
        let aggregator = RssAggregator::with_reader(AggregatorConfig::default(), reader);
        let list = sources(&["https://a.example.com/"]);

        let first = aggregator.aggregate_sources(&list).await.unwrap();
        let second = aggregator.aggregate_sources(&list).await.unwrap();

        assert_eq!(first, second);
        let titles: Vec<&str> = first.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["two", "four", "one", "three"]);
    }
}
