use crate::rss_utils;
use crate::types::{AggregatorError, RawEnclosure, RawEntry, RawFeed, Result};
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use tracing::debug;

/// Turns a raw RSS, Atom or JSON Feed document into a [`RawFeed`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_feed(&self, content: &str) -> Result<RawFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let raw = Self::convert_feed(feed);
        debug!(
            "Parsed feed {:?} with {} entries",
            raw.title.as_deref().unwrap_or("<untitled>"),
            raw.entries.len()
        );
        Ok(raw)
    }

    fn convert_feed(feed: Feed) -> RawFeed {
        RawFeed {
            title: feed.title.map(|t| t.content),
            link: feed.links.first().map(|l| l.href.clone()),
            entries: feed.entries.into_iter().map(Self::parse_entry).collect(),
        }
    }

    fn parse_entry(entry: Entry) -> RawEntry {
        let title = entry.title.map(|t| t.content);
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone());

        let description = entry.summary.map(|s| s.content);
        let content = entry.content.and_then(|c| c.body);

        // Plain-text rendering of the richest body available
        let content_snippet = content
            .as_deref()
            .or(description.as_deref())
            .map(rss_utils::feed::extract_text_from_html)
            .filter(|s| !s.is_empty());

        let first_author = entry.authors.into_iter().next();
        let creator = first_author.as_ref().map(|a| a.name.clone()).filter(|n| !n.is_empty());
        let author = first_author.and_then(|a| a.email);

        let iso_date = entry.published.or(entry.updated);

        let enclosure = entry
            .media
            .iter()
            .flat_map(|m| m.content.iter())
            .find_map(|c| {
                c.url.as_ref().map(|url| RawEnclosure {
                    url: Some(url.to_string()),
                })
            })
            .or_else(|| {
                entry
                    .links
                    .iter()
                    .find(|l| l.rel.as_deref() == Some("enclosure"))
                    .map(|l| RawEnclosure {
                        url: Some(l.href.clone()),
                    })
            });

        let categories = entry.categories.iter().map(|c| c.term.clone()).collect();
        let tags = entry.categories.into_iter().filter_map(|c| c.label).collect();

        RawEntry {
            title,
            link,
            iso_date,
            pub_date: iso_date,
            content_snippet,
            content,
            description,
            creator,
            author,
            enclosure,
            tags,
            categories,
        }
    }
}
