use crate::config::FeedMetadata;
use crate::rss_utils::feed::decode_html;
use crate::traits::FeedEncoder;
use crate::types::{AggregatorError, Item, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Rss,
    Atom,
    Json,
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Rss => "RSS 2.0",
            OutputFormat::Atom => "Atom 1.0",
            OutputFormat::Json => "JSON Feed",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            OutputFormat::Rss => "rss.xml",
            OutputFormat::Atom => "atom.xml",
            OutputFormat::Json => "feed.json",
        }
    }
}

/// Entry date written for undated items. The epoch keeps them below every real
/// date when `atom.xml` is read back as history.
pub fn undated_entry_date() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// One entry of the outgoing feed, already mapped from an [`Item`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub id: String,
    pub link: String,
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub labels: Vec<String>,
    pub cover: Option<String>,
}

/// Format-neutral feed handed to every encoder.
#[derive(Debug, Clone)]
pub struct CanonicalFeed {
    pub metadata: FeedMetadata,
    pub entries: Vec<FeedEntry>,
    pub updated: DateTime<Utc>,
}

impl CanonicalFeed {
    /// Entries are authored by the feed owner, not by the item's original author.
    /// Undated items get [`undated_entry_date`].
    pub fn build(items: &[Item], metadata: &FeedMetadata, updated: DateTime<Utc>) -> Self {
        let entries = items
            .iter()
            .map(|item| FeedEntry {
                id: item.url.clone(),
                link: item.url.clone(),
                title: item.title.clone(),
                content: decode_html(&item.description),
                date: item.time.unwrap_or_else(undated_entry_date),
                labels: item.labels(),
                cover: item.cover.clone(),
            })
            .collect();

        Self {
            metadata: metadata.clone(),
            entries,
            updated,
        }
    }
}

/// Encoded documents, held in memory until all formats succeeded.
#[derive(Debug, Clone)]
pub struct PublishedFeeds {
    pub rss: Vec<u8>,
    pub atom: Vec<u8>,
    pub json: Vec<u8>,
}

impl PublishedFeeds {
    pub fn documents(&self) -> [(OutputFormat, &[u8]); 3] {
        [
            (OutputFormat::Rss, self.rss.as_slice()),
            (OutputFormat::Atom, self.atom.as_slice()),
            (OutputFormat::Json, self.json.as_slice()),
        ]
    }

    /// Replace the three output files in `dir`.
    pub async fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir).await?;

        let mut written = Vec::with_capacity(3);
        for (format, bytes) in self.documents() {
            let path = dir.join(format.file_name());
            tokio::fs::write(&path, bytes).await?;
            debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
            written.push(path);
        }
        Ok(written)
    }
}

pub struct Publisher {
    rss: RssEncoder,
    atom: AtomEncoder,
    json: JsonFeedEncoder,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher {
    pub fn new() -> Self {
        Self {
            rss: RssEncoder,
            atom: AtomEncoder,
            json: JsonFeedEncoder,
        }
    }

    pub fn publish(
        &self,
        items: &[Item],
        metadata: &FeedMetadata,
        updated: DateTime<Utc>,
    ) -> Result<PublishedFeeds> {
        let feed = CanonicalFeed::build(items, metadata, updated);
        info!("Encoding {} entries", feed.entries.len());

        Ok(PublishedFeeds {
            rss: self.rss.encode(&feed)?,
            atom: self.atom.encode(&feed)?,
            json: self.json.encode(&feed)?,
        })
    }
}

fn encode_error(format: OutputFormat, reason: impl ToString) -> AggregatorError {
    AggregatorError::Encode {
        format: format.name(),
        reason: reason.to_string(),
    }
}

pub struct RssEncoder;

impl FeedEncoder for RssEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Rss
    }

    fn encode(&self, feed: &CanonicalFeed) -> Result<Vec<u8>> {
        let meta = &feed.metadata;
        // RSS wants an email address for item authors
        let author = format!("{} ({})", meta.author.email, meta.author.name);

        let items: Vec<rss::Item> = feed
            .entries
            .iter()
            .map(|entry| {
                let mut guid = rss::Guid::default();
                guid.set_value(entry.id.clone());
                guid.set_permalink(true);

                let categories: Vec<_> = entry
                    .labels
                    .iter()
                    .map(|label| {
                        let mut category = rss::Category::default();
                        category.set_name(label.clone());
                        category
                    })
                    .collect();

                let mut item = rss::Item::default();
                item.set_title(entry.title.clone());
                item.set_link(entry.link.clone());
                item.set_guid(guid);
                item.set_description(entry.content.clone());
                item.set_author(author.clone());
                item.set_pub_date(entry.date.to_rfc2822());
                item.set_categories(categories);
                item
            })
            .collect();

        let mut channel = rss::Channel::default();
        channel.set_title(meta.title.clone());
        channel.set_link(meta.link.clone());
        channel.set_description(meta.description.clone());
        channel.set_language(meta.language.clone());
        channel.set_copyright(meta.copyright.clone());
        channel.set_generator(meta.generator.clone());
        channel.set_last_build_date(feed.updated.to_rfc2822());
        if let Some(url) = &meta.image {
            let mut image = rss::Image::default();
            image.set_url(url.clone());
            image.set_title(meta.title.clone());
            image.set_link(meta.link.clone());
            channel.set_image(image);
        }
        channel.set_items(items);

        channel
            .write_to(Vec::new())
            .map_err(|e| encode_error(self.format(), e))
    }
}

pub struct AtomEncoder;

impl FeedEncoder for AtomEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Atom
    }

    fn encode(&self, feed: &CanonicalFeed) -> Result<Vec<u8>> {
        use atom_syndication::{Category, Content, Generator, Link, Person};

        let meta = &feed.metadata;
        let author = Person {
            name: meta.author.name.clone(),
            email: Some(meta.author.email.clone()),
            uri: Some(meta.author.link.clone()),
            extensions: Default::default(),
        };

        let link = |href: &str, rel: &str, mime_type: Option<&str>| {
            let mut link = Link::default();
            link.set_href(href);
            link.set_rel(rel);
            link.set_mime_type(mime_type.map(str::to_string));
            link
        };

        let entries: Vec<atom_syndication::Entry> = feed
            .entries
            .iter()
            .map(|entry| {
                let date: DateTime<FixedOffset> = entry.date.into();

                let mut links = vec![link(&entry.link, "alternate", None)];
                if let Some(cover) = &entry.cover {
                    links.push(link(cover, "enclosure", None));
                }

                let mut content = Content::default();
                content.set_value(entry.content.clone());
                content.set_content_type("html".to_string());

                let categories = entry
                    .labels
                    .iter()
                    .map(|label| {
                        let mut category = Category::default();
                        category.set_term(label.clone());
                        category
                    })
                    .collect::<Vec<_>>();

                let mut atom_entry = atom_syndication::Entry::default();
                atom_entry.set_title(entry.title.clone());
                atom_entry.set_id(entry.id.clone());
                atom_entry.set_links(links);
                atom_entry.set_updated(date);
                atom_entry.set_published(date);
                atom_entry.set_authors(vec![author.clone()]);
                atom_entry.set_content(content);
                atom_entry.set_categories(categories);
                atom_entry
            })
            .collect();

        let mut generator = Generator::default();
        generator.set_value("rss-aggregator");
        generator.set_uri(meta.generator.clone());

        let mut atom = atom_syndication::Feed::default();
        atom.set_title(meta.title.clone());
        atom.set_id(meta.id.clone());
        atom.set_updated(feed.updated);
        atom.set_subtitle(atom_syndication::Text::from(meta.description.clone()));
        atom.set_links(vec![
            link(&meta.link, "alternate", None),
            link(&meta.feed_links.atom, "self", Some("application/atom+xml")),
        ]);
        atom.set_authors(vec![author]);
        atom.set_rights(atom_syndication::Text::from(meta.copyright.clone()));
        atom.set_generator(generator);
        atom.set_icon(meta.favicon.clone());
        atom.set_logo(meta.image.clone());
        atom.set_lang(meta.language.clone());
        atom.set_entries(entries);

        atom.write_to(Vec::new())
            .map_err(|e| encode_error(self.format(), e))
    }
}

#[derive(Debug, Serialize)]
struct JsonFeed<'a> {
    version: &'static str,
    title: &'a str,
    home_page_url: &'a str,
    feed_url: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    favicon: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    authors: Vec<JsonFeedAuthor<'a>>,
    items: Vec<JsonFeedItem<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonFeedAuthor<'a> {
    name: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonFeedItem<'a> {
    id: &'a str,
    url: &'a str,
    title: &'a str,
    content_html: &'a str,
    date_published: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<&'a str>,
}

pub struct JsonFeedEncoder;

impl FeedEncoder for JsonFeedEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn encode(&self, feed: &CanonicalFeed) -> Result<Vec<u8>> {
        let meta = &feed.metadata;
        let author = JsonFeedAuthor {
            name: &meta.author.name,
            url: &meta.author.link,
        };

        let items = feed
            .entries
            .iter()
            .map(|entry| JsonFeedItem {
                id: &entry.id,
                url: &entry.link,
                title: &entry.title,
                content_html: &entry.content,
                date_published: entry.date.to_rfc3339(),
                image: entry.cover.as_deref(),
                tags: entry.labels.iter().map(String::as_str).collect(),
            })
            .collect();

        let document = JsonFeed {
            version: "https://jsonfeed.org/version/1.1",
            title: &meta.title,
            home_page_url: &meta.link,
            feed_url: &meta.feed_links.json,
            description: &meta.description,
            icon: meta.image.as_deref(),
            favicon: meta.favicon.as_deref(),
            language: meta.language.as_deref(),
            authors: vec![author],
            items,
        };

        serde_json::to_vec_pretty(&document).map_err(|e| encode_error(self.format(), e))
    }
}
