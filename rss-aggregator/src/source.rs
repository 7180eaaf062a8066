use crate::traits::SourceReader;
use crate::types::{FetchConfig, RawFeed, Result};
use crate::{rss_utils, FeedParser, Fetcher};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// One configured source: a remote feed URL or a local feed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    Remote(Url),
    Local(PathBuf),
}

impl SourceDescriptor {
    /// Anything starting with `http://` or `https://` is remote, everything else a path.
    pub fn parse(source: &str) -> Result<Self> {
        if rss_utils::url::is_remote_source(source) {
            Ok(Self::Remote(Url::parse(source)?))
        } else {
            Ok(Self::Local(PathBuf::from(source)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Relative paths are resolved against the working directory.
    pub fn resolve(self) -> std::io::Result<Self> {
        match self {
            Self::Local(path) if path.is_relative() => {
                Ok(Self::Local(std::env::current_dir()?.join(path)))
            }
            other => Ok(other),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Default reader: HTTP for remote sources, the filesystem for local ones.
pub struct FeedSourceReader {
    fetcher: Fetcher,
    parser: FeedParser,
}

impl FeedSourceReader {
    pub fn new(config: FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
            parser: FeedParser::new(),
        })
    }

    async fn read_local(&self, path: &Path) -> Option<RawFeed> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Can not open file {}: {}", path.display(), e);
                return None;
            }
        };

        match self.parser.parse_feed(&content) {
            Ok(feed) => Some(feed),
            Err(e) => {
                warn!("Can not parse file {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[async_trait]
impl SourceReader for FeedSourceReader {
    async fn read(&self, source: &SourceDescriptor) -> Result<Option<RawFeed>> {
        match source {
            SourceDescriptor::Remote(url) => {
                let content = self.fetcher.fetch_feed(url).await?;
                let feed = self.parser.parse_feed(&content)?;
                Ok(Some(feed))
            }
            SourceDescriptor::Local(path) => {
                debug!("Reading local feed: {}", path.display());
                Ok(self.read_local(path).await)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Local</title><link>https://local.example.com/</link>
<item><title>Kept</title><link>https://local.example.com/kept</link></item>
</channel></rss>"#;

    #[test]
    fn classifies_descriptors() {
        let remote = SourceDescriptor::parse("https://tritonia.libsyn.com/rss").unwrap();
        assert!(remote.is_remote());
        assert_eq!(remote.to_string(), "https://tritonia.libsyn.com/rss");

        let local = SourceDescriptor::parse("atom.xml").unwrap();
        assert_eq!(local, SourceDescriptor::Local(PathBuf::from("atom.xml")));
    }

    #[test]
    fn malformed_urls_are_rejected() {
        assert!(SourceDescriptor::parse("https://").is_err());
    }

    #[test]
    fn relative_paths_resolve_against_working_dir() {
        let resolved = SourceDescriptor::parse("atom.xml").unwrap().resolve().unwrap();
        let expected = std::env::current_dir().unwrap().join("atom.xml");
        assert_eq!(resolved, SourceDescriptor::Local(expected));
    }

    #[tokio::test]
    async fn missing_local_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FeedSourceReader::new(FetchConfig::default()).unwrap();
        let source = SourceDescriptor::Local(dir.path().join("missing-history.xml"));

        assert!(reader.read(&source).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unparsable_local_file_is_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not a feed").unwrap();
        let reader = FeedSourceReader::new(FetchConfig::default()).unwrap();
        let source = SourceDescriptor::Local(file.path().to_path_buf());

        assert!(reader.read(&source).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_local_feed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", MINIMAL_RSS).unwrap();
        let reader = FeedSourceReader::new(FetchConfig::default()).unwrap();
        let source = SourceDescriptor::Local(file.path().to_path_buf());

        let feed = reader.read(&source).await.unwrap().unwrap();
        assert_eq!(feed.title.as_deref(), Some("Local"));
        assert_eq!(feed.entries.len(), 1);
    }
}
