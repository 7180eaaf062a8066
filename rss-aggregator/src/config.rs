use crate::publisher::OutputFormat;
use crate::types::{AggregatorError, FetchConfig, Result};
use crate::source::SourceDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder in `FeedMetadata::copyright` replaced with the run year.
pub const YEAR_PLACEHOLDER: &str = "{year}";

/// Everything a single aggregation run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Ordered source list. Later sources override same-titled items from earlier ones.
    pub sources: Vec<String>,
    pub output_dir: PathBuf,
    pub metadata: FeedMetadata,
    pub fetch: FetchConfig,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                // Previous run's output, keeps items that dropped off the live feeds.
                "atom.xml".to_string(),
                "https://feeds.megaphone.fm/MSC5503498991".to_string(),
                "https://tritonia.libsyn.com/rss".to_string(),
                "https://enhancedsessions.radiopush.net/podcast.xml".to_string(),
            ],
            output_dir: PathBuf::from("."),
            metadata: FeedMetadata::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl AggregatorConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        config.relocate_history();
        Ok(config)
    }

    /// Change where outputs go. A bare `atom.xml` history source follows them.
    pub fn set_output_dir(&mut self, dir: PathBuf) {
        self.output_dir = dir;
        self.relocate_history();
    }

    /// Point a bare `atom.xml` source at the Atom document this run will write,
    /// so the previous output is read back as history.
    fn relocate_history(&mut self) {
        if self.output_dir == Path::new(".") {
            return;
        }
        let file_name = OutputFormat::Atom.file_name();
        let history = self.output_dir.join(file_name).display().to_string();
        for source in self.sources.iter_mut().filter(|s| s.as_str() == file_name) {
            debug!("History source {} now reads {}", source, history);
            *source = history.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(AggregatorError::Config("no sources configured".to_string()));
        }
        if self.metadata.title.trim().is_empty() {
            return Err(AggregatorError::Config("feed title must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn source_descriptors(&self) -> Result<Vec<SourceDescriptor>> {
        self.sources.iter().map(|s| SourceDescriptor::parse(s)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub name: String,
    pub email: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedLinks {
    pub json: String,
    pub atom: String,
    pub rss: String,
}

/// Feed-level identity of the aggregated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedMetadata {
    pub title: String,
    pub description: String,
    pub id: String,
    pub link: String,
    pub language: Option<String>,
    pub image: Option<String>,
    pub favicon: Option<String>,
    /// May contain `{year}`, see [`FeedMetadata::resolve_copyright`].
    pub copyright: String,
    pub generator: String,
    pub feed_links: FeedLinks,
    pub author: AuthorInfo,
}

impl Default for FeedMetadata {
    fn default() -> Self {
        Self {
            title: "Sansha's DJ Radio".to_string(),
            description: "聚合多来源DJ Radio".to_string(),
            id: "http://sansha.world/".to_string(),
            link: "http://sansha.world/".to_string(),
            language: Some("zh".to_string()),
            image: Some(
                "https://p1.music.126.net/LPDBNYs8GIbMuPJmqPn16g==/109951166607206965.jpg"
                    .to_string(),
            ),
            favicon: Some("https://ravelloh.top/favicon.ico".to_string()),
            copyright: "Copyright © 2019 - {year} RavelloH. All rights reserved.".to_string(),
            generator: "https://github.com/RavelloH/rss-aggregator".to_string(),
            feed_links: FeedLinks {
                json: "https://rss-radio.sansha.world/feed.json".to_string(),
                atom: "https://rss-radio.sansha.world/atom.xml".to_string(),
                rss: "https://rss-radio.sansha.world/rss.xml".to_string(),
            },
            author: AuthorInfo {
                name: "WorldSansha".to_string(),
                email: "shijiesansha@gmail.com".to_string(),
                link: "https://sansha.world/".to_string(),
            },
        }
    }
}

impl FeedMetadata {
    pub fn resolve_copyright(&self, year: i32) -> String {
        self.copyright.replace(YEAR_PLACEHOLDER, &year.to_string())
    }

    /// Copy with the copyright template filled in; taken once at run start.
    pub fn for_year(&self, year: i32) -> Self {
        Self {
            copyright: self.resolve_copyright(year),
            ..self.clone()
        }
    }
}
