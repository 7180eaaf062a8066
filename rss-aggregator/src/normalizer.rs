use crate::rss_utils::{feed::decode_html, time::to_millis};
use crate::types::{Item, RawEntry};

/// Convert a parsed entry into the canonical [`Item`].
///
/// Each fallback chain takes the first non-blank candidate. Description candidates
/// are HTML-decoded before that check.
pub fn normalize(entry: RawEntry, feed_title: Option<&str>) -> Item {
    let description = [entry.content_snippet, entry.content, entry.description]
        .into_iter()
        .flatten()
        .map(|candidate| decode_html(&candidate))
        .find(|candidate| is_present(candidate))
        .unwrap_or_default();

    let author = first_present([
        entry.creator,
        entry.author,
        feed_title.map(str::to_string),
    ])
    .unwrap_or_default();

    Item {
        title: entry.title.unwrap_or_default(),
        description,
        url: entry.link.unwrap_or_default(),
        date: to_millis(entry.iso_date),
        time: entry.pub_date,
        author,
        cover: entry.enclosure.and_then(|e| e.url),
        tags: entry.tags,
        categories: entry.categories,
    }
}

fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|c| is_present(c))
}
