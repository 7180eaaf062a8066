/// Feed-specific helpers shared by the reader, normalizer and publisher

/// URL utilities for feed sources
pub mod url {
    use url::Url;

    /// True when the descriptor names a remote feed rather than a local file.
    pub fn is_remote_source(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    /// Extract domain from URL
    pub fn extract_domain(url_str: &str) -> Option<String> {
        if let Ok(url) = Url::parse(url_str) {
            url.domain().map(|d| d.to_string())
        } else {
            None
        }
    }
}

/// Text helpers for feed entry bodies
pub mod feed {
    /// Extract clean text content from HTML
    pub fn extract_text_from_html(html: &str) -> String {
        html.chars()
            .fold((String::new(), false), |(mut text, in_tag), c| {
                match c {
                    '<' => (text, true),
                    '>' => (text, false),
                    _ if !in_tag => {
                        text.push(c);
                        (text, in_tag)
                    }
                    _ => (text, in_tag),
                }
            })
            .0
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Decode HTML entities, then turn `<br>` variants into newlines and
    /// non-breaking spaces into plain ones.
    pub fn decode_html(input: &str) -> String {
        if input.is_empty() {
            return String::new();
        }
        html_escape::decode_html_entities(input)
            .replace("&nbsp;", " ")
            .replace('\u{a0}', " ")
            .replace("<br/>", "\n")
            .replace("<br />", "\n")
            .replace("<br>", "\n")
    }
}

/// Time utilities
pub mod time {
    use chrono::{DateTime, Utc};
    use std::cmp::Ordering;

    /// Newest first; missing dates after every valid one.
    pub fn compare_recency(a: Option<i64>, b: Option<i64>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    pub fn to_millis(date: Option<DateTime<Utc>>) -> Option<i64> {
        date.map(|d| d.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn remote_sources_need_http_scheme() {
        assert!(url::is_remote_source("https://example.com/feed.xml"));
        assert!(url::is_remote_source("http://example.com/rss"));
        assert!(!url::is_remote_source("atom.xml"));
        assert!(!url::is_remote_source("ftp://example.com/feed"));
        assert!(!url::is_remote_source("./https/feed.xml"));
    }

    #[test]
    fn domain_extraction() {
        assert_eq!(url::extract_domain("https://tritonia.libsyn.com/rss"), Some("tritonia.libsyn.com".to_string()));
        assert_eq!(url::extract_domain("atom.xml"), None);
    }

    #[test]
    fn html_text_extraction_collapses_whitespace() {
        assert_eq!(
            feed::extract_text_from_html("<p>Live   set</p>\n<p>from <b>Berlin</b></p>"),
            "Live set from Berlin"
        );
    }

    #[test]
    fn decodes_entities_and_breaks() {
        assert_eq!(feed::decode_html("A &amp; B &lt;tag&gt;"), "A & B <tag>");
        assert_eq!(feed::decode_html("it&#39;s &quot;on&quot;<br/>now"), "it's \"on\"\nnow");
        assert_eq!(feed::decode_html("a&nbsp;b&#x2F;c"), "a b/c");
        assert_eq!(feed::decode_html(""), "");
    }

    #[test]
    fn escaped_breaks_and_spaces_decode_like_literal_ones() {
        assert_eq!(feed::decode_html("a&lt;br/&gt;b"), "a\nb");
        assert_eq!(feed::decode_html("a&lt;br /&gt;b<br>c"), "a\nb\nc");
        assert_eq!(feed::decode_html("&amp;nbsp;"), " ");
        assert_eq!(feed::decode_html("x\u{a0}y"), "x y");
    }

    #[test]
    fn recency_puts_missing_dates_last() {
        assert_eq!(time::compare_recency(Some(2), Some(1)), Ordering::Less);
        assert_eq!(time::compare_recency(Some(1), Some(2)), Ordering::Greater);
        assert_eq!(time::compare_recency(Some(1), None), Ordering::Less);
        assert_eq!(time::compare_recency(None, Some(1)), Ordering::Greater);
        assert_eq!(time::compare_recency(None, None), Ordering::Equal);
    }
}
