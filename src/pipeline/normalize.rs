//! Markup stripping and whitespace normalization.
//!
//! Message bodies often arrive as HTML. The normalizer parses the input as an
//! HTML fragment, keeps only visible text (script and style contents are dropped,
//! entities are decoded), and collapses whitespace. Malformed markup never fails:
//! the HTML5 parser recovers and whatever text it finds is returned.

use scraper::{Html, Node};

/// Replacement text for messages that are empty after normalization.
pub const EMPTY_SENTINEL: &str = "empty";

/// Elements whose text content is never visible.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Converts raw message text to plain, whitespace-normalized text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer {
    warn_on_locator: bool,
}

impl TextNormalizer {
    /// Create a normalizer.
    ///
    /// # Arguments
    ///
    /// * `warn_on_locator` - log a warning when the input looks like a bare URL or
    ///   file path instead of message content
    pub fn new(warn_on_locator: bool) -> Self {
        TextNormalizer { warn_on_locator }
    }

    pub fn warns_on_locator(&self) -> bool {
        self.warn_on_locator
    }

    /// Strip markup and collapse whitespace. Empty input yields an empty string.
    pub fn normalize(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }
        if self.warn_on_locator && looks_like_locator(raw) {
            log::warn!(
                "Input looks like a locator rather than message text: {:.60}",
                raw.trim()
            );
        }
        if !raw.contains('<') && !raw.contains('&') {
            return compact_ws(raw);
        }
        compact_ws(&visible_text(raw))
    }

    /// Normalize and substitute [`EMPTY_SENTINEL`] for empty results.
    pub fn normalize_or_sentinel(&self, raw: &str) -> String {
        or_sentinel(self.normalize(raw))
    }
}

/// Normalize with the default (quiet) normalizer.
pub fn normalize(raw: &str) -> String {
    TextNormalizer::default().normalize(raw)
}

/// Return `text`, or the sentinel if it is empty or whitespace-only.
pub fn or_sentinel(text: String) -> String {
    if text.trim().is_empty() {
        EMPTY_SENTINEL.to_string()
    } else {
        text
    }
}

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn visible_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let mut parts: Vec<&str> = Vec::new();

    for node in fragment.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            parts.push(&**text);
        }
    }

    parts.join(" ")
}

fn looks_like_locator(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.contains(char::is_whitespace) {
        return false;
    }
    let lower = trimmed.to_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("www.")
        || lower.starts_with('/')
        || lower.ends_with(".html")
        || lower.ends_with(".htm")
}
