//! Page content cleaning and storage
//!
//! Raw markup is stripped of non-content tags and whitespace-normalized
//! before it is written to the content store.

mod store;

pub use store::ContentStore;

use lol_html::{element, rewrite_str, RewriteStrSettings};

/// Tags removed from stored markup
const STRIPPED_TAGS: &str = "script, video, iframe";

/// Strips non-content elements and collapses whitespace runs
///
/// Scripts, inline video, and embedded frames carry no product content and
/// bloat the stored artifact; everything else is preserved. Markup that the
/// rewriter cannot process is kept as-is (trimmed), never discarded.
pub fn clean_html(markup: &str) -> String {
    let stripped = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!(STRIPPED_TAGS, |el| {
                el.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .unwrap_or_else(|e| {
        tracing::warn!("HTML rewrite failed, storing raw markup: {}", e);
        markup.to_string()
    });

    normalize_whitespace(&stripped)
}

/// Collapses consecutive whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
