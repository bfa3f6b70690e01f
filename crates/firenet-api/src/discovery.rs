// Stove discovery from the summary page.
//
// The summary page is server-rendered HTML. Stoves are read from
// `data-stove` JSON attributes; pages without them fall back to the
// plain `/web/stove/{id}` links of the stove list.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::models::StoveDescriptor;

static STOVE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-stove\s*=\s*(?:'([^']*)'|"([^"]*)")"#).expect("valid attribute regex")
});

static STOVE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a\b[^>]*href\s*=\s*["']/web/stove/([^"'/?#]+)["'][^>]*>(.*?)</a>"#)
        .expect("valid link regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Extract stove descriptors from the summary page, in document order.
///
/// Descriptors with an empty id are skipped; a repeated id keeps its
/// first occurrence. An empty result means the page listed no stoves.
pub fn parse_stove_list(html: &str) -> Vec<StoveDescriptor> {
    let from_attributes = from_data_attributes(html);
    let found = if from_attributes.is_empty() {
        debug!("no data-stove attributes, falling back to stove links");
        from_links(html)
    } else {
        from_attributes
    };
    dedup_by_id(found)
}

fn from_data_attributes(html: &str) -> Vec<StoveDescriptor> {
    STOVE_ATTRIBUTE
        .captures_iter(html)
        .filter_map(|caps| {
            let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
            let json = unescape_html(raw);
            match serde_json::from_str::<StoveDescriptor>(&json) {
                Ok(descriptor) => Some(descriptor),
                Err(e) => {
                    trace!(error = %e, "skipping unparseable data-stove attribute");
                    None
                }
            }
        })
        .collect()
}

fn from_links(html: &str) -> Vec<StoveDescriptor> {
    STOVE_LINK
        .captures_iter(html)
        .filter_map(|caps| {
            let stove_id = caps.get(1)?.as_str().trim().to_owned();
            let inner = caps.get(2).map_or("", |m| m.as_str());
            let name = unescape_html(TAG.replace_all(inner, "").trim());
            Some(StoveDescriptor { stove_id, name })
        })
        .collect()
}

fn dedup_by_id(found: Vec<StoveDescriptor>) -> Vec<StoveDescriptor> {
    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|d| !d.stove_id.is_empty() && seen.insert(d.stove_id.clone()))
        .collect()
}

/// Decode the entities that can appear inside an attribute value.
fn unescape_html(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }
    raw.replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
