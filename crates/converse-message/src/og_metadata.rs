use serde::{Deserialize, Serialize};

/// Image record inside an open-graph preview.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OgImage {
    pub url: String,
    pub secure_url: Option<String>,
    pub width: u32,
    pub height: u32,
    pub alt: Option<String>,
}

/// Link-preview record extracted from the first link in a message.
///
/// A message keeps at most one of these: the first link encountered in
/// the content wins, later links are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OgMetaData {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default_image: Option<OgImage>,
}

/// Returns the first http(s) link found in `text`, if any.
///
/// This is the link a preview would be fetched for; any further links in
/// the same message are not considered.
pub fn first_link(text: &str) -> Option<&str> {
    text.split_whitespace()
        .find(|w| w.starts_with("http://") || w.starts_with("https://"))
}
