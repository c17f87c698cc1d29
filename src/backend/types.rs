//! Shared types for provider communication

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result category selected by the user.
///
/// Determines the provider endpoint, which response array is read, and which
/// layout the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    #[default]
    Search,
    Images,
    Videos,
    Places,
    News,
    Shopping,
    Scholar,
    Patents,
}

impl SearchSource {
    pub const ALL: [SearchSource; 8] = [
        Self::Search,
        Self::Images,
        Self::Videos,
        Self::Places,
        Self::News,
        Self::Shopping,
        Self::Scholar,
        Self::Patents,
    ];

    /// Wire name, also used as the provider endpoint path segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Images => "images",
            Self::Videos => "videos",
            Self::Places => "places",
            Self::News => "news",
            Self::Shopping => "shopping",
            Self::Scholar => "scholar",
            Self::Patents => "patents",
        }
    }

    /// Label shown in the source selector.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Search => "Web",
            Self::Images => "Images",
            Self::Videos => "Videos",
            Self::Places => "Places",
            Self::News => "News",
            Self::Shopping => "Shopping",
            Self::Scholar => "Scholar",
            Self::Patents => "Patents",
        }
    }

    /// Whether runs on this category query the search provider and so need
    /// its API key.
    pub fn uses_search_provider(&self) -> bool {
        match self {
            Self::Search
            | Self::Images
            | Self::Videos
            | Self::Places
            | Self::News
            | Self::Shopping
            | Self::Scholar
            | Self::Patents => true,
        }
    }
}

impl fmt::Display for SearchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SearchSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == wanted || source.label().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown source: {s}"))
    }
}

/// A provider result translated into one shared shape.
///
/// `title` and `link` are always present; everything else depends on the
/// category.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
    /// Publisher or site name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_by: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Identity of a result on display, used to match fetched media to its
    /// card. Duplicates at different positions stay distinct.
    pub fn display_key(&self, index: usize) -> String {
        format!("{}-{}", self.link, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_source_round_trips_through_its_wire_name() {
        for source in SearchSource::ALL {
            assert_eq!(source.as_str().parse::<SearchSource>(), Ok(source));
        }
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("Web".parse::<SearchSource>(), Ok(SearchSource::Search));
        assert_eq!(" NEWS ".parse::<SearchSource>(), Ok(SearchSource::News));
        assert!("podcasts".parse::<SearchSource>().is_err());
    }

    #[test]
    fn all_sources_use_the_search_provider() {
        assert!(SearchSource::ALL.iter().all(|s| s.uses_search_provider()));
    }

    #[test]
    fn source_serializes_lowercase() {
        let json = serde_json::to_string(&SearchSource::Shopping).expect("serialize");
        assert_eq!(json, "\"shopping\"");
    }

    #[test]
    fn result_serializes_camel_case_and_skips_absent_fields() {
        let mut result = SearchResult::new("Cat", "https://example.com/cat");
        result.image_url = Some("https://example.com/cat.png".into());
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["imageUrl"], "https://example.com/cat.png");
        assert!(json.get("snippet").is_none());
    }

    #[test]
    fn display_keys_distinguish_duplicate_links() {
        let result = SearchResult::new("Same", "https://example.com");
        assert_ne!(result.display_key(0), result.display_key(1));
    }
}
