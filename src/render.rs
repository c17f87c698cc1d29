//! Result renderer: normalized result + category -> layout.
//!
//! Pure and exhaustive over [`SearchSource`]; adding a category fails to
//! compile until it has a layout. The window (`ui::results`) and the CLI both
//! draw from [`ResultLayout`].

use reqwest::Url;

use crate::backend::types::{SearchResult, SearchSource};

/// Visual shape of one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Web,
    ImageTile,
    VideoCard,
    PlaceCard,
    NewsItem,
    ShoppingCard,
    ScholarItem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultLayout {
    pub variant: Variant,
    pub title: String,
    pub link: String,
    /// Host of `link` without a leading `www.`.
    pub host: String,
    /// Image or thumbnail URL.
    pub media: Option<String>,
    /// Short emphasized text: duration, price, rating, citation count.
    pub badge: Option<String>,
    /// Secondary facts shown on one line.
    pub meta: Vec<String>,
    pub body: Option<String>,
}

pub fn layout(result: &SearchResult, source: SearchSource) -> ResultLayout {
    let mut layout = ResultLayout {
        variant: Variant::Web,
        title: result.title.clone(),
        link: result.link.clone(),
        host: display_host(&result.link),
        media: None,
        badge: None,
        meta: Vec::new(),
        body: None,
    };

    match source {
        SearchSource::Search => {
            layout.meta = collect([Some(layout.host.clone()), result.date.clone()]);
            layout.body = result.snippet.clone();
        }
        SearchSource::Images => {
            layout.variant = Variant::ImageTile;
            layout.media = result.image_url.clone().or_else(|| result.thumbnail.clone());
            layout.meta = collect([result.source.clone().or_else(|| Some(layout.host.clone()))]);
        }
        SearchSource::Videos => {
            layout.variant = Variant::VideoCard;
            layout.media = result.thumbnail.clone().or_else(|| result.image_url.clone());
            layout.badge = result.duration.clone();
            layout.meta = collect([
                result.channel.clone(),
                result.views.as_ref().map(|v| format!("{v} views")),
                result.date.clone(),
            ]);
        }
        SearchSource::Places => {
            layout.variant = Variant::PlaceCard;
            layout.badge = rating_line(result.rating, result.rating_count);
            layout.meta = collect([
                result.category.clone(),
                result.address.clone(),
                result.phone.clone(),
            ]);
            layout.body = result.snippet.clone();
        }
        SearchSource::News => {
            layout.variant = Variant::NewsItem;
            layout.media = result.image_url.clone();
            layout.meta = collect([
                result.source.clone().or_else(|| Some(layout.host.clone())),
                result.date.clone(),
            ]);
            layout.body = result.snippet.clone();
        }
        SearchSource::Shopping => {
            layout.variant = Variant::ShoppingCard;
            layout.media = result.image_url.clone();
            layout.badge = result.price.clone();
            layout.meta = collect([
                result.source.clone(),
                rating_line(result.rating, result.rating_count),
            ]);
            layout.body = result.snippet.clone();
        }
        SearchSource::Scholar | SearchSource::Patents => {
            layout.variant = Variant::ScholarItem;
            layout.badge = result.cited_by.map(|n| format!("Cited by {n}"));
            layout.meta = collect([
                result.publication_info.clone(),
                result.date.clone(),
                result.pdf_url.as_ref().map(|url| format!("PDF: {url}")),
            ]);
            layout.body = result.snippet.clone();
        }
    }

    layout
}

/// Columns of the result grid for `source`.
pub fn grid_columns(source: SearchSource) -> usize {
    match source {
        SearchSource::Images => 4,
        SearchSource::Videos | SearchSource::Shopping => 3,
        SearchSource::Search
        | SearchSource::Places
        | SearchSource::News
        | SearchSource::Scholar
        | SearchSource::Patents => 1,
    }
}

impl ResultLayout {
    /// Terminal rendering used by `openresearch ask`.
    pub fn to_plain_text(&self) -> String {
        let mut out = match &self.badge {
            Some(badge) => format!("{}  [{}]\n", self.title, badge),
            None => format!("{}\n", self.title),
        };
        out.push_str(&format!("  {}\n", self.link));
        if !self.meta.is_empty() {
            out.push_str(&format!("  {}\n", self.meta.join(" · ")));
        }
        if let Some(body) = &self.body {
            out.push_str(&format!("  {body}\n"));
        }
        if let Some(media) = &self.media {
            out.push_str(&format!("  image: {media}\n"));
        }
        out
    }
}

fn collect<const N: usize>(parts: [Option<String>; N]) -> Vec<String> {
    parts
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect()
}

/// `★ 4.5 (1204)`, or just the stars when there is no count.
fn rating_line(rating: Option<f64>, count: Option<u64>) -> Option<String> {
    let rating = rating?;
    Some(match count {
        Some(count) => format!("★ {rating:.1} ({count})"),
        None => format!("★ {rating:.1}"),
    })
}

fn display_host(link: &str) -> String {
    Url::parse(link)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_source_has_a_layout() {
        let result = SearchResult::new("T", "https://www.example.com/page");
        let variants: Vec<Variant> = SearchSource::ALL
            .iter()
            .map(|source| layout(&result, *source).variant)
            .collect();
        assert_eq!(
            variants,
            vec![
                Variant::Web,
                Variant::ImageTile,
                Variant::VideoCard,
                Variant::PlaceCard,
                Variant::NewsItem,
                Variant::ShoppingCard,
                Variant::ScholarItem,
                Variant::ScholarItem,
            ]
        );
    }

    #[test]
    fn web_layout_shows_host_and_snippet() {
        let result =
            SearchResult::new("France", "https://www.example.com/france").with_snippet("Paris");
        let layout = layout(&result, SearchSource::Search);
        assert_eq!(layout.host, "example.com");
        assert_eq!(layout.meta, vec!["example.com".to_string()]);
        assert_eq!(layout.body.as_deref(), Some("Paris"));
        assert!(layout.badge.is_none());
    }

    #[test]
    fn video_layout_uses_duration_badge_and_views() {
        let mut result = SearchResult::new("Tour", "https://video.example.com/1");
        result.duration = Some("3:15".into());
        result.channel = Some("Travel".into());
        result.views = Some("12K".into());
        result.thumbnail = Some("https://video.example.com/1.jpg".into());

        let layout = layout(&result, SearchSource::Videos);
        assert_eq!(layout.badge.as_deref(), Some("3:15"));
        assert_eq!(layout.meta, vec!["Travel".to_string(), "12K views".to_string()]);
        assert_eq!(layout.media.as_deref(), Some("https://video.example.com/1.jpg"));
    }

    #[test]
    fn image_layout_falls_back_to_thumbnail() {
        let mut result = SearchResult::new("Cat", "https://example.com/cat");
        result.thumbnail = Some("https://example.com/t.jpg".into());
        let layout = layout(&result, SearchSource::Images);
        assert_eq!(layout.media.as_deref(), Some("https://example.com/t.jpg"));
    }

    #[test]
    fn place_and_shopping_ratings() {
        let mut result = SearchResult::new("Cafe", "https://cafe.example");
        result.rating = Some(4.5);
        result.rating_count = Some(1204);
        assert_eq!(
            layout(&result, SearchSource::Places).badge.as_deref(),
            Some("★ 4.5 (1204)")
        );

        result.price = Some("$3".into());
        let shopping = layout(&result, SearchSource::Shopping);
        assert_eq!(shopping.badge.as_deref(), Some("$3"));
        assert!(shopping.meta.contains(&"★ 4.5 (1204)".to_string()));
    }

    #[test]
    fn scholar_layout_shows_citations() {
        let mut result = SearchResult::new("Paper", "https://papers.example/1");
        result.cited_by = Some(42);
        result.publication_info = Some("A Author - 2020".into());
        let layout = layout(&result, SearchSource::Scholar);
        assert_eq!(layout.badge.as_deref(), Some("Cited by 42"));
        assert_eq!(layout.meta[0], "A Author - 2020");
    }

    #[test]
    fn grid_columns_per_source() {
        assert_eq!(grid_columns(SearchSource::Images), 4);
        assert_eq!(grid_columns(SearchSource::Videos), 3);
        assert_eq!(grid_columns(SearchSource::Shopping), 3);
        assert_eq!(grid_columns(SearchSource::Search), 1);
        assert_eq!(grid_columns(SearchSource::Patents), 1);
    }

    #[test]
    fn plain_text_rendering() {
        let mut result = SearchResult::new("Kettle", "https://shop.example/kettle");
        result.price = Some("$19.99".into());
        result.source = Some("Shop".into());
        let text = layout(&result, SearchSource::Shopping).to_plain_text();
        assert_eq!(text, "Kettle  [$19.99]\n  https://shop.example/kettle\n  Shop\n");
    }

    #[test]
    fn unparseable_link_is_shown_verbatim() {
        assert_eq!(display_host("not a url"), "not a url");
    }
}
