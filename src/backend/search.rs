//! Serper search client.
//!
//! One `POST {endpoint}/{source}` per call with the query as JSON body and the
//! key in `X-API-KEY`. The response carries one array per category; each item
//! is mapped into [`SearchResult`]. Items without a title or link are dropped.

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::api;
use super::types::{SearchResult, SearchSource};
use super::{SearchProvider, SearchRequest};
use crate::config::AppConfig;
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct SerperClient {
    client: Client,
    endpoint: String,
}

impl SerperClient {
    pub fn new(config: &AppConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: api::build_client(config.search_timeout())?,
            endpoint: config.search_endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, source: SearchSource) -> String {
        format!("{}/{}", self.endpoint, source.as_str())
    }
}

impl SearchProvider for SerperClient {
    async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ClientError> {
        let url = self.url(request.source);
        tracing::debug!("Search request to {}", url);

        let mut builder = self
            .client
            .post(&url)
            .json(&SerperRequest { q: &request.query });
        if let Some(key) = &request.api_key {
            builder = builder.header("X-API-KEY", key);
        }

        let response: SerperResponse = api::send_json(builder, cancel).await?;
        let results = normalize(request.source, response);
        tracing::debug!("Search returned {} {} results", results.len(), request.source.as_str());
        Ok(results)
    }
}

#[derive(Debug, serde::Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
}

/// Provider response. Only the array matching the requested source is read.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SerperResponse {
    pub organic: Vec<OrganicItem>,
    pub images: Vec<ImageItem>,
    pub videos: Vec<VideoItem>,
    pub places: Vec<PlaceItem>,
    pub news: Vec<NewsItem>,
    pub shopping: Vec<ShoppingItem>,
}

/// Web, scholar and patent listings all arrive as `organic`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganicItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    pub date: Option<String>,
    pub publication_info: Option<String>,
    pub year: Option<Value>,
    pub cited_by: Option<Value>,
    pub pdf_url: Option<String>,
    pub priority_date: Option<String>,
    pub publication_date: Option<String>,
    pub publication_number: Option<String>,
    pub inventor: Option<String>,
    pub assignee: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub source: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    pub image_url: Option<String>,
    pub duration: Option<String>,
    pub channel: Option<String>,
    pub views: Option<Value>,
    pub source: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaceItem {
    pub title: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub cid: Option<Value>,
    pub rating: Option<Value>,
    pub rating_count: Option<Value>,
    pub category: Option<String>,
    pub phone_number: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewsItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    pub date: Option<String>,
    pub source: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShoppingItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub source: Option<String>,
    pub price: Option<Value>,
    pub delivery: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<Value>,
    pub rating_count: Option<Value>,
}

/// Map the array for `source` into normalized results, preserving order.
pub fn normalize(source: SearchSource, response: SerperResponse) -> Vec<SearchResult> {
    match source {
        SearchSource::Search => response.organic.into_iter().filter_map(from_organic).collect(),
        SearchSource::Scholar => response.organic.into_iter().filter_map(from_scholar).collect(),
        SearchSource::Patents => response.organic.into_iter().filter_map(from_patent).collect(),
        SearchSource::Images => response.images.into_iter().filter_map(from_image).collect(),
        SearchSource::Videos => response.videos.into_iter().filter_map(from_video).collect(),
        SearchSource::Places => response.places.into_iter().filter_map(from_place).collect(),
        SearchSource::News => response.news.into_iter().filter_map(from_news).collect(),
        SearchSource::Shopping => response.shopping.into_iter().filter_map(from_shopping).collect(),
    }
}

/// Title and link are mandatory; blank counts as missing.
fn base(title: Option<String>, link: Option<String>) -> Option<SearchResult> {
    let title = present(title)?;
    let link = present(link)?;
    Some(SearchResult::new(title, link))
}

fn from_organic(item: OrganicItem) -> Option<SearchResult> {
    let mut result = base(item.title, item.link)?;
    result.snippet = present(item.snippet);
    result.date = present(item.date);
    Some(result)
}

fn from_scholar(item: OrganicItem) -> Option<SearchResult> {
    let mut result = base(item.title, item.link)?;
    result.snippet = present(item.snippet);
    result.publication_info = present(item.publication_info);
    result.cited_by = item.cited_by.as_ref().and_then(value_u64);
    result.date = item.year.as_ref().and_then(value_string);
    result.pdf_url = present(item.pdf_url);
    Some(result)
}

fn from_patent(item: OrganicItem) -> Option<SearchResult> {
    let mut result = base(item.title, item.link)?;
    result.snippet = present(item.snippet);
    let info: Vec<String> = [item.publication_number, item.inventor, item.assignee]
        .into_iter()
        .filter_map(present)
        .collect();
    if !info.is_empty() {
        result.publication_info = Some(info.join(" · "));
    }
    result.date = present(item.publication_date).or_else(|| present(item.priority_date));
    result.pdf_url = present(item.pdf_url);
    Some(result)
}

fn from_image(item: ImageItem) -> Option<SearchResult> {
    let mut result = base(item.title, item.link)?;
    result.image_url = present(item.image_url);
    result.thumbnail = present(item.thumbnail_url);
    result.source = present(item.source).or_else(|| present(item.domain));
    Some(result)
}

fn from_video(item: VideoItem) -> Option<SearchResult> {
    let mut result = base(item.title, item.link)?;
    result.snippet = present(item.snippet);
    result.thumbnail = present(item.image_url);
    result.duration = present(item.duration);
    result.channel = present(item.channel);
    result.views = item.views.as_ref().and_then(value_string);
    result.source = present(item.source);
    result.date = present(item.date);
    Some(result)
}

fn from_place(item: PlaceItem) -> Option<SearchResult> {
    let title = present(item.title)?;
    let address = present(item.address);
    let link = present(item.website)
        .or_else(|| item.cid.as_ref().and_then(value_string).map(maps_cid_link))
        .or_else(|| maps_search_link(&title, address.as_deref()))?;

    let mut result = SearchResult::new(title, link);
    result.address = address;
    result.rating = item.rating.as_ref().and_then(value_f64);
    result.rating_count = item.rating_count.as_ref().and_then(value_u64);
    result.category = present(item.category);
    result.phone = present(item.phone_number);
    result.snippet = present(item.description);
    Some(result)
}

fn from_news(item: NewsItem) -> Option<SearchResult> {
    let mut result = base(item.title, item.link)?;
    result.snippet = present(item.snippet);
    result.date = present(item.date);
    result.source = present(item.source);
    result.image_url = present(item.image_url);
    Some(result)
}

fn from_shopping(item: ShoppingItem) -> Option<SearchResult> {
    let mut result = base(item.title, item.link)?;
    result.source = present(item.source);
    result.price = item.price.as_ref().and_then(value_string);
    result.snippet = present(item.delivery);
    result.image_url = present(item.image_url);
    result.rating = item.rating.as_ref().and_then(value_f64);
    result.rating_count = item.rating_count.as_ref().and_then(value_u64);
    Some(result)
}

fn maps_cid_link(cid: String) -> String {
    format!("https://maps.google.com/?cid={cid}")
}

fn maps_search_link(title: &str, address: Option<&str>) -> Option<String> {
    let query = match address {
        Some(address) => format!("{title} {address}"),
        None => title.to_string(),
    };
    Url::parse_with_params(
        "https://www.google.com/maps/search/",
        &[("api", "1"), ("query", query.as_str())],
    )
    .ok()
    .map(String::from)
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Providers are loose about numbers: accept `4.5` as well as `"4.5"`.
fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts `1200`, `"1200"` and `"1,200"`.
fn value_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => present(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> SerperResponse {
        serde_json::from_value(body).expect("valid response")
    }

    #[test]
    fn organic_results_keep_order_and_drop_incomplete_items() {
        let response = parse(json!({
            "organic": [
                {"title": "France", "link": "https://example.com/france", "snippet": "Paris"},
                {"title": "No link"},
                {"title": "  ", "link": "https://example.com/blank"},
                {"title": "Paris", "link": "https://example.com/paris"}
            ]
        }));

        let results = normalize(SearchSource::Search, response);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "France");
        assert_eq!(results[0].snippet.as_deref(), Some("Paris"));
        assert_eq!(results[1].link, "https://example.com/paris");
    }

    #[test]
    fn only_the_requested_array_is_read() {
        let response = parse(json!({
            "organic": [{"title": "Web", "link": "https://example.com"}],
            "news": [{"title": "News", "link": "https://news.example.com"}]
        }));
        let results = normalize(SearchSource::News, response);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "News");
    }

    #[test]
    fn missing_array_yields_no_results() {
        assert!(normalize(SearchSource::Videos, parse(json!({}))).is_empty());
    }

    #[test]
    fn image_fields_are_mapped() {
        let response = parse(json!({
            "images": [{
                "title": "Eiffel",
                "link": "https://example.com/page",
                "imageUrl": "https://example.com/full.jpg",
                "thumbnailUrl": "https://example.com/thumb.jpg",
                "domain": "example.com"
            }]
        }));
        let result = &normalize(SearchSource::Images, response)[0];
        assert_eq!(result.image_url.as_deref(), Some("https://example.com/full.jpg"));
        assert_eq!(result.thumbnail.as_deref(), Some("https://example.com/thumb.jpg"));
        assert_eq!(result.source.as_deref(), Some("example.com"));
    }

    #[test]
    fn video_fields_are_mapped() {
        let response = parse(json!({
            "videos": [{
                "title": "Tour",
                "link": "https://video.example.com/1",
                "imageUrl": "https://video.example.com/1.jpg",
                "duration": "3:15",
                "channel": "Travel",
                "views": 12000
            }]
        }));
        let result = &normalize(SearchSource::Videos, response)[0];
        assert_eq!(result.thumbnail.as_deref(), Some("https://video.example.com/1.jpg"));
        assert_eq!(result.duration.as_deref(), Some("3:15"));
        assert_eq!(result.channel.as_deref(), Some("Travel"));
        assert_eq!(result.views.as_deref(), Some("12000"));
    }

    #[test]
    fn place_link_prefers_website_then_cid_then_search() {
        let response = parse(json!({
            "places": [
                {"title": "Cafe A", "website": "https://cafe-a.example", "cid": "1"},
                {"title": "Cafe B", "cid": 42},
                {"title": "Cafe C", "address": "1 Rue"}
            ]
        }));
        let results = normalize(SearchSource::Places, response);
        assert_eq!(results[0].link, "https://cafe-a.example");
        assert_eq!(results[1].link, "https://maps.google.com/?cid=42");
        assert!(results[2].link.starts_with("https://www.google.com/maps/search/?api=1&query="));
        assert!(results[2].link.contains("Cafe"));
    }

    #[test]
    fn place_numbers_accept_strings() {
        let response = parse(json!({
            "places": [{"title": "Cafe", "website": "https://c.example", "rating": "4.5", "ratingCount": "1,204"}]
        }));
        let result = &normalize(SearchSource::Places, response)[0];
        assert_eq!(result.rating, Some(4.5));
        assert_eq!(result.rating_count, Some(1204));
    }

    #[test]
    fn shopping_fields_are_mapped() {
        let response = parse(json!({
            "shopping": [{
                "title": "Kettle",
                "link": "https://shop.example/kettle",
                "source": "Shop",
                "price": "$19.99",
                "delivery": "Free delivery",
                "rating": 4.2,
                "ratingCount": 87
            }]
        }));
        let result = &normalize(SearchSource::Shopping, response)[0];
        assert_eq!(result.price.as_deref(), Some("$19.99"));
        assert_eq!(result.source.as_deref(), Some("Shop"));
        assert_eq!(result.snippet.as_deref(), Some("Free delivery"));
        assert_eq!(result.rating_count, Some(87));
    }

    #[test]
    fn scholar_fields_are_mapped() {
        let response = parse(json!({
            "organic": [{
                "title": "Attention Is All You Need",
                "link": "https://arxiv.org/abs/1706.03762",
                "publicationInfo": "A Vaswani - 2017",
                "year": 2017,
                "citedBy": 100000,
                "pdfUrl": "https://arxiv.org/pdf/1706.03762"
            }]
        }));
        let result = &normalize(SearchSource::Scholar, response)[0];
        assert_eq!(result.publication_info.as_deref(), Some("A Vaswani - 2017"));
        assert_eq!(result.cited_by, Some(100000));
        assert_eq!(result.date.as_deref(), Some("2017"));
        assert!(result.pdf_url.is_some());
    }

    #[test]
    fn patent_info_is_composed() {
        let response = parse(json!({
            "organic": [{
                "title": "Widget",
                "link": "https://patents.example/US1",
                "publicationNumber": "US1234A",
                "inventor": "Ada",
                "assignee": "Acme",
                "priorityDate": "2001-01-01"
            }]
        }));
        let result = &normalize(SearchSource::Patents, response)[0];
        assert_eq!(result.publication_info.as_deref(), Some("US1234A · Ada · Acme"));
        assert_eq!(result.date.as_deref(), Some("2001-01-01"));
    }

    #[test]
    fn url_joins_endpoint_and_source() {
        let config = AppConfig {
            search_endpoint: "https://serper.example/".into(),
            ..Default::default()
        };
        let client = SerperClient::new(&config).expect("client");
        assert_eq!(client.url(SearchSource::Shopping), "https://serper.example/shopping");
    }
}
