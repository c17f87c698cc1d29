//! OpenAI-compatible chat completions client.
//!
//! Sends the query and the numbered search results as a single non-streaming
//! request to `{base_url}/chat/completions` and returns the first choice.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::api;
use super::types::{SearchResult, SearchSource};
use super::{SynthesisProvider, SynthesisRequest};
use crate::config::AppConfig;
use crate::error::ClientError;

const SYSTEM_PROMPT: &str = "You are a research assistant. Answer the user's question \
using the provided search results. Cite results by their [number] when you rely on them. \
If the results do not contain the answer, say so briefly and answer from general knowledge.";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    temperature: f32,
    max_context_results: usize,
}

impl OpenAiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: api::build_client(config.synthesis_timeout())?,
            temperature: config.temperature,
            max_context_results: config.max_context_results,
        })
    }
}

impl SynthesisProvider for OpenAiClient {
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ClientError> {
        let credentials = &request.credentials;
        let url = format!(
            "{}/chat/completions",
            credentials.openai_base_url.trim_end_matches('/')
        );
        let prompt = build_prompt(
            &request.query,
            request.source,
            &request.results,
            self.max_context_results,
        );
        let body = ChatRequest {
            model: &credentials.openai_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
            stream: false,
        };

        tracing::debug!(
            "Synthesis request to {} with model {}",
            url,
            credentials.openai_model
        );
        let builder = self
            .client
            .post(&url)
            .bearer_auth(&credentials.openai_api_key)
            .json(&body);

        let response: ChatResponse = api::send_json(builder, cancel).await?;
        extract_answer(response)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

fn extract_answer(response: ChatResponse) -> Result<String, ClientError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::Malformed("completion has no choices".into()))?;

    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(ClientError::Malformed("completion has no content".into())),
    }
}

/// User message: the question, the category and up to `max_results` numbered
/// results with whatever fields they carry.
pub fn build_prompt(
    query: &str,
    source: SearchSource,
    results: &[SearchResult],
    max_results: usize,
) -> String {
    let mut prompt = format!(
        "Question: {}\nResult type: {}\n\n",
        query.trim(),
        source.label()
    );

    if results.is_empty() {
        prompt.push_str("No search results were returned.\n");
        return prompt;
    }

    prompt.push_str("Search results:\n");
    for (index, result) in results.iter().take(max_results).enumerate() {
        prompt.push_str(&format!("[{}] {}\nURL: {}\n", index + 1, result.title, result.link));
        for (label, value) in context_fields(result) {
            prompt.push_str(&format!("{label}: {value}\n"));
        }
        prompt.push('\n');
    }
    prompt
}

fn context_fields(result: &SearchResult) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    let mut push = |label: &'static str, value: Option<String>| {
        if let Some(value) = value {
            fields.push((label, value));
        }
    };
    push("Summary", result.snippet.clone());
    push("Source", result.source.clone());
    push("Date", result.date.clone());
    push("Channel", result.channel.clone());
    push("Duration", result.duration.clone());
    push("Price", result.price.clone());
    push("Rating", result.rating.map(|r| format!("{r:.1}")));
    push("Address", result.address.clone());
    push("Published", result.publication_info.clone());
    push("Cited by", result.cited_by.map(|c| c.to_string()));
    fields
}
