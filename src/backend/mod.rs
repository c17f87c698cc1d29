//! Provider clients: web search, LLM synthesis and result media.

pub mod api;
pub mod media;
pub mod search;
pub mod synthesis;
pub mod types;

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::credentials::ResolvedCredentials;
use crate::error::ClientError;
use types::{SearchResult, SearchSource};

/// Input of one search call.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub source: SearchSource,
    pub api_key: Option<String>,
}

/// Input of one synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub query: String,
    pub source: SearchSource,
    pub results: Vec<SearchResult>,
    pub credentials: ResolvedCredentials,
}

/// A search provider returning normalized results.
///
/// Calls are one-shot; a fresh call is needed per attempt. Implementations
/// must return [`ClientError::Cancelled`] when `cancel` fires first, so the
/// orchestrator can tell an abort from a failure.
pub trait SearchProvider: Send + Sync {
    fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<SearchResult>, ClientError>> + Send;
}

/// An LLM provider turning a query plus results into a single answer.
pub trait SynthesisProvider: Send + Sync {
    fn synthesize(
        &self,
        request: &SynthesisRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}
