//! Query orchestrator: the query-to-answer lifecycle.
//!
//! ```text
//! Idle -> Validating -> Searching -> Synthesizing -> Done
//!              \            \              \
//!               `-> Failed   `-> Failed     `-> Failed
//!                            `-> Aborted    `-> Aborted
//! ```
//!
//! The orchestrator itself performs no I/O. [`Orchestrator::submit`] hands out
//! a [`SearchTicket`]; whoever runs the search reports back through
//! [`Orchestrator::search_finished`], which may hand out a
//! [`SynthesisTicket`], and so on. Every report carries its [`RunId`]; reports
//! for anything but the live run are dropped, so a superseded run can never
//! touch visible state. [`drive`] chains the steps for callers that just want
//! to await the whole pipeline.

use std::fmt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::types::{SearchResult, SearchSource};
use crate::backend::{SearchProvider, SearchRequest, SynthesisProvider, SynthesisRequest};
use crate::credentials::{CredentialStore, ResolvedCredentials};
use crate::error::{ClientError, RunError};
use crate::render;

/// Identity of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Searching,
    Synthesizing,
    Done,
    Failed,
    Aborted,
}

impl Phase {
    /// A live run is waiting on the network.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Searching | Self::Synthesizing)
    }
}

/// Everything needed to perform the search step of a run.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    pub run_id: RunId,
    pub request: SearchRequest,
    pub cancel: CancellationToken,
}

/// Everything needed to perform the synthesis step of a run.
#[derive(Debug, Clone)]
pub struct SynthesisTicket {
    pub run_id: RunId,
    pub request: SynthesisRequest,
    pub cancel: CancellationToken,
}

/// One image to fetch for the results on display.
#[derive(Debug, Clone)]
pub struct MediaTicket {
    pub run_id: RunId,
    /// [`SearchResult::display_key`] of the result the image belongs to.
    pub key: String,
    pub url: String,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
struct LiveRun {
    id: RunId,
    cancel: CancellationToken,
    credentials: ResolvedCredentials,
}

/// Owns the visible state of the current run.
#[derive(Debug)]
pub struct Orchestrator {
    store: CredentialStore,
    source: SearchSource,
    query: String,
    phase: Phase,
    results: Vec<SearchResult>,
    answer: Option<String>,
    error: Option<RunError>,
    live: Option<LiveRun>,
    /// Run whose results are on display; media fetches are tied to it.
    shown: Option<(RunId, CancellationToken)>,
}

impl Orchestrator {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            source: SearchSource::default(),
            query: String::new(),
            phase: Phase::Idle,
            results: Vec::new(),
            answer: None,
            error: None,
            live: None,
            shown: None,
        }
    }

    pub fn with_source(mut self, source: SearchSource) -> Self {
        self.source = source;
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn source(&self) -> SearchSource {
        self.source
    }

    /// Trimmed query of the most recent run.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn error(&self) -> Option<&RunError> {
        self.error.as_ref()
    }

    pub fn live_run(&self) -> Option<RunId> {
        self.live.as_ref().map(|live| live.id)
    }

    /// Run that produced the results on display, if any.
    pub fn shown_run(&self) -> Option<RunId> {
        self.shown.as_ref().map(|(id, _)| *id)
    }

    /// Start a run for `query` on the current source.
    ///
    /// Whitespace-only queries change nothing and return `None`. Otherwise
    /// any live run is superseded, credentials are validated, and on success
    /// a ticket for the search step is returned.
    pub fn submit(&mut self, query: &str) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        self.supersede();
        self.clear_output();
        self.query = query.to_string();
        self.phase = Phase::Validating;

        let credentials = match self.store.require_or_fail(self.source) {
            Ok(credentials) => credentials,
            Err(err) => {
                tracing::info!("Run not started: {}", err);
                self.error = Some(err);
                self.phase = Phase::Failed;
                return None;
            }
        };

        let live = LiveRun {
            id: RunId::mint(),
            cancel: CancellationToken::new(),
            credentials,
        };
        let ticket = SearchTicket {
            run_id: live.id,
            request: SearchRequest {
                query: self.query.clone(),
                source: self.source,
                api_key: live.credentials.serper_api_key.clone(),
            },
            cancel: live.cancel.clone(),
        };

        tracing::info!("Run {} searching {}", live.id, self.source.as_str());
        self.live = Some(live);
        self.phase = Phase::Searching;
        Some(ticket)
    }

    /// Report the search step of `run_id`.
    ///
    /// Returns the synthesis ticket when the search succeeded for the live
    /// run; stale reports are discarded.
    pub fn search_finished(
        &mut self,
        run_id: RunId,
        outcome: Result<Vec<SearchResult>, ClientError>,
    ) -> Option<SynthesisTicket> {
        if !self.accepts(run_id, Phase::Searching) {
            tracing::debug!("Discarding search outcome of stale run {}", run_id);
            return None;
        }

        let results = match outcome {
            Ok(results) => results,
            Err(err) if err.is_cancelled() => {
                self.abort_live();
                return None;
            }
            Err(err) => {
                self.fail(RunError::SearchFailed(err));
                return None;
            }
        };

        let live = self.live.as_ref()?;
        tracing::info!("Run {} synthesizing from {} results", run_id, results.len());
        let ticket = SynthesisTicket {
            run_id,
            request: SynthesisRequest {
                query: self.query.clone(),
                source: self.source,
                results: results.clone(),
                credentials: live.credentials.clone(),
            },
            cancel: live.cancel.clone(),
        };
        self.shown = Some((run_id, live.cancel.clone()));
        self.results = results;
        self.phase = Phase::Synthesizing;
        Some(ticket)
    }

    /// Fetch tickets for every result on display that carries an image.
    pub fn media_tickets(&self) -> Vec<MediaTicket> {
        let Some((run_id, cancel)) = &self.shown else {
            return Vec::new();
        };
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| {
                let url = render::layout(result, self.source).media?;
                Some(MediaTicket {
                    run_id: *run_id,
                    key: result.display_key(index),
                    url,
                    cancel: cancel.clone(),
                })
            })
            .collect()
    }

    /// Report one media fetch. Returns the bytes when they belong to the
    /// results still on display; anything else is dropped and the result
    /// keeps its text fallback.
    pub fn media_finished(
        &self,
        run_id: RunId,
        key: &str,
        outcome: Result<Vec<u8>, ClientError>,
    ) -> Option<Vec<u8>> {
        match &self.shown {
            Some((id, cancel)) if *id == run_id && !cancel.is_cancelled() => {}
            _ => {
                tracing::debug!("Discarding media of stale run {}", run_id);
                return None;
            }
        }
        match outcome {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                if !err.is_cancelled() {
                    tracing::debug!("Media {} unavailable: {}", key, err);
                }
                None
            }
        }
    }

    /// Report the synthesis step of `run_id`; stale reports are discarded.
    pub fn synthesis_finished(&mut self, run_id: RunId, outcome: Result<String, ClientError>) {
        if !self.accepts(run_id, Phase::Synthesizing) {
            tracing::debug!("Discarding synthesis outcome of stale run {}", run_id);
            return;
        }

        match outcome {
            Ok(answer) => {
                tracing::info!("Run {} done", run_id);
                self.answer = Some(answer);
                self.phase = Phase::Done;
                self.live = None;
            }
            Err(err) if err.is_cancelled() => self.abort_live(),
            Err(err) => self.fail(RunError::SynthesisFailed(err)),
        }
    }

    /// Select another category. A live run is aborted and everything on
    /// display is cleared, even when the category is unchanged.
    pub fn change_source(&mut self, source: SearchSource) {
        let had_live = self.supersede();
        self.source = source;
        self.clear_output();
        self.phase = if had_live { Phase::Aborted } else { Phase::Idle };
    }

    /// Abandon the live run, if any. Displayed output is kept.
    pub fn cancel(&mut self) {
        if self.supersede() {
            self.phase = Phase::Aborted;
        }
    }

    /// Signal and forget the live run. Returns whether there was one.
    fn supersede(&mut self) -> bool {
        match self.live.take() {
            Some(live) => {
                tracing::debug!("Run {} superseded", live.id);
                live.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn accepts(&self, run_id: RunId, expected: Phase) -> bool {
        match &self.live {
            Some(live) => live.id == run_id && !live.cancel.is_cancelled() && self.phase == expected,
            None => false,
        }
    }

    fn abort_live(&mut self) {
        if let Some(live) = self.live.take() {
            tracing::debug!("Run {} aborted", live.id);
        }
        self.phase = Phase::Aborted;
    }

    fn fail(&mut self, err: RunError) {
        if let Some(live) = self.live.take() {
            tracing::warn!("Run {} failed: {}", live.id, err);
        }
        self.error = Some(err);
        self.phase = Phase::Failed;
    }

    fn clear_output(&mut self) {
        if let Some((_, cancel)) = self.shown.take() {
            cancel.cancel();
        }
        self.results.clear();
        self.answer = None;
        self.error = None;
    }
}

/// Run the whole pipeline for `query` and return the final phase.
///
/// The synthesis call is only issued after the search of the same run
/// succeeded.
pub async fn drive<S, L>(
    orchestrator: &mut Orchestrator,
    search: &S,
    synthesis: &L,
    query: &str,
) -> Phase
where
    S: SearchProvider,
    L: SynthesisProvider,
{
    let Some(ticket) = orchestrator.submit(query) else {
        return orchestrator.phase();
    };
    let outcome = search.search(&ticket.request, &ticket.cancel).await;

    let Some(ticket) = orchestrator.search_finished(ticket.run_id, outcome) else {
        return orchestrator.phase();
    };
    let outcome = synthesis.synthesize(&ticket.request, &ticket.cancel).await;

    orchestrator.synthesis_finished(ticket.run_id, outcome);
    orchestrator.phase()
}
