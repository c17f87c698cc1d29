//! Whole runs: file-backed credentials, both providers on a mock server.

use std::sync::Arc;

use openresearch::backend::search::SerperClient;
use openresearch::backend::synthesis::OpenAiClient;
use openresearch::backend::types::SearchSource;
use openresearch::config::AppConfig;
use openresearch::credentials::{CredentialKey, CredentialStore, Credentials, STORAGE_KEY};
use openresearch::error::{ClientError, RunError};
use openresearch::orchestrator::{drive, Orchestrator, Phase};
use openresearch::render;
use openresearch::storage::{FileStorage, KeyValueStorage};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn clients(server: &MockServer) -> (SerperClient, OpenAiClient) {
    let config = AppConfig {
        search_endpoint: server.uri(),
        search_timeout_seconds: 5,
        synthesis_timeout_seconds: 5,
        ..AppConfig::default()
    };
    (
        SerperClient::new(&config).expect("search client"),
        OpenAiClient::new(&config).expect("synthesis client"),
    )
}

fn file_store(dir: &tempfile::TempDir, server: &MockServer) -> CredentialStore {
    let store = CredentialStore::new(Arc::new(FileStorage::new(dir.path())));
    store
        .save(
            &Credentials::default()
                .with(CredentialKey::OpenAiApiKey, "sk-test")
                .with(CredentialKey::OpenAiBaseUrl, format!("{}/v1", server.uri()))
                .with(CredentialKey::SerperApiKey, "serper-test"),
        )
        .expect("save");
    store
}

async fn mount_search(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("X-API-KEY", "serper-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic": [
                { "title": "Paris - Wikipedia", "link": "https://en.wikipedia.org/wiki/Paris",
                  "snippet": "Paris is the capital and largest city of France." },
                { "title": "Paris | History", "link": "https://www.britannica.com/place/Paris" }
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_synthesis(server: &MockServer, status: u16) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "The capital of France is Paris [1]." } }]
        }))
    } else {
        ResponseTemplate::new(status).set_body_string("upstream unavailable")
    };
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn answers_capital_of_france() {
    let server = MockServer::start().await;
    mount_search(&server).await;
    mount_synthesis(&server, 200).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let (search, synthesis) = clients(&server);
    let mut run = Orchestrator::new(file_store(&dir, &server));

    let phase = drive(&mut run, &search, &synthesis, "  capital of France ").await;

    assert_eq!(phase, Phase::Done);
    assert_eq!(run.query(), "capital of France");
    assert_eq!(run.answer(), Some("The capital of France is Paris [1]."));
    assert_eq!(run.results().len(), 2);
    assert!(run.error().is_none());
    assert!(!run.is_loading());

    let text = render::layout(&run.results()[1], SearchSource::Search).to_plain_text();
    assert!(text.contains("britannica.com"));
}

#[tokio::test]
async fn synthesis_failure_keeps_results() {
    let server = MockServer::start().await;
    mount_search(&server).await;
    mount_synthesis(&server, 503).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let (search, synthesis) = clients(&server);
    let mut run = Orchestrator::new(file_store(&dir, &server));

    let phase = drive(&mut run, &search, &synthesis, "capital of France").await;

    assert_eq!(phase, Phase::Failed);
    assert_eq!(run.results().len(), 2);
    assert!(run.answer().is_none());
    assert!(matches!(
        run.error(),
        Some(RunError::SynthesisFailed(ClientError::Status { status: 503, .. }))
    ));
}

#[tokio::test]
async fn missing_serper_key_makes_no_request() {
    let server = MockServer::start().await;
    mount_search(&server).await;
    mount_synthesis(&server, 200).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = CredentialStore::new(Arc::new(FileStorage::new(dir.path())));
    store
        .save(&Credentials::default().with(CredentialKey::OpenAiApiKey, "sk-test"))
        .expect("save");

    let (search, synthesis) = clients(&server);
    let mut run = Orchestrator::new(store).with_source(SearchSource::Places);
    let phase = drive(&mut run, &search, &synthesis, "coffee near me").await;

    assert_eq!(phase, Phase::Failed);
    assert_eq!(
        run.error(),
        Some(&RunError::MissingCredential(CredentialKey::SerperApiKey))
    );
    let received = server.received_requests().await.expect("recording on");
    assert!(received.is_empty());
}

#[test]
fn file_store_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(FileStorage::new(dir.path().join("nested")));
    let store = CredentialStore::new(storage.clone());

    assert_eq!(store.load(), Credentials::default());

    store
        .save(&Credentials::default().with(CredentialKey::OpenAiModel, "gpt-4o"))
        .expect("save model");
    store
        .save(&Credentials::default().with(CredentialKey::SerperApiKey, "serper-test"))
        .expect("save key");

    let reopened = CredentialStore::new(Arc::new(FileStorage::new(dir.path().join("nested"))));
    let loaded = reopened.load();
    assert_eq!(loaded.get(CredentialKey::OpenAiModel), Some("gpt-4o"));
    assert_eq!(loaded.get(CredentialKey::SerperApiKey), Some("serper-test"));

    let raw = storage.get(STORAGE_KEY).expect("read").expect("present");
    assert!(raw.contains("serperApiKey"));

    reopened.clear().expect("clear");
    assert_eq!(store.load(), Credentials::default());
}

#[test]
fn corrupt_record_loads_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(FileStorage::new(dir.path()));
    storage.set(STORAGE_KEY, "{not json").expect("write");

    let store = CredentialStore::new(storage);
    assert_eq!(store.load(), Credentials::default());
}
