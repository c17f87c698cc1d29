//! OpenResearch: AI-powered research assistant
//!
//! Usage:
//!   openresearch                       - Open the window
//!   openresearch ask [--source S] Q    - Answer one query on the terminal
//!   openresearch keys [show|set|clear] - Manage stored keys
//!   openresearch help                  - Show help

use std::env;
use std::process::ExitCode;

use iced::{window, Size, Task};
use openresearch::app::OpenResearch;
use openresearch::backend::media::MediaClient;
use openresearch::backend::search::SerperClient;
use openresearch::backend::synthesis::OpenAiClient;
use openresearch::backend::types::SearchSource;
use openresearch::commands::Command;
use openresearch::config::AppConfig;
use openresearch::credentials::{mask, CredentialKey, CredentialStore, Credentials};
use openresearch::orchestrator::{self, Orchestrator, Phase};
use openresearch::render;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // try_init so a second initialisation in tests or embedders is harmless
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    handle_cli_command(command)
}

fn handle_cli_command(command: Command) -> ExitCode {
    match command {
        Command::Window => match start_window() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Command::Ask { source, query } => ask(source, &query),
        Command::KeysShow => {
            show_keys(&CredentialStore::open_default().load_saved());
            ExitCode::SUCCESS
        }
        Command::KeysSet { key, value } => {
            let partial = Credentials::default().with(key, value);
            match CredentialStore::open_default().save(&partial) {
                Ok(_) => {
                    println!("Saved {key}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::KeysClear => match CredentialStore::open_default().clear() {
            Ok(()) => {
                println!("Cleared stored keys");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Command::Help => {
            println!("{}", Command::help_text());
            ExitCode::SUCCESS
        }
    }
}

/// A broken config file should not lock the user out; fall back to defaults.
fn load_config() -> AppConfig {
    AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring config: {}", e);
        AppConfig::default()
    })
}

fn clients(config: &AppConfig) -> Result<(SerperClient, OpenAiClient), String> {
    let search = SerperClient::new(config).map_err(|e| e.to_string())?;
    let synthesis = OpenAiClient::new(config).map_err(|e| e.to_string())?;
    Ok((search, synthesis))
}

fn ask(source: SearchSource, query: &str) -> ExitCode {
    let config = load_config();
    let (search, synthesis) = match clients(&config) {
        Ok(clients) => clients,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let store = CredentialStore::open_default().with_env_fallback();
    let mut run = Orchestrator::new(store).with_source(source);
    let phase = rt.block_on(orchestrator::drive(&mut run, &search, &synthesis, query));

    match phase {
        Phase::Done => {
            if let Some(answer) = run.answer() {
                println!("{answer}\n");
            }
            if !run.results().is_empty() {
                println!("Search Results ({})\n", source.label());
            }
            for result in run.results() {
                println!("{}\n", render::layout(result, source).to_plain_text());
            }
            ExitCode::SUCCESS
        }
        _ => {
            match run.error() {
                Some(error) => eprintln!("{error}"),
                None => eprintln!("Run ended without an answer ({phase:?})"),
            }
            ExitCode::FAILURE
        }
    }
}

fn show_keys(credentials: &Credentials) {
    for key in CredentialKey::ALL {
        let value = match credentials.get(key) {
            Some(value) if key.is_secret() => mask(value),
            Some(value) => value.to_string(),
            None => "(not set)".to_string(),
        };
        println!("{:<16} {}", key.cli_name(), value);
    }
}

fn start_window() -> Result<(), String> {
    let config = load_config();
    let (search, synthesis) = clients(&config)?;
    let media = MediaClient::new(&config).map_err(|e| e.to_string())?;
    let store = CredentialStore::open_default().with_env_fallback();

    tracing::info!("Starting OpenResearch window");
    let app = OpenResearch::new(store, search, synthesis, media);

    iced::application(OpenResearch::title, OpenResearch::update, OpenResearch::view)
        .subscription(OpenResearch::subscription)
        .theme(OpenResearch::theme)
        .window(window::Settings {
            size: Size::new(1000.0, 760.0),
            position: window::Position::Centered,
            min_size: Some(Size::new(520.0, 420.0)),
            resizable: true,
            ..Default::default()
        })
        .antialiasing(true)
        .run_with(move || (app, Task::none()))
        .map_err(|e| e.to_string())
}
