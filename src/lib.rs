//! OpenResearch: search the web, then let an LLM answer from the results.
//!
//! The run lifecycle lives in [`orchestrator`]; [`backend`] holds the two
//! provider clients; [`credentials`] persists the user's keys; [`render`]
//! maps results to layouts for the window ([`app`], [`ui`]) and the CLI.

pub mod app;
pub mod backend;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod native;
pub mod orchestrator;
pub mod render;
pub mod storage;
pub mod ui;
