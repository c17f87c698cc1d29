//! Desktop integration.

pub mod links;
