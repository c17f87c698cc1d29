//! Window widgets.

pub mod results;
pub mod search_bar;
pub mod settings;
pub mod theme;
