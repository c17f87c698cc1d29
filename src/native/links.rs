//! Opening result links in the user's browser.

use std::process::Command;

const NO_ARGS: &[&str] = &[];
// `start` takes the first quoted argument as a window title.
const WINDOWS_START: &[&str] = &["/C", "start", ""];

/// Program and leading arguments that hand a URL to the desktop.
fn opener() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", NO_ARGS)
    } else if cfg!(target_os = "windows") {
        ("cmd", WINDOWS_START)
    } else {
        ("xdg-open", NO_ARGS)
    }
}

/// Only web links are handed to the system; result data comes from a third
/// party and must not launch local files or custom handlers.
pub fn is_openable(url: &str) -> bool {
    reqwest::Url::parse(url)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Open `url` with the default handler. Does not wait for the browser.
pub fn open_link(url: &str) -> Result<(), String> {
    if !is_openable(url) {
        return Err(format!("Refusing to open {url}"));
    }
    let (program, args) = opener();
    Command::new(program)
        .args(args)
        .arg(url)
        .spawn()
        .map_err(|e| format!("Failed to open {}: {}", url, e))?;
    Ok(())
}
