//! Command-line parsing
//!
//! Parses `openresearch [command] [args...]`. With no command the window opens.

use crate::backend::types::SearchSource;
use crate::credentials::CredentialKey;

/// Parsed command-line invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the window (default)
    Window,
    /// Run one query headless: ask [--source <source>] <query>
    Ask { source: SearchSource, query: String },
    /// Print stored keys, secrets masked
    KeysShow,
    /// Store one field: keys set <field> <value>
    KeysSet { key: CredentialKey, value: String },
    /// Delete the stored record
    KeysClear,
    /// Show help
    Help,
}

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let Some((cmd, rest)) = args.split_first() else {
            return Ok(Command::Window);
        };

        match cmd.as_str() {
            "ask" | "a" => Self::parse_ask(rest),
            "keys" | "k" => Self::parse_keys(rest),
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => Err(format!(
                "Unknown command: {other}. Run 'openresearch help' for usage."
            )),
        }
    }

    fn parse_ask(args: &[String]) -> Result<Self, String> {
        let mut source = SearchSource::default();
        let mut words = Vec::new();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--source" | "-s" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| "--source needs a value".to_string())?;
                    source = value.parse()?;
                }
                _ => words.push(arg.as_str()),
            }
        }

        let query = words.join(" ");
        if query.trim().is_empty() {
            return Err("Usage: openresearch ask [--source <source>] <query>".to_string());
        }
        Ok(Command::Ask {
            source,
            query: query.trim().to_string(),
        })
    }

    fn parse_keys(args: &[String]) -> Result<Self, String> {
        match args {
            [] => Ok(Command::KeysShow),
            [sub] if sub == "show" => Ok(Command::KeysShow),
            [sub] if sub == "clear" => Ok(Command::KeysClear),
            [sub, key, value] if sub == "set" => Ok(Command::KeysSet {
                key: key.parse()?,
                value: value.clone(),
            }),
            _ => Err("Usage: openresearch keys [show | clear | set <field> <value>]".to_string()),
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        r#"OpenResearch - AI-powered research assistant

Usage: openresearch [command]

Commands:
  (none)                          Open the window
  ask [--source <s>] <query>      Search and print the synthesized answer
  keys [show]                     Show stored keys (masked)
  keys set <field> <value>        Store one field
  keys clear                      Delete all stored keys
  help                            Show this help message

Sources: search, images, videos, places, news, shopping, scholar, patents
Fields:  openai-key, openai-base-url, openai-model, serper-key

Environment variables OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL and
SERPER_API_KEY fill in any field that is not stored."#
    }
}
