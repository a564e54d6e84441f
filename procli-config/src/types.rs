//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings for a procli command-line surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Raise raw errors instead of printing diagnostics
    pub verbose_errors: bool,
    /// Prompt shown by the interactive session
    pub prompt: String,
    /// Command used when no command token is given
    pub default_command: Option<String>,
    /// Single-character flag aliases: command name to flag name to alias
    pub aliases: BTreeMap<String, BTreeMap<String, String>>,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbose_errors: false,
            prompt: "> ".to_string(),
            default_command: None,
            aliases: BTreeMap::new(),
            log_filter: None,
        }
    }
}

impl CliConfig {
    /// Configured alias for a flag of a command, if any
    pub fn alias_for(&self, command: &str, flag: &str) -> Option<&str> {
        self.aliases
            .get(command)
            .and_then(|flags| flags.get(flag))
            .map(String::as_str)
    }
}
