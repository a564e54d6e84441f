//! Procli configuration management using Figment
//!
//! Configuration is merged from, in increasing precedence:
//!
//! - Built-in defaults
//! - Global files: `~/.procli/procli.{toml,yaml,yml,json}`
//! - Project files: `./.procli/procli.{toml,yaml,yml,json}`
//! - Environment variables prefixed with `PROCLI_`
//!
//! Command-line globals are applied on top by the caller.
//!
//! ```no_run
//! use procli_config::load_configuration;
//!
//! let config = load_configuration()?;
//! println!("prompt: {:?}", config.prompt);
//! # Ok::<(), procli_config::ConfigError>(())
//! ```

pub mod discovery;
pub mod error;
pub mod provider;
pub mod types;

pub use discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery};
pub use error::ConfigError;
pub use provider::ConfigProvider;
pub use types::CliConfig;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load configuration from all sources
pub fn load_configuration() -> ConfigResult<CliConfig> {
    ConfigProvider::new().load()
}
