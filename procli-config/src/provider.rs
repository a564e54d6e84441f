//! Configuration provider using Figment

use crate::{
    discovery::{ConfigFile, ConfigFormat, FileDiscovery},
    error::ConfigError,
    types::CliConfig,
    ConfigResult,
};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, trace};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "PROCLI_";

/// Loads [`CliConfig`] from defaults, discovered files and the environment
///
/// Nothing is cached; every call reads the sources again.
#[derive(Debug, Default)]
pub struct ConfigProvider {
    discovery: FileDiscovery,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider searching the directories of `discovery`
    pub fn with_discovery(discovery: FileDiscovery) -> Self {
        Self { discovery }
    }

    /// Load and validate the merged configuration
    pub fn load(&self) -> ConfigResult<CliConfig> {
        let config: CliConfig = self.build_figment().extract()?;
        Self::validate(&config)?;
        debug!(
            "Loaded configuration: default_command={:?}, {} aliased command(s)",
            config.default_command,
            config.aliases.len()
        );
        Ok(config)
    }

    /// Sources in precedence order, later overriding earlier:
    /// defaults, global files, project files, `PROCLI_` environment variables.
    fn build_figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(CliConfig::default()));
        for file in self.discovery.discover_all() {
            trace!("Merging config file: {}", file.path.display());
            figment = figment.merge(Self::file_provider(&file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    fn file_provider(file: &ConfigFile) -> Figment {
        match file.format {
            ConfigFormat::Toml => Figment::from(Toml::file(&file.path)),
            ConfigFormat::Yaml => Figment::from(Yaml::file(&file.path)),
            ConfigFormat::Json => Figment::from(Json::file(&file.path)),
        }
    }

    fn validate(config: &CliConfig) -> ConfigResult<()> {
        if config.prompt.contains('\n') {
            return Err(ConfigError::invalid_value(
                "prompt",
                "must not contain a newline",
            ));
        }
        if let Some(command) = &config.default_command {
            if command.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "default_command",
                    "must not be empty",
                ));
            }
        }
        Ok(())
    }
}
