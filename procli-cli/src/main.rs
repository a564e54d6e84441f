use procli_cli::demo::demo_registry;
use procli_cli::exit_codes::EXIT_ERROR;
use procli_cli::parser::verbose_override;
use procli_cli::{handle_cli_result, App, ConfiguredAliases, LineByLineLogger, SurfaceBuilder};
use procli_config::CliConfig;
use procli_router::LocalExecutor;
use std::process;
use std::sync::Arc;
use tokio::io::BufReader;

/// Load configuration, falling back to defaults when it cannot be read
fn load_cli_configuration() -> CliConfig {
    match procli_config::load_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Configuration loading failed: {}", e);
            eprintln!("Continuing with default configuration...");
            CliConfig::default()
        }
    }
}

fn configure_logging(verbose: bool, filter: Option<&str>) {
    use tracing::Level;
    use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

    let log_level = if verbose { Level::DEBUG } else { Level::WARN };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::new(log_level.to_string()),
    });

    registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let config = load_cli_configuration();
    let verbose = verbose_override(&argv).unwrap_or(config.verbose_errors);
    configure_logging(verbose, config.log_filter.as_deref());

    let registry = Arc::new(demo_registry());
    let mut builder = SurfaceBuilder::new("procli")
        .version(env!("CARGO_PKG_VERSION"))
        .description(env!("CARGO_PKG_DESCRIPTION"))
        .alias_policy(ConfiguredAliases::new(config.clone()));
    if let Some(name) = &config.default_command {
        builder = builder.default_command(name.clone());
    }
    let surface = match builder.build(registry.operations()) {
        Ok(surface) => Arc::new(surface),
        Err(e) => {
            eprintln!("Failed to build command surface: {}", e);
            process::exit(EXIT_ERROR);
        }
    };
    for ignored in surface.ignored() {
        tracing::warn!("Operation {} is unavailable: {}", ignored.operation, ignored.reason);
    }

    let app = App::new(
        surface,
        Arc::new(LocalExecutor::new(registry)),
        Arc::new(LineByLineLogger::console()),
        config,
    );
    let stdin = BufReader::new(tokio::io::stdin());
    let result = app.run(&argv, stdin, tokio::io::stdout()).await;
    process::exit(handle_cli_result(result));
}
