pub mod app;
pub mod cli;
pub mod config;
pub mod effects;
pub mod logging;
pub mod persistence;
pub mod preview;
pub mod render;

use studio_logging::studio_warn;

use self::cli::Cli;
use self::config::StudioConfig;

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let (mut config, config_error) = match StudioConfig::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(err) => (StudioConfig::default(), Some(err)),
    };
    config.apply_cli(&cli);
    logging::initialize(config.log_destination);
    if let Some(err) = config_error {
        studio_warn!("Using default configuration: {}", err);
    }
    app::run(cli, config)
}
