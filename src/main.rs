use clap::Parser;
use color_eyre::Result;

use hostdeck::app::{App, Services};
use hostdeck::cli::args::Args;
use hostdeck::cli::{commands, console};
use hostdeck::config::AppConfig;
use hostdeck::constants;
use hostdeck::core::store::ProfileStore;
use hostdeck::event::EventHandler;
use hostdeck::{logger, utils};

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config_dir = utils::get_app_config_dir(args.config_dir.as_deref())?;
    let config = AppConfig::load(&config_dir);
    if config.logging.to_file {
        logger::init(
            &config_dir.join(constants::LOGS_DIR_NAME),
            config.logging.retention_days,
        );
    }

    let services = Services::system()?;

    if let Some(command) = args.command {
        return commands::run(
            command,
            commands::Context {
                config_dir,
                config,
                services,
            },
        );
    }

    let store = ProfileStore::in_dir(&config_dir);
    let mut app = App::new(store, config, services);
    let events = EventHandler::new(constants::DEFAULT_TICK_RATE);
    let mut stdout = std::io::stdout();
    console::run(&mut app, &events, &mut stdout)?;

    if app.handoff_ready() {
        app.into_installer().terminate();
    }
    Ok(())
}
