use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use setu_core::session::adapters::FileSessionStore;
use setu_core::{get_default_config_file, SchemeCatalog, SetuClient, SetuConfig};
use std::sync::Arc;
use tracing::{info, warn};

mod app;
mod cli;
mod emulators;
mod logging;
mod output;

use crate::app::AppContext;
use crate::cli::{Args, Command};
use crate::logging::init_logging;
use crate::output::print_warning;

/// Entry point: loads configuration, then runs the requested surface
#[tokio::main]
async fn main() -> Result<()> {
    // Values from .env count as real environment variables
    dotenv().ok();

    let args = Args::parse();

    // init-config writes the file --config names, so it runs before that file is read
    if let Some(Command::InitConfig { force }) = &args.command {
        init_logging(args.log_level.as_deref().unwrap_or("warn"));
        let path = match &args.config {
            Some(path) => path.clone(),
            None => get_default_config_file().context("No configuration directory")?,
        };
        return app::init_config(&path, *force);
    }

    let mut config = match (SetuConfig::load_from(args.config.as_deref()), &args.config) {
        (Ok(config), _) => config,
        (Err(e), Some(path)) => {
            return Err(e).with_context(|| format!("Failed to load {}", path.display()));
        }
        (Err(e), None) => {
            print_warning(&format!("Ignoring configuration file: {}", e));
            SetuConfig::default()
        }
    };
    if let Some(url) = &args.backend_url {
        config.backend.base_url = url.clone();
    }
    if let Some(level) = &args.log_level {
        config.cli.log_level = level.clone();
    }

    init_logging(&config.cli.log_level);
    info!("Using backend at {}", config.backend.base_url);

    let client = SetuClient::new(&config.backend).context("Failed to create backend client")?;
    let session_file = config
        .resolve_session_file()
        .context("Failed to locate the session file")?;

    let talks_to_backend = args
        .command
        .as_ref()
        .map(Command::needs_backend)
        .unwrap_or(true);
    if talks_to_backend && !client.ping().await {
        warn!("Backend ping failed");
        print_warning(&format!(
            "Backend at {} is not reachable. Replies will fail until it is running.",
            client.base_url()
        ));
    }

    let ctx = AppContext {
        config,
        client,
        store: FileSessionStore::new(session_file),
        catalog: Arc::new(SchemeCatalog::builtin()),
    };

    match args.command {
        Some(command) => app::run_command(&ctx, command).await,
        None => app::run_home_menu(&ctx).await,
    }
}
