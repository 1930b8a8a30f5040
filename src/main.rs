use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{debug, error};
use tokio::sync::mpsc;

mod distro;
mod engine;
mod env;
mod modconfig;
mod storage;
mod util;

use engine::SyncEngine;
use engine::state::{AppState, LauncherEvent, Overlay};
use storage::ConfigStore;

#[derive(Parser, Debug)]
#[command(
    name = "distro-sync",
    author,
    version,
    about = "Reconcile launcher mod selections against a distribution index"
)]
struct Cli {
    /// Distribution index to reconcile against.
    #[arg(long)]
    index: Option<PathBuf>,
    /// Launcher configuration file holding the stored mod selections.
    #[arg(long)]
    config: Option<PathBuf>,
    /// The index is a previously cached copy rather than a fresh download.
    #[arg(long)]
    cached: bool,
    /// Print the reconciled configurations instead of saving them.
    #[arg(long)]
    dry_run: bool,
    /// Print version and exit.
    #[arg(long)]
    version_only: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.version_only {
        println!("distro-sync {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let config_path = cli.config.unwrap_or_else(env::config_file);
    let index_path = cli.index.unwrap_or_else(env::distribution_file);

    let store = match ConfigStore::load(&config_path).await {
        Ok(store) => store,
        Err(err) => {
            error!("startup: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut engine = SyncEngine::new(store);
    if cli.dry_run {
        engine = engine.dry_run();
    }

    let (updates, mut states) = mpsc::unbounded_channel();
    let distribution = distro::load_distribution(&index_path).await;
    let loaded = distribution.is_ok();
    engine
        .handle_event(LauncherEvent::DistributionIndexDone(distribution), &updates)
        .await;
    if cli.cached && loaded {
        engine
            .handle_event(LauncherEvent::CachedDistribution, &updates)
            .await;
    }
    drop(updates);

    let mut code = ExitCode::SUCCESS;
    while let Some(state) = states.recv().await {
        match state {
            AppState::Showing(view) => {
                println!("ready: {:?} ({})", view, view.container_id());
            }
            AppState::Overlay(overlay) => {
                println!("{}\n\n{}", overlay.title, overlay.body);
                println!("  [{}] {}", overlay.accept_label, overlay.accept.describe());
                println!("  [{}] {}", overlay.dismiss_label, overlay.dismiss.describe());
                if overlay == Overlay::fatal_startup_error() {
                    code = ExitCode::FAILURE;
                }
            }
            AppState::Error(err) => {
                println!("error: {err}");
                code = ExitCode::FAILURE;
            }
            AppState::Loading => {}
        }
    }

    debug!("final view: {:?}", engine.current_view());

    if cli.dry_run {
        match serde_json::to_string_pretty(engine.store().mod_configurations()) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                error!("dry-run: failed to render configurations: {err}");
                code = ExitCode::FAILURE;
            }
        }
    }
    code
}
