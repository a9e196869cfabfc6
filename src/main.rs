#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level as TraceLevel, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use dashgrid::Dashboard;
use dashgrid::capability::{CapabilitySource, StaticCapabilities, fetch_or_fallback};
use dashgrid::config::Config;
use dashgrid::interaction::PointerEvent;
use dashgrid::persistence::{
    CredentialProvider, HttpCapabilitySource, HttpLayoutStore, LayoutWriter, PersistenceGateway, RemoteLayoutStore,
    SaveQueue,
};
use dashgrid::tracking::TracingSink;

#[derive(Parser, Debug)]
#[command(name = "dashgrid", version, about = "Dashboard widget layout engine")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Container width in pixels, selects the breakpoint
    #[arg(long, global = true, default_value_t = 1280)]
    width: u32,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved placements as JSON
    Show,
    /// Drag a widget by a pointer delta in pixels; snaps to the grid
    Move {
        id: String,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
        dx: i32,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
        dy: i32,
    },
    /// Resize a widget by a pointer delta in pixels; snaps to the grid
    Resize {
        id: String,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
        dw: i32,
        #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
        dh: i32,
    },
    /// Show or hide a widget
    Toggle { id: String },
    /// Delete a widget
    Delete { id: String },
    /// Discard saved overrides and restore the default arrangement
    Reset,
}

fn init_tracing() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    // stdout carries command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_gateway(config: &Config) -> PersistenceGateway {
    let remote: Option<Box<dyn RemoteLayoutStore>> = match &config.remote.layout_url {
        Some(url) => match HttpLayoutStore::new(url.as_str(), config.remote.timeout()) {
            Ok(store) => Some(Box::new(store)),
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to build remote layout client, using fallback store only");
                None
            }
        },
        None => None,
    };

    let local = config.storage.fallback_store();
    info!(path = %local.path().display(), remote = remote.is_some(), "Persistence configured");
    PersistenceGateway::new(remote, Box::new(config.remote.credential()), Box::new(local))
}

fn capability_source(config: &Config) -> Box<dyn CapabilitySource> {
    if let Some(url) = &config.remote.capabilities_url {
        let credentials: Arc<dyn CredentialProvider> = Arc::new(config.remote.credential());
        match HttpCapabilitySource::new(url.as_str(), config.remote.timeout(), credentials) {
            Ok(source) => return Box::new(source),
            Err(e) => warn!(url = %url, error = %e, "Failed to build capability client"),
        }
    }
    // No admin service: an empty table leaves every widget on the permissive default
    Box::new(StaticCapabilities::default())
}

fn print_placements(dashboard: &Dashboard) -> Result<()> {
    let json = serde_json::to_string_pretty(dashboard.placements()).context("Failed to serialize placements")?;
    println!("{json}");
    Ok(())
}

fn run(cli: Cli, dashboard: &mut Dashboard) -> Result<()> {
    match cli.cmd {
        Command::Show => {}
        Command::Move { id, dx, dy } => {
            dashboard.set_editing(true);
            dashboard.pointer_down(&id, &PointerEvent::on_drag_handle(0, 0))?;
            dashboard.pointer_move(&PointerEvent::at(dx, dy));
            dashboard.pointer_up();
        }
        Command::Resize { id, dw, dh } => {
            dashboard.set_editing(true);
            dashboard.pointer_down(&id, &PointerEvent::on_resize_handle(0, 0))?;
            dashboard.pointer_move(&PointerEvent::at(dw, dh));
            dashboard.pointer_up();
        }
        Command::Toggle { id } => {
            let visible = dashboard.toggle_visibility(&id)?;
            info!(widget = %id, visible, "Visibility changed (not persisted)");
        }
        Command::Delete { id } => dashboard.delete_widget(&id)?,
        Command::Reset => dashboard.reset_layout(),
    }
    print_placements(dashboard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let catalog = config.catalog()?;
    let defaults = config.defaults()?;
    info!(widgets = catalog.len(), defaults = defaults.positions.len(), "Catalog loaded");

    let capabilities = fetch_or_fallback(capability_source(&config).as_ref(), &catalog);

    let gateway = Arc::new(build_gateway(&config));
    let saved = gateway.load();
    let queue = Arc::new(SaveQueue::spawn(Arc::clone(&gateway)));
    let writer: Box<dyn LayoutWriter> = Box::new(Arc::clone(&queue));

    let mut dashboard = Dashboard::new(
        catalog,
        capabilities,
        defaults,
        saved,
        config.grid.metrics(cli.width),
        writer,
        Arc::new(TracingSink),
    );

    let result = run(cli, &mut dashboard);
    drop(dashboard);

    // Wait for queued saves before exiting
    match Arc::try_unwrap(queue) {
        Ok(queue) => {
            for report in queue.shutdown() {
                match report.result {
                    Ok(()) => info!(version = report.version, "Layout saved"),
                    Err(e) if e.is_transient() => {
                        warn!(version = report.version, error = %e, "Layout kept in fallback store only")
                    }
                    Err(e) => error!(version = report.version, error = %e, "Layout save failed"),
                }
            }
        }
        Err(_) => warn!("Save queue still shared at exit, pending saves finish on drop"),
    }

    result
}
