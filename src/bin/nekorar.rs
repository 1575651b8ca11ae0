use anyhow::{Context, Result};
use clap::Parser;
use nekorar::{Config, Event, Extractor, Selection, StateStore, handoff};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nekorar")]
#[command(about = "Extract RAR, ZIP, 7z and tar archives with external tools")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct NekorarCli {
    /// Archive to extract (a pending forwarded file is used if omitted)
    file: Option<PathBuf>,

    /// Destination folder (the last used folder if omitted)
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Password for encrypted archives
    #[arg(short, long)]
    password: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not open the destination in the file manager after success
    #[arg(long)]
    no_open: bool,

    /// Hand a file URL or path to the next run instead of extracting
    #[arg(long, value_name = "URL_OR_PATH")]
    forward: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = NekorarCli::parse();

    // Initialize tracing; RUST_LOG overrides the default filter
    let default_filter = if cli.verbose {
        "nekorar=debug"
    } else {
        "nekorar=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("starting nekorar v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    // The host reveals the result unless asked not to
    config.extraction.open_destination = !cli.no_open;

    let store = StateStore::new(config.state.resolved_path());

    if let Some(item) = &cli.forward {
        let path = handoff::forward(&store, item).context("forwarding archive")?;
        println!("forwarded {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let extractor = Extractor::new(config).context("starting extraction session")?;
    let access = extractor.access();

    let source = handoff::launch_file(&store, cli.file)?;
    let destination = match cli.destination {
        Some(dir) => {
            // Remember the pick now; a failed attempt must not lose it
            if let Err(e) = store.remember_destination(access.as_ref(), &dir) {
                warn!(error = %e, "could not remember destination");
            }
            Some(dir)
        }
        None => {
            let restored = store.restore_destination(access.as_ref())?;
            if let Some(dir) = &restored {
                info!(destination = ?dir, "using remembered destination");
            }
            restored
        }
    };

    let mut events = extractor.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Status { message } => println!("{}", message),
                Event::Progress { fraction } => debug!("progress {:.0}%", fraction * 100.0),
                Event::Completed { .. } => break,
            }
        }
    });

    let result = extractor
        .extract(Selection {
            source,
            password: cli.password,
            destination,
        })
        .await;

    if let Err(e) = printer.await {
        warn!(error = %e, "event printer stopped unexpectedly");
    }

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
