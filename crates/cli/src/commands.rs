use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use log::{error, info};
use serde_json::json;
use shelfwatch_config::{apply_env_overrides, Config, ConfigManager, DiscoveryMode};
use shelfwatch_core::{split_extension, DocumentMetadata, MediaKind};
use shelfwatch_library::{merge, parse_name, EbookMetaStore, IngestOptions, Orchestrator, PathPlanner};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Builds the effective configuration: file, then environment, then flags
pub fn load_config(matches: &ArgMatches) -> Result<Config> {
    let manager = match matches.get_one::<PathBuf>("config") {
        Some(path) => ConfigManager::with_file(path),
        None => ConfigManager::new(),
    };

    let mut config = manager.load().context("Failed to load config file")?;
    apply_env_overrides(&mut config).context("Invalid environment variable")?;
    apply_cli_overrides(&mut config, matches)?;

    config.validated().context("Invalid configuration")
}

/// Applies command-line flags on top of `config`
pub fn apply_cli_overrides(config: &mut Config, matches: &ArgMatches) -> Result<()> {
    if let Some(root) = matches.get_one::<PathBuf>("root") {
        config.watch.root = root.clone();
    }
    if matches.get_flag("mangas") {
        config.watch.manga_monitoring = true;
    }
    if matches.get_flag("no-books") {
        config.watch.book_monitoring = false;
    }
    if matches.get_flag("poll") {
        config.watch.discovery = DiscoveryMode::Poll;
    }
    if let Some(workers) = matches.get_one::<usize>("workers") {
        config.watch.max_workers = *workers;
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.app.log_level = level.parse().map_err(anyhow::Error::msg)?;
    }
    Ok(())
}

fn orchestrator(config: &Config) -> Result<Orchestrator> {
    let store = Arc::new(EbookMetaStore::new(&config.metadata.program));
    let orchestrator = Orchestrator::new(IngestOptions::from(config), store);
    orchestrator
        .prepare()
        .context("Failed to create the watched folders")?;
    Ok(orchestrator)
}

/// Watches until interrupted
pub async fn watch(config: Config) -> Result<()> {
    let orchestrator = orchestrator(&config)?;
    let kinds: Vec<String> = orchestrator
        .options()
        .enabled_kinds()
        .iter()
        .map(|k| k.to_string())
        .collect();
    info!(
        "Watching {} for {} ({} discovery, {} workers)",
        config.watch.root.display(),
        kinds.join(" and "),
        config.watch.discovery,
        config.watch.max_workers
    );

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });

    orchestrator.run(shutdown).await.context("Watcher failed")?;
    info!("Shutdown complete");
    Ok(())
}

/// Processes what is waiting right now
pub async fn scan(config: Config) -> Result<()> {
    let orchestrator = orchestrator(&config)?;
    let report = orchestrator.scan_once().await.context("Scan failed")?;

    println!(
        "{} relocated, {} skipped, {} failed",
        style(report.relocated).green().bold(),
        style(report.skipped).yellow(),
        style(report.failed).red()
    );

    if report.failed > 0 {
        bail!("{} files could not be processed", report.failed);
    }
    Ok(())
}

/// Prints the interpretation of a file name as JSON
pub fn parse(matches: &ArgMatches) -> Result<()> {
    let name = matches
        .get_one::<String>("name")
        .ok_or_else(|| anyhow::anyhow!("File name is required"))?;
    let kind = if matches.get_flag("manga") {
        MediaKind::Manga
    } else {
        MediaKind::Book
    };

    let report = describe(kind, name)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn describe(kind: MediaKind, name: &str) -> Result<serde_json::Value> {
    let (base, extension) = split_extension(name);
    let Some(guess) = parse_name(kind, base) else {
        bail!("'{}' does not follow the {} naming convention", name, kind);
    };

    let destination = merge(kind, Some(&guess), &DocumentMetadata::default()).map(|merged| {
        PathPlanner::new("", "books", "mangas")
            .plan(kind, &merged, extension)
            .path()
    });

    Ok(json!({
        "kind": kind,
        "guess": guess,
        "destination": destination,
    }))
}

/// Prints the effective config, or writes a default file with `--init`
pub fn show_config(config: &Config, matches: &ArgMatches) -> Result<()> {
    if let Some(path) = matches.get_one::<PathBuf>("init") {
        let created = ConfigManager::with_file(path)
            .initialize()
            .context("Failed to write config file")?;
        if created {
            println!("{} Wrote {}", style("✓").green().bold(), path.display());
        } else {
            println!("{} already exists, left untouched", path.display());
        }
        return Ok(());
    }

    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
