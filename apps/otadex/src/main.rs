//! otadex - A/B OTA dexopt coordinator
//!
//! Wires configuration, the host platform and the package manifest into an
//! `OtaDexoptService` and drives one session per invocation.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands};
use crate::display::{OperationResult, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use otadex_config::{constants, Config};
use otadex_dexopt::{ManifestRegistry, OtaDexoptService, OtaDexoptServiceBuilder};
use otadex_events::{EventReceiver, EventSender};
use otadex_platform::{FsArtifactMover, LinuxPlatform, ProcessBackend, StatvfsStorage};
use otadex_types::{ColorChoice, DexoptMode, NextCommand, OutputFormat, RunReport};
use std::process;
use std::sync::Arc;
use std::time::Instant;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting otadex v{}", env!("CARGO_PKG_VERSION"));

    // Precedence: file (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);

    let (event_sender, event_receiver) = otadex_events::channel();

    let service = build_service(&config, event_sender).await?;

    let color = config.general.color;
    let format = if cli.global.json {
        OutputFormat::Json
    } else {
        config.general.default_output
    };
    let renderer = OutputRenderer::new(format, color);

    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(
        colors_enabled,
        cli.global.debug,
        format == OutputFormat::Tty,
    );

    let result =
        execute_command_with_events(cli.command, service, event_receiver, &mut event_handler)
            .await?;

    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Assemble the service from configuration and the host platform
async fn build_service(
    config: &Config,
    event_sender: EventSender,
) -> Result<OtaDexoptService, CliError> {
    let registry = ManifestRegistry::load(config.manifest_path()?).await?;

    let storage = StatvfsStorage::new(
        config.storage.low_space_percent,
        config.storage.low_space_max_bytes,
    )
    .with_fixed_threshold(config.storage.low_space_bytes);
    let platform = LinuxPlatform::new(
        storage,
        FsArtifactMover::new(config.staging_dir()),
        ProcessBackend::new(config.backend_program()),
    );

    let service = OtaDexoptServiceBuilder::new()
        .with_config(config)?
        .with_platform(&platform)
        .with_registry(Arc::new(registry))
        .with_event_sender(event_sender)
        .build()?;

    Ok(service)
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    service: OtaDexoptService,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    // The service is synchronous; keep it off the runtime threads
    let mut command_task = tokio::task::spawn_blocking(move || execute_command(&command, &service));

    loop {
        select! {
            result = &mut command_task => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result?;
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
fn execute_command(
    command: &Commands,
    service: &OtaDexoptService,
) -> Result<OperationResult, CliError> {
    match command {
        Commands::Export { limit } => {
            let started = Instant::now();
            service.prepare()?;
            let total_packages = service.status().total_packages;

            let mut commands = Vec::new();
            let outcome = loop {
                if limit.is_some_and(|limit| commands.len() >= limit) {
                    break Ok(());
                }
                match service.next_dexopt_command() {
                    Ok(NextCommand::Command(command)) => commands.push(command),
                    Ok(NextCommand::NothingToDo) => break Ok(()),
                    Err(e) => break Err(e),
                }
            };
            service.cleanup();
            outcome?;

            let report = RunReport {
                mode: DexoptMode::Export,
                total_packages,
                commands: commands.len(),
                duration_ms: elapsed_ms(started),
            };
            Ok(OperationResult::Export { commands, report })
        }

        Commands::Run { .. } => {
            let started = Instant::now();
            service.prepare()?;
            let total_packages = service.status().total_packages;

            let outcome = (|| {
                while !service.is_done()? {
                    service.dexopt_next_package()?;
                }
                Ok::<(), otadex_errors::Error>(())
            })();
            service.cleanup();
            outcome?;

            Ok(OperationResult::Run(RunReport {
                mode: DexoptMode::Direct,
                total_packages,
                commands: 0,
                duration_ms: elapsed_ms(started),
            }))
        }

        // Relocation already ran while the service was built
        Commands::Relocate => Ok(OperationResult::Relocation(
            service.relocation_report().clone(),
        )),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if json_mode {
        // JSON mode: keep stdout clean for the result document
        if debug_enabled {
            if let Some(file) = create_log_file() {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,otadex=debug"),
                        ),
                    )
                    .init();
                return;
            }
        }
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        if let Some(file) = create_log_file() {
            tracing_subscriber::fmt()
                .json()
                .with_writer(file)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new("info,otadex=debug")
                    }),
                )
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
                )
                .init();
        }
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
}

/// Open a timestamped log file under the logs directory
fn create_log_file() -> Option<std::fs::File> {
    let log_dir = std::path::Path::new(constants::LOGS_DIR);
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Warning: Failed to create log directory: {e}");
        return None;
    }

    let log_file = log_dir.join(format!(
        "otadex-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    match std::fs::File::create(&log_file) {
        Ok(file) => {
            eprintln!("Debug logging enabled: {}", log_file.display());
            Some(file)
        }
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {e}");
            None
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if let Some(manifest) = &global.manifest {
        config.paths.manifest = Some(manifest.clone());
    }
    if let Commands::Run {
        backend: Some(program),
    } = command
    {
        config.paths.backend_program = Some(program.clone());
    }
}
