//! Deep Research Agent API launcher - Main entry point
//!
//! A thin binary over the launcher library: parse the CLI, set up logging
//! and signal handling, then run the requested command.

mod cli;
mod config_file;
mod dry_run;
mod error;
mod installer;
mod interpreter;
mod launcher;
mod manifest;
mod process_guard;
mod sanity;
mod types;

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::config_file::LaunchConfig;
use crate::interpreter::PythonInterpreter;
use crate::manifest::DependencyManifest;
use crate::process_guard::ProcessGuard;

/// Initialize the logger with appropriate settings
fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;

    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

/// Main application entry point
fn main() {
    // Initialize logging first
    init_logger();
    info!("Deep Research Agent API launcher starting up");

    // Initialize signal handlers for graceful child process cleanup
    // This ensures pip children are terminated if we receive SIGINT/SIGTERM
    if let Err(e) = process_guard::init_signal_handlers() {
        log::warn!("Failed to initialize signal handlers: {}", e);
        // Continue anyway - cleanup will still work via Drop
    }
    debug!("Signal handlers initialized");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    if cli.dry_run {
        dry_run::enable_dry_run();
    }

    // Terminates any still-running children on every exit path
    let _guard = ProcessGuard::new();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Dispatch the parsed command, returning the process exit code
fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Launch { app_root, python }) => {
            run_launch(config, app_root, python)
        }
        None => {
            // Bare invocation launches
            debug!("No command specified, launching");
            run_launch(config, None, None)
        }
        Some(Commands::Check { app_root, python }) => {
            let config = with_python_override(config, python);
            let code = launcher::run_check(&config, app_root.as_deref())?;
            Ok(code)
        }
        Some(Commands::Install { app_root, python }) => {
            run_install(with_python_override(config, python), app_root)
        }
        Some(Commands::Validate { path }) => {
            info!("Validating configuration file: {:?}", path);
            match LaunchConfig::load_from_file(&path) {
                Ok(loaded) => match loaded.validate() {
                    Ok(_) => {
                        info!("Configuration validation successful");
                        println!("✓ Configuration file is valid: {:?}", path);
                        Ok(0)
                    }
                    Err(e) => {
                        error!("Configuration validation failed: {}", e);
                        eprintln!("✗ Configuration validation failed: {}", e);
                        Ok(1)
                    }
                },
                Err(e) => {
                    error!("Failed to load configuration file: {}", e);
                    eprintln!("✗ Failed to load configuration file: {}", e);
                    Ok(1)
                }
            }
        }
    }
}

/// Load the launch configuration, falling back to built-in defaults
fn load_config(path: Option<&Path>) -> Result<LaunchConfig> {
    match path {
        Some(path) => {
            let config = LaunchConfig::load_from_file(path)?;
            config
                .validate()
                .with_context(|| format!("Invalid configuration: {:?}", path))?;
            Ok(config)
        }
        None => Ok(LaunchConfig::default()),
    }
}

/// Apply a CLI interpreter override on top of the loaded configuration
fn with_python_override(mut config: LaunchConfig, python: Option<PathBuf>) -> LaunchConfig {
    if python.is_some() {
        config.python = python;
    }
    config
}

/// Full launch: on success the process image is replaced and this never
/// returns (except in dry-run mode)
fn run_launch(
    config: LaunchConfig,
    app_root: Option<PathBuf>,
    python: Option<PathBuf>,
) -> Result<i32> {
    let config = with_python_override(config, python);
    launcher::launch(&config, app_root.as_deref())?;
    // Only reachable in dry-run mode
    Ok(0)
}

/// Unconditional dependency installation from the manifest
fn run_install(config: LaunchConfig, app_root: Option<PathBuf>) -> Result<i32> {
    let python = PythonInterpreter::discover(config.python.as_deref())?;
    let app_root = launcher::resolve_app_root(app_root.as_deref(), &config)?;

    let manifest_path = if config.requirements.is_absolute() {
        config.requirements.clone()
    } else {
        app_root.join(&config.requirements)
    };
    let manifest = DependencyManifest::load(&manifest_path)?;

    let output = installer::install_requirements(&python, &manifest)?;
    if !output.success {
        anyhow::bail!(
            "pip exited with code {}",
            output.exit_code.unwrap_or(-1)
        );
    }

    println!(
        "✓ Installed {} requirement(s) from {}",
        manifest.len(),
        manifest_path.display()
    );
    Ok(0)
}
