use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deep Research Agent API launcher
#[derive(Parser)]
#[command(name = "dra-launch")]
#[command(about = "Preflight launcher for the Deep Research Agent API")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// In this mode, mutating operations (dependency install, the final
    /// exec) are skipped and logged. Read-only operations (interpreter
    /// discovery, import probes) still execute so the preview is realistic.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Path to a launch configuration file (JSON). Built-in defaults are
    /// used when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run preflight checks, repair dependencies, and hand off to the API
    Launch {
        /// Application root directory (defaults to the launcher's own directory)
        #[arg(long)]
        app_root: Option<PathBuf>,

        /// Python interpreter to use instead of PATH discovery
        #[arg(long)]
        python: Option<PathBuf>,
    },
    /// Report the state of every preflight check without launching
    Check {
        /// Application root directory (defaults to the launcher's own directory)
        #[arg(long)]
        app_root: Option<PathBuf>,

        /// Python interpreter to use instead of PATH discovery
        #[arg(long)]
        python: Option<PathBuf>,
    },
    /// Install dependencies from the manifest unconditionally
    Install {
        /// Application root directory (defaults to the launcher's own directory)
        #[arg(long)]
        app_root: Option<PathBuf>,

        /// Python interpreter to use instead of PATH discovery
        #[arg(long)]
        python: Option<PathBuf>,
    },
    /// Validate a launch configuration file
    Validate {
        /// Path to configuration file to validate
        path: PathBuf,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
