//! Pre-flight sanity checks for the runtime environment
//!
//! This module verifies the environment before the hand-off happens:
//! - A Python 3 interpreter is discoverable
//! - The configured modules are importable
//! - Required environment variables are present
//!
//! A missing interpreter is the one fatal condition: the program exits
//! with a clear error message and status 1 before anything else runs.
//! Missing environment variables only produce warnings.

use crate::config_file::{EnvVarSpec, LaunchConfig};
use crate::interpreter::PythonInterpreter;
use crate::types::ProbeOutcome;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    /// Discovered interpreter; `None` is fatal
    pub interpreter: Option<PythonInterpreter>,
    /// Per-module probe outcomes, in configuration order
    pub module_probes: Vec<(String, ProbeOutcome)>,
    /// Required environment variables that are unset or empty
    pub missing_required_env: Vec<EnvVarSpec>,
    /// Optional environment variables that are unset or empty
    pub missing_optional_env: Vec<EnvVarSpec>,
}

impl SanityCheckResult {
    /// Returns true if the launch can proceed.
    ///
    /// Missing modules are not fatal here (the install step repairs them)
    /// and missing environment variables only warn.
    pub fn is_ok(&self) -> bool {
        self.interpreter.is_some()
    }

    /// Modules whose import probe did not succeed
    pub fn missing_modules(&self) -> Vec<String> {
        self.module_probes
            .iter()
            .filter(|(_, outcome)| !outcome.is_importable())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Skip import probes (for development/testing)
/// Set DRA_LAUNCH_SKIP_PROBES=1 to skip
pub fn should_skip_probes() -> bool {
    std::env::var("DRA_LAUNCH_SKIP_PROBES")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Perform all sanity checks and return the result
pub fn verify_environment(config: &LaunchConfig) -> SanityCheckResult {
    let interpreter = match PythonInterpreter::discover(config.python.as_deref()) {
        Ok(interp) => Some(interp),
        Err(e) => {
            log::debug!("Interpreter discovery failed: {}", e);
            None
        }
    };

    let module_probes = match &interpreter {
        Some(interp) if !should_skip_probes() => interp.probe_modules(&config.probe_modules),
        Some(_) => {
            log::warn!("Import probes skipped (DRA_LAUNCH_SKIP_PROBES=1)");
            Vec::new()
        }
        None => Vec::new(),
    };

    let missing_required_env = config
        .required_env
        .iter()
        .filter(|spec| !spec.is_set())
        .cloned()
        .collect();

    let missing_optional_env = config
        .optional_env
        .iter()
        .filter(|spec| !spec.is_set())
        .cloned()
        .collect();

    SanityCheckResult {
        interpreter,
        module_probes,
        missing_required_env,
        missing_optional_env,
    }
}

/// Print a pretty error message to stderr and exit
/// This is called before any child process is spawned, so stderr is clean
pub fn print_error_and_exit(result: &SanityCheckResult) -> ! {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║           Deep Research Agent API - Pre-flight Failed            ║");
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();

    if result.interpreter.is_none() {
        eprintln!("❌ ERROR: No Python 3 interpreter found");
        eprintln!("   The API entry point is a Python program and cannot start without one.");
        eprintln!();
        eprintln!("   Solution: Install Python 3 and make sure it is on PATH:");
        eprintln!("     debian/ubuntu: apt install python3");
        eprintln!("     arch:          pacman -S python");
        eprintln!("     macos:         brew install python3");
        eprintln!();
    }

    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║  Fix the above issues and try again.                             ║");
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();

    std::process::exit(1);
}

/// Emit environment-variable warnings without failing the launch.
///
/// The warning for required variables goes to stdout: callers wrapping the
/// launcher capture stdout for status lines.
pub fn warn_missing_env(result: &SanityCheckResult) {
    for spec in &result.missing_required_env {
        println!(
            "⚠ WARNING: {} is not set ({}); the API will start but requests will fail",
            spec.name, spec.description
        );
        log::warn!("Required environment variable {} is not set", spec.name);
    }

    for spec in &result.missing_optional_env {
        log::debug!(
            "Optional environment variable {} is not set ({})",
            spec.name,
            spec.description
        );
    }
}

/// Run pre-flight checks, exiting on the fatal condition
pub fn run_preflight_checks(config: &LaunchConfig) -> SanityCheckResult {
    log::debug!("Running pre-flight sanity checks...");

    let result = verify_environment(config);

    if !result.is_ok() {
        print_error_and_exit(&result);
    }

    log::info!("Pre-flight checks passed");
    result
}
