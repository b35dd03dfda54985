//! Entry-point hand-off
//!
//! The last stage of a launch: resolve where the Python application lives,
//! make sure its dependencies are in place, emit the startup banner, and
//! replace this process image with the interpreter running the entry point.
//! After the exec there is no launcher process left; the API owns the PID.

use crate::config_file::LaunchConfig;
use crate::dry_run::is_dry_run;
use crate::error::{LauncherError, Result};
use crate::installer;
use crate::interpreter::PythonInterpreter;
use crate::manifest::DependencyManifest;
use crate::sanity::{self, SanityCheckResult};
use crate::types::CheckState;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Server settings the entry point will bind with, derived from the same
/// environment variables `api/run_api.py` reads. The launcher only uses them
/// for the banner and for failing fast on values the API would reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub reload: bool,
}

impl ServerSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var("API_HOST").ok().as_deref(),
            std::env::var("API_PORT").ok().as_deref(),
            std::env::var("API_RELOAD").ok().as_deref(),
        )
    }

    /// Build settings from raw variable values (injectable for tests)
    pub fn from_vars(
        host: Option<&str>,
        port: Option<&str>,
        reload: Option<&str>,
    ) -> Result<Self> {
        let host = match host {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => "0.0.0.0".to_string(),
        };

        let port = match port {
            Some(p) if !p.is_empty() => {
                let port: u16 = p.parse().map_err(|_| {
                    LauncherError::config(format!("API_PORT is not a valid port number: {:?}", p))
                })?;
                // Unprivileged range only, same rule the API config enforces
                if port < 1024 {
                    return Err(LauncherError::config(format!(
                        "API_PORT must be between 1024 and 65535: {}",
                        port
                    )));
                }
                port
            }
            _ => 8000,
        };

        let reload = reload
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self { host, port, reload })
    }

    /// Print the startup banner the operators expect to see
    pub fn print_banner(&self) {
        println!("Starting Deep Research Agent API...");
        println!("Address: http://{}:{}", self.host, self.port);
        println!("Docs:    http://{}:{}/docs", self.host, self.port);
        println!("Reload:  {}", if self.reload { "on" } else { "off" });
    }
}

/// Resolve the application root directory.
///
/// Priority: CLI flag, then config file, then the directory containing the
/// launcher executable itself, so a bare invocation works from any caller
/// directory.
pub fn resolve_app_root(cli_root: Option<&Path>, config: &LaunchConfig) -> Result<PathBuf> {
    if let Some(root) = cli_root {
        return Ok(root.to_path_buf());
    }
    if let Some(root) = &config.app_root {
        return Ok(root.clone());
    }

    let exe = std::env::current_exe()
        .map_err(|e| LauncherError::launch(format!("Cannot locate launcher executable: {}", e)))?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| LauncherError::launch("Launcher executable has no parent directory"))
}

/// Resolve a config-relative path against the app root
fn resolve_under_root(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Bring the entry point's dependencies in line with the manifest.
///
/// `auto` installs only when probes failed, `always` installs every time,
/// `never` warns and proceeds. A pip failure is fatal; modules still missing
/// after a real (non-dry-run) install are fatal too, because the entry point
/// would only die later with a worse message.
pub fn ensure_dependencies(
    python: &PythonInterpreter,
    config: &LaunchConfig,
    app_root: &Path,
    missing_modules: &[String],
) -> Result<()> {
    let needs_install = match config.install {
        mode if mode.is_unconditional() => true,
        mode if !mode.allows_install() => {
            if !missing_modules.is_empty() {
                log::warn!(
                    "Modules not importable but install mode is 'never': {}",
                    missing_modules.join(", ")
                );
            }
            return Ok(());
        }
        _ => !missing_modules.is_empty(),
    };

    if !needs_install {
        log::debug!("All probed modules importable, skipping installation");
        return Ok(());
    }

    if !missing_modules.is_empty() {
        log::info!(
            "Modules not importable: {}; installing from manifest",
            missing_modules.join(", ")
        );
    }

    let manifest_path = resolve_under_root(app_root, &config.requirements);
    let manifest = DependencyManifest::load(&manifest_path)?;

    let output = installer::install_requirements(python, &manifest)
        .map_err(|e| LauncherError::install(e.to_string()))?;

    if !output.success {
        return Err(LauncherError::install(format!(
            "pip exited with code {}",
            output.exit_code.unwrap_or(-1)
        )));
    }

    // A dry-run skipped pip, so re-probing would only repeat the bad news
    if output.dry_run {
        return Ok(());
    }

    let still_missing: Vec<String> = missing_modules
        .iter()
        .filter(|m| !python.probe_module(m).is_importable())
        .cloned()
        .collect();

    if !still_missing.is_empty() {
        return Err(LauncherError::probe(format!(
            "modules still not importable after installation: {}",
            still_missing.join(", ")
        )));
    }

    Ok(())
}

/// Replace this process with the interpreter running the entry point.
///
/// The child's working directory is pinned to the app root regardless of the
/// caller's current directory, and the entry point is passed relative to it.
pub fn hand_off(python: &PythonInterpreter, config: &LaunchConfig, app_root: &Path) -> Result<()> {
    let entry_abs = resolve_under_root(app_root, &config.entry_point);
    if !entry_abs.exists() {
        return Err(LauncherError::launch(format!(
            "Entry point not found: {}",
            entry_abs.display()
        )));
    }

    let settings = ServerSettings::from_env()?;
    settings.print_banner();

    if is_dry_run() {
        log::info!(
            "Dry-run: would exec {} {} in {}",
            python.path.display(),
            config.entry_point.display(),
            app_root.display()
        );
        return Ok(());
    }

    log::info!(
        "Handing off to {} {} in {}",
        python.path.display(),
        config.entry_point.display(),
        app_root.display()
    );

    let mut cmd = Command::new(&python.path);
    cmd.arg(&config.entry_point).current_dir(app_root);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // exec only returns on failure
        let err = cmd.exec();
        Err(LauncherError::launch(format!(
            "Failed to exec entry point: {}",
            err
        )))
    }

    #[cfg(not(unix))]
    {
        // No process-image replacement available: run the entry point as a
        // child and propagate its exit code
        let status = cmd
            .status()
            .map_err(|e| LauncherError::launch(format!("Failed to run entry point: {}", e)))?;
        std::process::exit(status.code().unwrap_or(1));
    }
}

/// Full launch sequence: preflight, dependency repair, env warnings, hand-off
pub fn launch(config: &LaunchConfig, cli_root: Option<&Path>) -> Result<()> {
    let result = sanity::run_preflight_checks(config);
    let python = result
        .interpreter
        .clone()
        .ok_or_else(|| LauncherError::general("interpreter unavailable after preflight"))?;

    let app_root = resolve_app_root(cli_root, config)?;
    log::debug!("Application root: {}", app_root.display());

    ensure_dependencies(&python, config, &app_root, &result.missing_modules())?;
    sanity::warn_missing_env(&result);
    hand_off(&python, config, &app_root)
}

/// Diagnostic report for the `check` subcommand.
///
/// Prints one line per check and returns the process exit code: 1 when any
/// fatal issue was found, 0 otherwise.
pub fn run_check(config: &LaunchConfig, cli_root: Option<&Path>) -> Result<i32> {
    let mut issues = 0usize;
    let mut warnings = 0usize;

    let mut report = |state: CheckState, line: String| {
        println!("  {} {}", state.glyph(), line);
        match state {
            CheckState::Fail => issues += 1,
            CheckState::Warn => warnings += 1,
            CheckState::Ok => {}
        }
    };

    println!("Deep Research Agent API launcher - environment check\n");

    let result: SanityCheckResult = sanity::verify_environment(config);

    match &result.interpreter {
        Some(interp) => report(
            CheckState::Ok,
            format!("Python {} at {}", interp.version, interp.path.display()),
        ),
        None => report(
            CheckState::Fail,
            "No Python 3 interpreter on PATH".to_string(),
        ),
    }

    for (module, outcome) in &result.module_probes {
        if outcome.is_importable() {
            report(CheckState::Ok, format!("module {}", module));
        } else if config.install.allows_install() {
            report(
                CheckState::Warn,
                format!("module {} not importable (will install from manifest)", module),
            );
        } else {
            report(
                CheckState::Fail,
                format!("module {} not importable and install mode is 'never'", module),
            );
        }
    }

    // Paths are only meaningful when we can resolve a root
    match resolve_app_root(cli_root, config) {
        Ok(app_root) => {
            let manifest_path = resolve_under_root(&app_root, &config.requirements);
            match DependencyManifest::load(&manifest_path) {
                Ok(manifest) => report(
                    CheckState::Ok,
                    format!(
                        "manifest {} ({} requirement(s))",
                        manifest_path.display(),
                        manifest.len()
                    ),
                ),
                Err(e) => report(CheckState::Fail, e.to_string()),
            }

            let entry_abs = resolve_under_root(&app_root, &config.entry_point);
            if entry_abs.exists() {
                report(CheckState::Ok, format!("entry point {}", entry_abs.display()));
            } else {
                report(
                    CheckState::Fail,
                    format!("entry point not found: {}", entry_abs.display()),
                );
            }
        }
        Err(e) => report(CheckState::Fail, e.to_string()),
    }

    match ServerSettings::from_env() {
        Ok(settings) => report(
            CheckState::Ok,
            format!("server settings http://{}:{}", settings.host, settings.port),
        ),
        Err(e) => report(CheckState::Fail, e.to_string()),
    }

    for spec in &result.missing_required_env {
        report(
            CheckState::Warn,
            format!("{} not set ({})", spec.name, spec.description),
        );
    }
    for spec in &result.missing_optional_env {
        report(
            CheckState::Ok,
            format!("{} not set (optional: {})", spec.name, spec.description),
        );
    }

    println!();
    if issues == 0 && warnings == 0 {
        println!("All checks passed.");
    } else {
        if issues > 0 {
            println!("{} issue(s) must be fixed before launching.", issues);
        }
        if warnings > 0 {
            println!("{} warning(s); launch will proceed anyway.", warnings);
        }
    }

    Ok(if issues > 0 { 1 } else { 0 })
}
