//! Dependency Installation
//!
//! This module provides the ONLY sanctioned way to install Python
//! dependencies. All installation MUST go through `install_requirements` to
//! ensure:
//!
//! - Process group isolation (death pact compliance)
//! - Proper PID registration for cleanup
//! - Installation pinned to the interpreter that passed discovery
//!
//! # Architecture Rule
//!
//! pip is always invoked as `<python> -m pip`, never as a bare `pip` binary.
//! A bare `pip` on PATH can belong to a different interpreter than the one
//! that will run the entry point, which makes a passing install useless.

use crate::dry_run::is_dry_run;
use crate::interpreter::PythonInterpreter;
use crate::manifest::DependencyManifest;
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use anyhow::{Context, Result};
use log::info;
use std::process::{Command, Stdio};

/// Output from a dependency installation run.
#[derive(Debug, Clone)]
pub struct InstallOutput {
    /// Standard output from pip.
    pub stdout: String,
    /// Standard error from pip.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether pip exited successfully (exit code 0).
    pub success: bool,
    /// Whether the run was skipped due to dry-run mode.
    pub dry_run: bool,
}

impl InstallOutput {
    /// Placeholder output for a skipped dry-run installation
    fn skipped() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
            dry_run: true,
        }
    }
}

/// Install the manifest's dependencies with the discovered interpreter.
///
/// # Death Pact Compliance
///
/// - Spawns pip in a new process group via `.in_new_process_group()`
/// - Registers the child PID with `ChildRegistry::global()`
/// - Ensures cleanup if the parent process exits
///
/// # Returns
///
/// - `Ok(output)` - pip ran to completion (inspect `success` for its verdict)
/// - `Err` - pip could not be spawned or waited on
pub fn install_requirements(
    python: &PythonInterpreter,
    manifest: &DependencyManifest,
) -> Result<InstallOutput> {
    // Log exact command for transparency
    info!(
        "install_requirements: {} -m pip install -r {} ({} requirement(s))",
        python.path.display(),
        manifest.path.display(),
        manifest.len()
    );

    if is_dry_run() {
        info!("Dry-run: skipping dependency installation");
        return Ok(InstallOutput::skipped());
    }

    // Build command with process group isolation
    let mut cmd = Command::new(&python.path);
    cmd.arg("-m")
        .arg("pip")
        .arg("install")
        .arg("-r")
        .arg(&manifest.path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .in_new_process_group(); // CRITICAL: Enables death pact

    // Spawn and register with global registry
    let child = cmd.spawn().with_context(|| {
        format!(
            "Failed to spawn pip with interpreter {}",
            python.path.display()
        )
    })?;
    let pid = child.id();

    // Register PID for cleanup on parent exit
    {
        let registry = ChildRegistry::global();
        // Lock is held briefly, panic is acceptable if poisoned
        let mut guard = registry.lock().expect("ChildRegistry mutex poisoned");
        guard.register(pid);
    }

    // Wait for completion
    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed waiting for pip ({})", manifest.path.display()))?;

    // Unregister PID after completion
    {
        let registry = ChildRegistry::global();
        let mut guard = registry.lock().expect("ChildRegistry mutex poisoned");
        guard.unregister(pid);
    }

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code();

    if output.status.success() {
        // Route installer output through the logging system, the same
        // visibility rule the rest of the launcher follows
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!("pip: {}", line);
        }
        info!("Dependency installation completed successfully");
        Ok(InstallOutput {
            stdout,
            stderr,
            exit_code,
            success: true,
            dry_run: false,
        })
    } else {
        let code = exit_code.unwrap_or(-1);
        log::warn!("Dependency installation failed with exit code {}", code);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::warn!("pip: {}", line);
        }
        Ok(InstallOutput {
            stdout,
            stderr,
            exit_code,
            success: false,
            dry_run: false,
        })
    }
}
