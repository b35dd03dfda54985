//! Python interpreter discovery and import probing
//!
//! The launcher delegates everything interesting to a Python entry point, so
//! the first preflight question is always "is there a Python 3 on PATH, and
//! which one". Discovery prefers `python3` and accepts a bare `python` only
//! when it reports major version 3.

use crate::error::{LauncherError, Result};
use crate::process_guard::CommandProcessGroup;
use crate::types::ProbeOutcome;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Interpreter names tried in order during discovery
const CANDIDATE_BINARIES: &[&str] = &["python3", "python"];

/// Parsed interpreter version (e.g., 3.11.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A discovered Python interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonInterpreter {
    /// Absolute path to the interpreter binary
    pub path: PathBuf,
    /// Version reported by `--version`
    pub version: PythonVersion,
}

impl PythonInterpreter {
    /// Discover a Python 3 interpreter on the current PATH.
    ///
    /// With `explicit` set (CLI flag or config), only that binary is
    /// considered and a non-Python-3 answer is an error rather than a
    /// fallthrough.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_binary(path),
            None => {
                let path_var = std::env::var_os("PATH").unwrap_or_default();
                Self::discover_in(&path_var)
            }
        }
    }

    /// Discovery against an explicit PATH value (injectable for tests)
    pub fn discover_in(path_var: &std::ffi::OsStr) -> Result<Self> {
        for candidate in CANDIDATE_BINARIES {
            let Some(binary) = resolve_binary(candidate, path_var) else {
                log::debug!("Interpreter candidate not on PATH: {}", candidate);
                continue;
            };

            match query_version(&binary) {
                Some(version) if version.major == 3 => {
                    log::info!("Using interpreter {} ({})", binary.display(), version);
                    return Ok(Self {
                        path: binary,
                        version,
                    });
                }
                Some(version) => {
                    // A Python 2 `python` does not satisfy the contract
                    log::debug!(
                        "Rejecting interpreter {} (version {})",
                        binary.display(),
                        version
                    );
                }
                None => {
                    log::debug!(
                        "Interpreter {} did not report a parseable version",
                        binary.display()
                    );
                }
            }
        }

        Err(LauncherError::interpreter(
            "no Python 3 interpreter found on PATH (tried: python3, python)",
        ))
    }

    /// Build an interpreter from a user-specified binary
    fn from_binary(path: &Path) -> Result<Self> {
        let version = query_version(path).ok_or_else(|| {
            LauncherError::interpreter(format!(
                "{} is not a working Python interpreter",
                path.display()
            ))
        })?;

        if version.major != 3 {
            return Err(LauncherError::interpreter(format!(
                "{} reports Python {}, but Python 3 is required",
                path.display(),
                version
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            version,
        })
    }

    /// Probe whether a module is importable by this interpreter.
    ///
    /// Runs `<python> -c "import <module>"` in its own process group and maps
    /// the exit status to a `ProbeOutcome`. Never fails the caller: a probe
    /// that cannot even spawn is reported as `Failed`.
    pub fn probe_module(&self, module: &str) -> ProbeOutcome {
        let output = Command::new(&self.path)
            .arg("-c")
            .arg(format!("import {}", module))
            .in_new_process_group()
            .output();

        match output {
            Ok(output) if output.status.success() => {
                log::debug!("Module importable: {}", module);
                ProbeOutcome::Importable
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                log::debug!(
                    "Module not importable: {} (exit {:?}): {}",
                    module,
                    output.status.code(),
                    stderr.trim()
                );
                ProbeOutcome::Missing
            }
            Err(e) => {
                log::warn!("Import probe for {} failed to run: {}", module, e);
                ProbeOutcome::Failed
            }
        }
    }

    /// Probe a list of modules, preserving order
    pub fn probe_modules(&self, modules: &[String]) -> Vec<(String, ProbeOutcome)> {
        modules
            .iter()
            .map(|m| (m.clone(), self.probe_module(m)))
            .collect()
    }
}

/// Find an executable by name on the given PATH value.
///
/// Walks PATH entries checking for a regular file with an execute bit, the
/// same answer `which` would give without spawning a child for it.
pub fn resolve_binary(name: &str, path_var: &std::ffi::OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(path_var) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_executable_file(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Check for a regular file with any execute bit set
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

/// Ask a binary for its version and parse the `Python X.Y.Z` answer.
///
/// Python 2 prints the banner to stderr, Python 3 to stdout; both streams
/// are consulted so a 2.x interpreter is recognized (and then rejected).
fn query_version(binary: &Path) -> Option<PythonVersion> {
    let output = Command::new(binary)
        .arg("--version")
        .in_new_process_group()
        .output()
        .ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    parse_version(&stdout).or_else(|| parse_version(&stderr))
}

/// Parse a `Python X.Y.Z` banner into a version triple
pub fn parse_version(text: &str) -> Option<PythonVersion> {
    let rest = text.trim().strip_prefix("Python")?.trim_start();
    let token = rest.split_whitespace().next()?;

    let mut parts = token.split('.');
    let major = parse_component(parts.next()?)?;
    let minor = parse_component(parts.next().unwrap_or("0"))?;
    let patch = parse_component(parts.next().unwrap_or("0"))?;

    Some(PythonVersion {
        major,
        minor,
        patch,
    })
}

/// Parse one version component, tolerating suffixes like `4+` or `0rc1`
fn parse_component(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
