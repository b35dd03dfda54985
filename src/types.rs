//! Type-safe launcher types
//!
//! This module replaces stringly-typed launcher settings with proper Rust enums
//! that provide compile-time validation and exhaustive matching.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Dependency installation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Install from the manifest only when an import probe fails
    #[default]
    #[strum(serialize = "auto")]
    Auto,
    /// Always install from the manifest before launching
    #[strum(serialize = "always")]
    Always,
    /// Never install; log a warning when probes fail
    #[strum(serialize = "never")]
    Never,
}

#[allow(dead_code)] // Methods available for future use
impl InstallMode {
    /// Check if this mode may invoke the package installer at all
    pub fn allows_install(&self) -> bool {
        !matches!(self, Self::Never)
    }

    /// Check if this mode installs regardless of probe results
    pub fn is_unconditional(&self) -> bool {
        matches!(self, Self::Always)
    }
}

/// Outcome of a single module import probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    /// The module imported cleanly
    #[strum(serialize = "importable")]
    Importable,
    /// The interpreter exited non-zero (module absent or broken)
    #[strum(serialize = "missing")]
    Missing,
    /// The probe process itself could not be spawned or waited on
    #[strum(serialize = "failed")]
    Failed,
}

impl ProbeOutcome {
    /// Check if the module is usable by the entry point
    pub fn is_importable(&self) -> bool {
        matches!(self, Self::Importable)
    }
}

/// Severity of a single preflight check line in the `check` report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Display, EnumString, EnumIter)]
pub enum CheckState {
    /// Check passed
    #[strum(serialize = "ok")]
    Ok,
    /// Non-fatal problem; launch continues
    #[strum(serialize = "warn")]
    Warn,
    /// Fatal problem; launch must not proceed
    #[strum(serialize = "fail")]
    Fail,
}

impl CheckState {
    /// Glyph used in the human-readable report
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::Warn => "⚠",
            Self::Fail => "✗",
        }
    }

    /// Check if this state blocks the launch
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fail)
    }
}
