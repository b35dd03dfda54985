//! Dependency Manifest Contracts
//!
//! This module defines the contract between the launcher and the Python
//! dependency manifest (`requirements.txt`), ensuring:
//! - The manifest is read and modeled before any installer runs
//! - The launcher validates manifest presence before execution
//! - Installation is always driven by the manifest, never by ad-hoc names
//!
//! # Design Principles
//!
//! 1. **Explicit Contracts**: The manifest is the single source of truth for
//!    what the entry point needs
//! 2. **Fail Fast**: A missing manifest is reported before pip is invoked
//! 3. **Permissive Parsing**: The parser accepts anything pip accepts and
//!    never panics on malformed input; unsupported lines are skipped
//!
//! # Manifest Format
//!
//! Standard pip requirements format:
//! ```text
//! # API server
//! fastapi>=0.104.0
//! uvicorn>=0.24.0
//! pydantic>=2.0          # request/response models
//! httpx>=0.25.0 ; python_version >= "3.8"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during manifest operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Dependency manifest not found: {path}")]
    NotFound { path: String },

    /// IO error reading the manifest
    #[error("Failed to read manifest: {reason}")]
    IoError { reason: String },
}

impl From<std::io::Error> for ManifestError {
    fn from(err: std::io::Error) -> Self {
        ManifestError::IoError {
            reason: err.to_string(),
        }
    }
}

/// One dependency declared by the manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    /// Distribution name as written (e.g., "fastapi")
    pub name: String,

    /// Version constraint, if any (e.g., ">=0.104.0")
    #[serde(default)]
    pub spec: Option<String>,
}

impl Requirement {
    /// Normalized distribution name per PEP 503: lowercase, with runs of
    /// `-`, `_`, `.` collapsed to a single `-`
    #[allow(dead_code)] // API: available to library consumers
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Normalize a distribution name per PEP 503
#[allow(dead_code)] // API: available to library consumers
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_sep = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !prev_sep {
                out.push('-');
            }
            prev_sep = true;
        } else {
            out.push(c.to_ascii_lowercase());
            prev_sep = false;
        }
    }
    out
}

/// Parsed dependency manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyManifest {
    /// Where the manifest was loaded from
    pub path: PathBuf,

    /// Requirements in declaration order
    pub requirements: Vec<Requirement>,
}

impl DependencyManifest {
    /// Load and parse a manifest file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            requirements: parse_requirements(&content),
        })
    }

    /// Number of declared requirements
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// True when the manifest declares nothing installable
    #[allow(dead_code)] // API: available to library consumers
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Declared distribution names, normalized
    #[allow(dead_code)] // API: available to library consumers
    pub fn names(&self) -> Vec<String> {
        self.requirements
            .iter()
            .map(Requirement::normalized_name)
            .collect()
    }

    /// Check whether a distribution is declared (PEP 503 comparison)
    #[allow(dead_code)] // API: available to library consumers
    pub fn declares(&self, name: &str) -> bool {
        let wanted = normalize_name(name);
        self.requirements
            .iter()
            .any(|r| r.normalized_name() == wanted)
    }
}

/// Parse requirements content into a list of requirements.
///
/// Skipped (with a debug log): blank lines, `#` comments, option lines
/// (`-r`, `-e`, `--index-url`, ...), and line continuations. Environment
/// markers (`; python_version >= "3.8"`) and extras (`name[extra]`) are
/// stripped from the parsed name.
pub fn parse_requirements(content: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();

    for raw_line in content.lines() {
        let mut line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Option lines are pip's concern, not a dependency declaration
        if line.starts_with('-') {
            log::debug!("Skipping manifest option line: {}", line);
            continue;
        }

        // Trailing backslash continuations only appear on option lines in
        // practice; treat the fragment as unparseable and move on
        if line.ends_with('\\') {
            log::debug!("Skipping continued manifest line: {}", line);
            continue;
        }

        // Inline comment: whitespace followed by '#'
        if let Some(pos) = line.find(" #") {
            line = line[..pos].trim_end();
        }

        // Environment marker
        if let Some(pos) = line.find(';') {
            line = line[..pos].trim_end();
        }

        if line.is_empty() {
            continue;
        }

        // Name runs until the first extras bracket or version-comparison char
        let name_end = line
            .find(|c: char| matches!(c, '[' | '<' | '>' | '=' | '!' | '~' | ' ' | '\t'))
            .unwrap_or(line.len());
        let name = line[..name_end].trim();
        if name.is_empty() {
            log::debug!("Skipping unparseable manifest line: {}", raw_line);
            continue;
        }

        // Everything after the name (minus an extras bracket) is the spec
        let mut rest = line[name_end..].trim();
        if rest.starts_with('[') {
            match rest.find(']') {
                Some(close) => rest = rest[close + 1..].trim(),
                None => rest = "",
            }
        }

        requirements.push(Requirement {
            name: name.to_string(),
            spec: if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            },
        });
    }

    requirements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let reqs = parse_requirements("fastapi>=0.104.0\nuvicorn>=0.24.0\npydantic>=2.0\n");
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].name, "fastapi");
        assert_eq!(reqs[0].spec.as_deref(), Some(">=0.104.0"));
        assert_eq!(reqs[2].name, "pydantic");
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let reqs = parse_requirements("# API server\n\nfastapi\n   \n# done\n");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].name, "fastapi");
        assert_eq!(reqs[0].spec, None);
    }

    #[test]
    fn test_parse_skips_option_lines() {
        let reqs = parse_requirements("-r base.txt\n--index-url https://example.invalid\nhttpx\n");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].name, "httpx");
    }

    #[test]
    fn test_parse_inline_comment_and_marker() {
        let reqs = parse_requirements(
            "pydantic>=2.0          # request/response models\nhttpx>=0.25.0 ; python_version >= \"3.8\"\n",
        );
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].spec.as_deref(), Some(">=2.0"));
        assert_eq!(reqs[1].name, "httpx");
        assert_eq!(reqs[1].spec.as_deref(), Some(">=0.25.0"));
    }

    #[test]
    fn test_parse_extras() {
        let reqs = parse_requirements("uvicorn[standard]>=0.24.0\n");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].name, "uvicorn");
        assert_eq!(reqs[0].spec.as_deref(), Some(">=0.24.0"));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Python_Multipart"), "python-multipart");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("a--b__c"), "a-b-c");
    }

    #[test]
    fn test_declares() {
        let manifest = DependencyManifest {
            path: PathBuf::from("requirements.txt"),
            requirements: parse_requirements("python_multipart>=0.0.6\n"),
        };
        assert!(manifest.declares("Python-Multipart"));
        assert!(!manifest.declares("fastapi"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = DependencyManifest::load("/nonexistent/requirements.txt").unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }
}
