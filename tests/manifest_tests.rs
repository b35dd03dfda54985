//! Tests for dependency manifest loading and parsing
//!
//! These tests verify:
//! - Loading real manifest files from disk
//! - The requirement lines pip accepts are modeled correctly
//! - Missing-manifest reporting

use dra_launcher::manifest::{parse_requirements, DependencyManifest, ManifestError};

const STOCK_MANIFEST: &str = "\
# Deep Research Agent API dependencies
fastapi>=0.104.0
uvicorn>=0.24.0
pydantic>=2.0
httpx>=0.25.0
python-multipart>=0.0.6
";

#[test]
fn test_load_stock_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requirements.txt");
    std::fs::write(&path, STOCK_MANIFEST).unwrap();

    let manifest = DependencyManifest::load(&path).unwrap();
    assert_eq!(manifest.len(), 5);
    assert_eq!(manifest.path, path);
    assert!(manifest.declares("fastapi"));
    assert!(manifest.declares("python_multipart"));
    assert!(!manifest.declares("flask"));
}

#[test]
fn test_load_missing_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requirements.txt");

    let err = DependencyManifest::load(&path).unwrap_err();
    match err {
        ManifestError::NotFound { path: reported } => {
            assert!(reported.contains("requirements.txt"));
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_load_empty_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requirements.txt");
    std::fs::write(&path, "# nothing yet\n\n").unwrap();

    let manifest = DependencyManifest::load(&path).unwrap();
    assert!(manifest.is_empty());
    assert_eq!(manifest.names(), Vec::<String>::new());
}

#[test]
fn test_parse_pinned_and_unpinned() {
    let reqs = parse_requirements("requests==2.31.0\nrich\n");
    assert_eq!(reqs[0].name, "requests");
    assert_eq!(reqs[0].spec.as_deref(), Some("==2.31.0"));
    assert_eq!(reqs[1].name, "rich");
    assert_eq!(reqs[1].spec, None);
}

#[test]
fn test_parse_compound_constraints() {
    let reqs = parse_requirements("uvicorn>=0.24.0,<0.30\n");
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].name, "uvicorn");
    assert_eq!(reqs[0].spec.as_deref(), Some(">=0.24.0,<0.30"));
}

#[test]
fn test_parse_whitespace_around_constraint() {
    let reqs = parse_requirements("fastapi >= 0.104.0\n");
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].name, "fastapi");
    assert_eq!(reqs[0].spec.as_deref(), Some(">= 0.104.0"));
}

#[test]
fn test_parse_mixed_noise() {
    let content = "\
# comment
-r other.txt
--extra-index-url https://example.invalid/simple

fastapi>=0.104.0   # the server
uvicorn[standard]>=0.24.0
httpx ; python_version >= \"3.8\"
";
    let reqs = parse_requirements(content);
    let names: Vec<&str> = reqs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["fastapi", "uvicorn", "httpx"]);
}
