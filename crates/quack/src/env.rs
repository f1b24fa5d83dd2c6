//! `.env` discovery.
//!
//! Candidate files are probed in a fixed order and only the first one that
//! exists is loaded. Variables already set in the process environment are
//! never overridden.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Candidate `.env` locations, in probe order.
pub fn candidate_env_files(exe_dir: Option<&Path>, cwd: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = exe_dir {
        candidates.push(dir.join("..").join("..").join(".env"));
        candidates.push(dir.join("..").join("..").join("..").join(".env"));
    }
    if let Some(dir) = cwd {
        candidates.push(dir.join(".env"));
    }
    candidates
}

/// The first candidate that exists on disk.
pub fn first_existing(candidates: &[PathBuf]) -> Option<&PathBuf> {
    candidates.iter().find(|p| p.is_file())
}

/// Probe the default locations and load the first `.env` found.
///
/// Returns the path that was loaded, if any.
pub fn load_env_file() -> Option<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().ok();
    let candidates = candidate_env_files(exe_dir.as_deref(), cwd.as_deref());

    let path = first_existing(&candidates)?.clone();
    match dotenvy::from_path(&path) {
        Ok(()) => {
            debug!(path = %path.display(), "Loaded environment file");
            Some(path)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load environment file");
            None
        }
    }
}
