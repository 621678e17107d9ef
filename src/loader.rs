use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::session::SessionRecord;

/// Environment fallback naming the session file or directory to analyze,
/// set by the recording harness.
pub const INPUT_ENV: &str = "LAGSCOPE_FILE";

/// Resolves the input path: an explicit argument wins, then the recorder's
/// environment variable.
pub fn resolve_input(arg: Option<PathBuf>) -> Option<PathBuf> {
    arg.or_else(|| std::env::var(INPUT_ENV).ok().map(PathBuf::from))
}

/// Expands the input path into the list of session files to analyze.
///
/// A file is taken as-is; a directory contributes every `*.json` directly
/// inside it, sorted by name so runs are reproducible.
pub fn collect_session_files(path: &Path) -> io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if path.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        return Ok(files);
    }
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("no session file or directory at {}", path.display()),
    ))
}

/// Parses one complete session log.
pub fn load_record(path: &Path) -> io::Result<SessionRecord> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {}", path.display(), e),
        )
    })
}
