use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Represents errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// Wrapper for standard IO errors.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Error for empty path input.
    #[error("Path is empty")]
    EmptyPath,
    /// Error when the home directory cannot be determined.
    #[error("Home directory not found")]
    HomeDirNotFound,
    /// Error for unsupported user expansion in paths (e.g., ~user).
    #[error("User expansion (~user) not supported")]
    UserExpansionNotSupported,
}

/// Checks if a directory exists at the given path.
///
/// # Arguments
///
/// * `dir` - Path to check.
///
/// # Returns
///
/// `true` if the directory exists, `false` otherwise.
pub fn dir_exists<P: AsRef<Path>>(dir: P) -> bool {
    dir.as_ref().is_dir()
}

/// Checks if a file exists at the given path.
///
/// # Arguments
///
/// * `file` - Path to check.
///
/// # Returns
///
/// `true` if the file exists, `false` otherwise.
pub fn file_exists<P: AsRef<Path>>(file: P) -> bool {
    file.as_ref().is_file()
}

/// Reads the contents of a file into a string.
///
/// # Errors
///
/// Returns `FilesystemError` if the file cannot be read.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String, FilesystemError> {
    Ok(fs::read_to_string(path)?)
}

/// Lists the immediate entries of a directory, sorted by file name.
///
/// Directory enumeration order is platform dependent, so entries are sorted
/// to keep anything built from the listing deterministic.
///
/// # Arguments
///
/// * `dir` - Directory to list.
///
/// # Errors
///
/// Returns `FilesystemError` if the directory or one of its entries cannot be read.
pub fn sorted_entries<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, FilesystemError> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, io::Error>>()?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

/// Returns the last modification time of a path.
///
/// # Errors
///
/// Returns `FilesystemError` if the path cannot be stat'ed or the platform
/// does not report modification times.
pub fn modified_time<P: AsRef<Path>>(path: P) -> Result<DateTime<Utc>, FilesystemError> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified))
}

/// Expands a path that starts with `~` to the user's home directory.
///
/// # Arguments
///
/// * `path` - Path string, possibly starting with `~`.
///
/// # Errors
///
/// Returns `FilesystemError` when the path is empty, the home directory is
/// unknown, or the path uses `~user` syntax.
pub fn expand_home(path: &str) -> Result<PathBuf, FilesystemError> {
    if path.is_empty() {
        return Err(FilesystemError::EmptyPath);
    }
    if !path.starts_with('~') {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or(FilesystemError::HomeDirNotFound)?;
    if path == "~" {
        return Ok(home);
    }
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        return Ok(home.join(rest));
    }
    Err(FilesystemError::UserExpansionNotSupported)
}
