//! Working copy of the base database.
//!
//! The server never opens the base file for writing. All tools operate on a
//! copy inside the working directory, refreshed from the base on every start
//! unless persistence is requested.

use crate::error::{DbError, DbResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the working copy inside the working directory.
pub const WORKING_FILE_NAME: &str = "chinook.work.sqlite";

/// Side files SQLite keeps next to a WAL-mode database.
const SIDE_FILE_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    pub base: PathBuf,
    pub path: PathBuf,
    /// True if the copy was (re)created from the base on this start
    pub refreshed: bool,
}

impl WorkingCopy {
    /// Size of the working copy on disk, in bytes.
    pub fn size_bytes(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

/// Make sure a usable working copy exists and return where it is.
///
/// When `persist` is false, or no copy exists yet, the base file is copied
/// over the working file and any `-wal`/`-shm` left by a previous run is
/// removed so it cannot be replayed onto the fresh copy.
pub fn ensure_working_copy(
    base: impl AsRef<Path>,
    working_dir: impl AsRef<Path>,
    persist: bool,
) -> DbResult<WorkingCopy> {
    let base = base.as_ref();
    let working_dir = working_dir.as_ref();

    if !base.is_file() {
        return Err(DbError::config(format!(
            "Base database not found at {}",
            base.display()
        )));
    }
    std::fs::create_dir_all(working_dir).map_err(|e| DbError::io(working_dir, e))?;

    let path = working_dir.join(WORKING_FILE_NAME);
    let refreshed = !persist || !path.exists();

    if refreshed {
        remove_side_files(&path)?;
        std::fs::copy(base, &path).map_err(|e| DbError::io(&path, e))?;
        info!(
            base = %base.display(),
            working = %path.display(),
            "Working copy refreshed from base"
        );
    } else {
        debug!(working = %path.display(), "Reusing persisted working copy");
    }

    Ok(WorkingCopy {
        base: base.to_path_buf(),
        path,
        refreshed,
    })
}

fn side_file(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_side_files(path: &Path) -> DbResult<()> {
    for suffix in SIDE_FILE_SUFFIXES {
        let side = side_file(path, suffix);
        match std::fs::remove_file(&side) {
            Ok(()) => debug!(file = %side.display(), "Removed stale side file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(DbError::io(&side, e)),
        }
    }
    Ok(())
}
