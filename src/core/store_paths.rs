//! Purpose: Shared data-directory and database-name path resolution helpers.
//! Exports: `default_data_dir` and `resolve_named_db_path`.
//! Role: Keep CLI and store path semantics aligned from one source.
//! Invariants: Default data directory remains `~/.celerite/stores`.
//! Invariants: Database names must not contain path separators.

use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind};

pub fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".celerite").join("stores")
}

pub fn resolve_named_db_path(name: &str, data_dir: &Path) -> Result<PathBuf, Error> {
    if name.contains('/') {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("database name must not contain path separators"));
    }
    if name.ends_with(".redb") {
        return Ok(data_dir.join(name));
    }
    Ok(data_dir.join(format!("{name}.redb")))
}
