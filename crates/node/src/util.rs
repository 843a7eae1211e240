//! Utilities for config paths.
#![warn(missing_docs)]

use std::path::Path;
use std::path::PathBuf;

use crate::error::Error;
use crate::error::Result;

/// Expand path with "~" to absolute path.
pub fn expand_home<P>(path: P) -> Result<PathBuf>
where P: AsRef<Path> {
    let Ok(stripped) = path.as_ref().strip_prefix("~") else {
        return Ok(path.as_ref().to_path_buf());
    };

    let Some(mut p) = home::home_dir() else {
        return Err(Error::HomeDirError);
    };

    p.push(stripped);

    Ok(p)
}

/// Create parent directory of a path if not exists.
pub fn ensure_parent_dir<P>(path: P) -> Result<()>
where P: AsRef<Path> {
    let path = expand_home(path)?;
    let parent = path.parent().ok_or(Error::ParentDirError)?;
    if !parent.as_os_str().is_empty() && !parent.is_dir() {
        std::fs::create_dir_all(parent).map_err(Error::CreateFileError)?;
    };
    Ok(())
}
