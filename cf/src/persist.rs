//! Whole-file atomic writes
//!
//! Content is written to a temporary file beside the destination and renamed
//! over it, so readers see either the previous file or the complete new one.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

/// Replace `path` with `bytes` in one rename
pub fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    debug!(?path, len = bytes.len(), "write_atomically: called");
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
