//! Atomic file writes.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// Writes to a temp file in the same directory, then renames over the target,
/// so readers see either the old or the new file, never a partial one.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let json = serde_json::to_vec_pretty(value)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
