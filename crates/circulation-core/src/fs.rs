//! Filesystem helpers for snapshot persistence.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{CirculationError, Result};

/// Write `data` to `path` atomically: a uniquely named temp file in the
/// same directory is written, synced, and renamed over the destination.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| CirculationError::Storage("Invalid library path".to_string()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CirculationError::Storage("Invalid library filename".to_string()))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| CirculationError::Storage(format!("System time error: {}", e)))?
        .as_nanos();
    let temp_path = parent.join(format!("{}.{}.tmp", filename, nanos));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| CirculationError::Storage(format!("Temp file create failed: {}", e)))?;
    file.write_all(data)
        .map_err(|e| CirculationError::Storage(format!("Temp file write failed: {}", e)))?;
    file.sync_all()
        .map_err(|e| CirculationError::Storage(format!("Temp file sync failed: {}", e)))?;

    if let Err(initial_err) = fs::rename(&temp_path, path) {
        // Some platforms refuse to rename over an existing file.
        let _ = fs::remove_file(path);
        fs::rename(&temp_path, path).map_err(|retry_err| {
            let _ = fs::remove_file(&temp_path);
            CirculationError::Storage(format!(
                "Atomic rename failed (initial: {}, retry: {})",
                initial_err, retry_err
            ))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_atomic_new_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("library.json");

        write_atomic(&dest, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "{}");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path() != dest)
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_atomic_overwrites_existing() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("library.json");

        fs::write(&dest, "old").unwrap();
        write_atomic(&dest, b"new").unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }
}
