//! Write-rename file replacement.
//!
//! Content goes to `{path}.tmp` first, is synced to disk and then renamed over
//! the final path, so readers never observe a half-written file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Atomically replaces `path` with whatever `write` produces.
///
/// On failure the temporary file is removed and `path` is left untouched.
pub(crate) fn atomic_write<F>(path: &Path, write: F) -> std::io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path);
    let result = write_and_sync(&tmp_path, write).and_then(|()| fs::rename(&tmp_path, path));

    if result.is_err() {
        // best effort, the original error is what matters
        let _ = fs::remove_file(&tmp_path);
    } else {
        debug!("Wrote {}", path.display());
    }
    result
}

fn write_and_sync<F>(tmp_path: &Path, write: F) -> std::io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let mut writer = BufWriter::new(File::create(tmp_path)?);
    write(&mut writer)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/out.bin");

        atomic_write(&path, |w| w.write_all(b"hello")).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn replaces_existing_file_and_stale_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, b"old").unwrap();
        fs::write(temp_path(&path), b"partial garbage").unwrap();

        atomic_write(&path, |w| w.write_all(b"new")).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn failed_write_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, b"original").unwrap();

        let result = atomic_write(&path, |w| {
            w.write_all(b"half")?;
            Err(std::io::Error::other("disk on fire"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"original");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(
            temp_path(Path::new("/data/matrix.npy")),
            PathBuf::from("/data/matrix.npy.tmp")
        );
    }
}
