use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use super::{ObjectInfo, ObjectStore, not_found};
use crate::config::Settings;
use crate::error::{DatasetError, DatasetResult};

/// Local-filesystem [`ObjectStore`]: `<root>/<bucket>/<key>`.
///
/// Keys may contain `/` (stored as subdirectories). Puts write a temp file next to the
/// destination and rename it into place.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at [`Settings::storage_root`].
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.storage_root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> DatasetResult<PathBuf> {
        check_relative(bucket, "bucket")?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> DatasetResult<PathBuf> {
        check_relative(key, "key")?;
        Ok(self.bucket_dir(bucket)?.join(key))
    }
}

fn check_relative(name: &str, what: &str) -> DatasetResult<()> {
    let path = Path::new(name);
    let ok = !name.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(DatasetError::storage(format!("invalid object {what} '{name}'")))
    }
}

fn io_err(path: &Path, e: std::io::Error) -> DatasetError {
    DatasetError::storage(format!("{}: {e}", path.display()))
}

impl ObjectStore for FsObjectStore {
    fn get(&self, bucket: &str, key: &str) -> DatasetResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        if !path.is_file() {
            return Err(not_found(bucket, key));
        }
        std::fs::read(&path).map_err(|e| io_err(&path, e))
    }

    fn stat(&self, bucket: &str, key: &str) -> DatasetResult<ObjectInfo> {
        let path = self.object_path(bucket, key)?;
        if !path.is_file() {
            return Err(not_found(bucket, key));
        }
        let meta = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        let modified = meta.modified().map_err(|e| io_err(&path, e))?;
        Ok(ObjectInfo {
            key: key.to_string(),
            size: meta.len(),
            last_modified: DateTime::<Utc>::from(modified),
        })
    }

    fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> DatasetResult<()> {
        let path = self.object_path(bucket, key)?;
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| io_err(parent, e))?;
        tmp.as_file_mut().write_all(&data).map_err(|e| io_err(tmp.path(), e))?;
        tmp.as_file_mut().flush().map_err(|e| io_err(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| io_err(tmp.path(), e))?;

        match tmp.persist(&path) {
            Ok(_) => Ok(()),
            Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => {
                // Some filesystems refuse to rename over an existing file.
                let _ = std::fs::remove_file(&path);
                err.file
                    .persist(&path)
                    .map(|_| ())
                    .map_err(|e| io_err(&path, e.error))
            }
            Err(err) => Err(io_err(&path, err.error)),
        }
    }

    fn list(&self, bucket: &str) -> DatasetResult<Vec<ObjectInfo>> {
        let dir = self.bucket_dir(bucket)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in WalkDir::new(&dir) {
            let entry = entry.map_err(|e| DatasetError::storage(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_temp = entry.file_name().to_string_lossy().starts_with(".tmp");
            if is_temp {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&dir)
                .map_err(|e| DatasetError::storage(e.to_string()))?;
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(self.stat(bucket, &key)?);
        }
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }
}
