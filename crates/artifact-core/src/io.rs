use crate::error::{CrudError, Result};
use crate::paths;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Readers never observe a half-written file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    write_inner(path, data).map_err(|source| CrudError::Write {
        path: path.display().to_string(),
        source,
    })
}

fn write_inner(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a UTF-8 file, returning `None` when it does not exist.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Entries of `dir` that are files with the given extension, sorted by path.
/// A missing directory yields an empty list.
pub fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(ext) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Names of the subdirectories of `dir`, sorted. A missing directory yields an empty list.
pub fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            out.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    out.sort();
    Ok(out)
}

/// Remove `dir` if it exists and is empty. Failures are ignored.
pub fn remove_dir_if_empty(dir: &Path) {
    let empty = std::fs::read_dir(dir)
        .map(|mut it| it.next().is_none())
        .unwrap_or(false);
    if empty {
        let _ = std::fs::remove_dir(dir);
    }
}

/// First backup name for `path` that is not taken: `<file>.deleted`, then
/// `<file>.deleted.1`, `<file>.deleted.2` and so on.
pub fn vacant_backup_path(path: &Path) -> PathBuf {
    let first = paths::deleted_path(path);
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|n| {
            let mut s = first.as_os_str().to_owned();
            s.push(format!(".{n}"));
            PathBuf::from(s)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// True for soft-delete backups such as `SKILL.md.deleted` or `x.md.deleted.2`.
pub fn is_backup(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().contains(paths::DELETED_SUFFIX))
        .unwrap_or(false)
}
