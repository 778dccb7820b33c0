use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("refusing to write outside the output directory: {0}")]
    UnsafePath(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write files below a root directory via temp file and rename.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `content` to `{dir}/{relative}`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf, PersistError> {
        let relative = safe_relative_path(relative)?;
        let target = self.dir.join(relative);
        let parent = target.parent().unwrap_or(&self.dir).to_path_buf();
        ensure_output_dir(&self.dir)?;
        ensure_output_dir(&parent)?;

        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Write every `(path, code)` pair of a bundle below `dir`.
///
/// Bundle paths start with `/`; they are written relative to `dir`.
pub fn write_bundle<'a, I>(dir: &Path, files: I) -> Result<Vec<PathBuf>, PersistError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    files
        .into_iter()
        .map(|(path, code)| writer.write(path, code))
        .collect()
}

fn safe_relative_path(raw: &str) -> Result<PathBuf, PersistError> {
    let trimmed = raw.trim_start_matches('/');
    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return Err(PersistError::UnsafePath(raw.to_string())),
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(PersistError::UnsafePath(raw.to_string()));
    }
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::safe_relative_path;
    use std::path::PathBuf;

    #[test]
    fn bundle_paths_become_relative() {
        assert_eq!(
            safe_relative_path("/src/App.tsx").unwrap(),
            PathBuf::from("src").join("App.tsx")
        );
    }

    #[test]
    fn traversal_and_empty_paths_are_rejected() {
        assert!(safe_relative_path("/../etc/passwd").is_err());
        assert!(safe_relative_path("/a/../../b").is_err());
        assert!(safe_relative_path("/").is_err());
    }
}
