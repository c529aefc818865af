use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::format::TERMINATOR;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("File is not open, valid filename must be provided beforehand.")]
    NoPath,
    #[error("No default directory available from provider '{0}'")]
    NoDefaultDir(String),
    #[error("Could not create directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Could not open file {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("Could not write to {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// An append-mode file with a writer bound to it.
#[derive(Debug)]
pub struct OpenFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl OpenFile {
    /// Creates missing parent directories, then opens `path` for appending.
    /// The flag is true when nothing has been written to the file yet.
    pub fn open(path: &Path) -> Result<(Self, bool), SessionError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SessionError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let open_err = |source: io::Error| SessionError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;
        let empty = file.metadata().map_err(open_err)?.len() == 0;

        Ok((
            Self {
                path: path.to_path_buf(),
                writer: BufWriter::new(file),
            },
            empty,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `line` plus the terminator and flushes before returning.
    pub fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(TERMINATOR.as_bytes()))
            .and_then(|_| self.writer.flush())
            .map_err(|source| SessionError::Write {
                path: self.path.clone(),
                source,
            })
    }

    pub fn close(mut self) -> Result<(), SessionError> {
        self.writer.flush().map_err(|source| SessionError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// `Stale` means the next log call has to resolve the path and open it.
#[derive(Debug, Default)]
pub enum Session {
    #[default]
    Stale,
    Writing(OpenFile),
}

impl Session {
    pub fn is_writing(&self) -> bool {
        matches!(self, Session::Writing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.csv");

        let (mut file, empty) = OpenFile::open(&path).unwrap();
        assert!(empty);
        file.write_line("x, y").unwrap();
        file.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "x, y\n");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "existing\n").unwrap();

        let (mut file, empty) = OpenFile::open(&path).unwrap();
        assert!(!empty);
        file.write_line("next").unwrap();
        drop(file);

        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nnext\n");
    }

    #[test]
    fn test_open_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = OpenFile::open(dir.path()).unwrap_err();
        assert!(matches!(err, SessionError::Open { .. }));
    }
}
