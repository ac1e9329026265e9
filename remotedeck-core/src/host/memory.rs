//! In-memory host for tests and embedding.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::HostShell;

/// A launch recorded by [`MemoryHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLaunch {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Host that keeps files in a map and records launches instead of spawning
#[derive(Debug, Default)]
pub struct MemoryHost {
    data_dir: PathBuf,
    files: Mutex<HashMap<PathBuf, String>>,
    programs: Mutex<HashSet<PathBuf>>,
    launches: Mutex<Vec<RecordedLaunch>>,
    fail_launches: bool,
}

impl MemoryHost {
    /// Creates an empty host whose data directory is `data_dir`
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Marks a program as installed
    #[must_use]
    pub fn with_program(self, path: impl Into<PathBuf>) -> Self {
        self.programs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
        self
    }

    /// Makes every launch fail with `NotFound`
    #[must_use]
    pub const fn failing_launches(mut self) -> Self {
        self.fail_launches = true;
        self
    }

    /// Stores a file directly
    pub fn insert_file(&self, dir: &Path, name: &str, content: impl Into<String>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(dir.join(name), content.into());
    }

    /// Returns the content of a stored file
    pub fn file(&self, dir: &Path, name: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&dir.join(name))
            .cloned()
    }

    /// Returns all stored paths under `dir` whose name starts with `prefix`
    pub fn files_with_prefix(&self, dir: &Path, prefix: &str) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|p| {
                p.parent() == Some(dir)
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(prefix))
            })
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Returns every launch recorded so far
    pub fn launches(&self) -> Vec<RecordedLaunch> {
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HostShell for MemoryHost {
    async fn read_file(&self, dir: &Path, name: &str) -> io::Result<Option<String>> {
        Ok(self.file(dir, name))
    }

    async fn write_file(&self, dir: &Path, name: &str, content: &str) -> io::Result<()> {
        self.insert_file(dir, name, content);
        Ok(())
    }

    async fn launch_program(&self, path: &Path, args: &[String]) -> io::Result<()> {
        if self.fail_launches {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        }
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedLaunch {
                program: path.to_path_buf(),
                args: args.to_vec(),
            });
        Ok(())
    }

    async fn check_program(&self, path: &Path) -> bool {
        self.programs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }

    fn user_data_path(&self) -> io::Result<PathBuf> {
        Ok(self.data_dir.clone())
    }
}
