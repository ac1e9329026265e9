//! Host collaborator
//!
//! The core never touches the filesystem or spawns processes directly; it
//! goes through a [`HostShell`] provided by whatever shell embeds it. A
//! missing file is "no data yet" (`Ok(None)`), not an error.

mod local;
mod memory;

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use local::LocalHost;
pub use memory::{MemoryHost, RecordedLaunch};

/// File and process API consumed by the core
#[async_trait]
pub trait HostShell: Send + Sync {
    /// Reads `dir/name`; `Ok(None)` when the file does not exist
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read
    async fn read_file(&self, dir: &Path, name: &str) -> io::Result<Option<String>>;

    /// Writes `dir/name` atomically, creating `dir` if needed
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written
    async fn write_file(&self, dir: &Path, name: &str, content: &str) -> io::Result<()>;

    /// Starts a program detached from the caller
    ///
    /// Only spawn success is reported; the child is not tracked.
    ///
    /// # Errors
    /// Returns an error if the process cannot be started
    async fn launch_program(&self, path: &Path, args: &[String]) -> io::Result<()>;

    /// Returns true if the program exists
    async fn check_program(&self, path: &Path) -> bool;

    /// Per-user application data directory
    ///
    /// # Errors
    /// Returns an error if the platform has no such directory
    fn user_data_path(&self) -> io::Result<PathBuf>;
}
