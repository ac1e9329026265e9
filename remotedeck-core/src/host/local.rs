//! Host backed by the local filesystem and process table.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::HostShell;

/// Application directory name under the platform config dir
const APP_DIR_NAME: &str = "remotedeck";

/// Local filesystem and process host
#[derive(Debug, Clone, Default)]
pub struct LocalHost {
    data_dir: Option<PathBuf>,
}

impl LocalHost {
    /// Uses the platform config directory (`~/.config/remotedeck` on Linux)
    #[must_use]
    pub const fn new() -> Self {
        Self { data_dir: None }
    }

    /// Uses an explicit data directory (`~` and `$VAR` are expanded)
    #[must_use]
    pub fn with_data_dir(dir: impl AsRef<str>) -> Self {
        let expanded = shellexpand::full(dir.as_ref())
            .map_or_else(|_| dir.as_ref().to_string(), |s| s.into_owned());
        Self {
            data_dir: Some(PathBuf::from(expanded)),
        }
    }
}

#[async_trait]
impl HostShell for LocalHost {
    async fn read_file(&self, dir: &Path, name: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(dir.join(name)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write_file(&self, dir: &Path, name: &str, content: &str) -> io::Result<()> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(name);
        let temp_path = dir.join(format!("{name}.tmp"));

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }

    async fn launch_program(&self, path: &Path, args: &[String]) -> io::Result<()> {
        let child = tokio::process::Command::new(path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        info!(
            program = %path.display(),
            pid = child.id(),
            argc = args.len(),
            "Launched external client"
        );
        Ok(())
    }

    async fn check_program(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() {
            return false;
        }
        if path.is_absolute() || path.components().count() > 1 {
            return fs::metadata(path).await.is_ok_and(|m| m.is_file());
        }
        let Some(search) = std::env::var_os("PATH") else {
            return false;
        };
        for dir in std::env::split_paths(&search) {
            if fs::metadata(dir.join(path)).await.is_ok_and(|m| m.is_file()) {
                return true;
            }
        }
        false
    }

    fn user_data_path(&self) -> io::Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no user config directory"))
    }
}
