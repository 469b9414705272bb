//! PID file guard held for as long as the collector services run.
//!
//! [`PidFile::acquire`] creates the file exclusively and writes the current
//! PID. Dropping the guard removes the file, so every exit path of
//! [`Orchestrator::run_until`](crate::orchestrator::Orchestrator::run_until)
//! cleans up, including a startup where no service comes up.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;

/// An exclusively created PID file, removed on drop.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Create `path` (and missing parent directories) holding the current PID.
    ///
    /// # Errors
    ///
    /// Fails if the file already exists, naming the PID recorded in it, so a
    /// second daemon on the same config refuses to start.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .map(|s| s.trim().to_owned())
                    .unwrap_or_default();
                return Err(anyhow::anyhow!(
                    "netsentry-daemon already running? {} holds pid '{}'",
                    path.display(),
                    holder
                ));
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "cannot create pid file {}: {}",
                    path.display(),
                    e
                ));
            }
        };
        restrict_permissions(&file)?;
        writeln!(file, "{}", std::process::id())?;

        tracing::info!(path = %path.display(), pid = std::process::id(), "pid file created");
        Ok(Self { path })
    }

    /// Acquire a guard only when `path` is configured (non-empty).
    pub fn acquire_configured(path: &str) -> Result<Option<Self>> {
        if path.is_empty() {
            return Ok(None);
        }
        Self::acquire(path).map(Some)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::info!(path = %self.path.display(), "pid file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "pid file not removed")
            }
        }
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().mode(0o700).recursive(true).create(dir)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> Result<()> {
    Ok(())
}
