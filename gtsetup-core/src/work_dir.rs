// gtsetup-core/src/work_dir.rs
//! Where downloads and generated files sit before they are copied into place.

use std::path::{Path, PathBuf};

use gtsetup_common::config::Config;
use gtsetup_common::error::{Result, SetupError};
use tempfile::TempDir;
use tracing::debug;

/// The configured work directory, or a private directory created for this
/// run (mode 0700, random name) and removed when dropped.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    _scratch: Option<TempDir>,
}

impl WorkDir {
    pub fn prepare(config: &Config) -> Result<Self> {
        if let Some(dir) = &config.work_dir {
            return Ok(Self {
                path: dir.clone(),
                _scratch: None,
            });
        }

        let scratch = tempfile::Builder::new()
            .prefix("gtsetup-")
            .tempdir()
            .map_err(|e| {
                SetupError::Io(std::sync::Arc::new(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create work directory: {e}"),
                )))
            })?;
        debug!("Created work directory: {}", scratch.path().display());
        Ok(Self {
            path: scratch.path().to_path_buf(),
            _scratch: Some(scratch),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
