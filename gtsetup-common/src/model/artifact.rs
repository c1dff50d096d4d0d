// gtsetup-common/src/model/artifact.rs
//! Downloadable artifacts and where they end up on the host.

use std::fmt;
use std::path::{Path, PathBuf};

/// Permission mode for data blobs read by the boot loader or a driver.
pub const DATA_MODE: u32 = 0o644;
/// Permission mode for installed executables.
pub const EXECUTABLE_MODE: u32 = 0o755;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Overlay,
    Firmware,
    Utility,
}

impl ArtifactKind {
    pub fn default_mode(self) -> u32 {
        match self {
            ArtifactKind::Overlay | ArtifactKind::Firmware => DATA_MODE,
            ArtifactKind::Utility => EXECUTABLE_MODE,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Overlay => "overlay",
            ArtifactKind::Firmware => "firmware config",
            ArtifactKind::Utility => "configuration utility",
        };
        f.write_str(name)
    }
}

/// A single artifact: fetched from `url`, written verbatim to `destination`
/// with `mode`. No version and no digest; the destination path is its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub kind: ArtifactKind,
    pub url: String,
    pub destination: PathBuf,
    pub mode: u32,
}

impl ArtifactSpec {
    pub fn new(kind: ArtifactKind, url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            url: url.into(),
            destination: destination.into(),
            mode: kind.default_mode(),
        }
    }

    /// File name used for the transient local copy.
    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .or_else(|| {
                self.url
                    .split('/')
                    .next_back()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| format!("{}-download", self.kind).replace(' ', "-"))
    }

    /// Where the transient download lives inside `work_dir`.
    pub fn local_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(self.file_name())
    }
}

impl fmt::Display for ArtifactSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.destination.display())
    }
}
