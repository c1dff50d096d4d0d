// gtsetup-core/src/install.rs
//! Copies a downloaded file to its final location, sets its mode and drops
//! the local copy.

use std::fs::{self, Permissions};
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use gtsetup_common::config::Privilege;
use gtsetup_common::error::{Result, SetupError};
use gtsetup_common::model::ArtifactSpec;
use tracing::{debug, info};

use crate::privilege::{classify_io, run_command};

/// Installs a downloaded artifact from `local` to its destination.
pub fn install_artifact(local: &Path, artifact: &ArtifactSpec, privilege: Privilege) -> Result<()> {
    install_file(local, &artifact.destination, artifact.mode, privilege)?;
    info!(
        "Installed {} to {} ({:o})",
        artifact.kind,
        artifact.destination.display(),
        artifact.mode
    );
    Ok(())
}

/// Copies `local` to `destination`, applies `mode` and removes `local`.
///
/// Each filesystem change is tried directly first; a permission failure is
/// retried through `sudo` when `privilege` allows it.
pub fn install_file(local: &Path, destination: &Path, mode: u32, privilege: Privilege) -> Result<()> {
    if !local.is_file() {
        return Err(SetupError::SourceMissing(local.display().to_string()));
    }

    copy(local, destination, privilege)?;
    set_mode(destination, mode, privilege)?;

    debug!("Removing local copy {}", local.display());
    fs::remove_file(local).map_err(|e| classify_io(e, || format!("cannot remove {}", local.display())))?;
    Ok(())
}

fn copy(local: &Path, destination: &Path, privilege: Privilege) -> Result<()> {
    debug!("Copying {} -> {}", local.display(), destination.display());
    match fs::copy(local, destination) {
        Ok(bytes) => {
            debug!("Copied {} bytes", bytes);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied && privilege == Privilege::Sudo => {
            debug!(
                "Direct copy to {} failed (Permission Denied). Trying with sudo cp.",
                destination.display()
            );
            run_command(privilege, "cp", &[local.as_os_str(), destination.as_os_str()])
        }
        Err(e) => Err(classify_io(e, || {
            format!("cannot copy {} to {}", local.display(), destination.display())
        })),
    }
}

fn set_mode(path: &Path, mode: u32, privilege: Privilege) -> Result<()> {
    debug!("Setting permissions on {}: {:o}", path.display(), mode);
    match fs::set_permissions(path, Permissions::from_mode(mode)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied && privilege == Privilege::Sudo => {
            debug!(
                "Direct chmod of {} failed (Permission Denied). Trying with sudo chmod.",
                path.display()
            );
            let mode = format!("{mode:o}");
            let target = path.to_string_lossy().into_owned();
            run_command(privilege, "chmod", &[mode.as_str(), target.as_str()])
        }
        Err(e) => Err(classify_io(e, || format!("cannot chmod {}", path.display()))),
    }
}
