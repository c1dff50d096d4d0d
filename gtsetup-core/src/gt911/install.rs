// gtsetup-core/src/gt911/install.rs
use std::path::Path;
use std::process::Command as StdCommand;
use std::time::Duration;

use gtsetup_common::config::{Config, Privilege};
use gtsetup_common::error::{Result, SetupError};
use gtsetup_common::model::artifact::DATA_MODE;
use tracing::{debug, info};

use super::Gt911Config;
use crate::install::install_file;
use crate::privilege::run_command;
use crate::work_dir::WorkDir;

const DRIVER_MODULE: &str = "goodix";
const DRIVER_UNLOAD_PAUSE: Duration = Duration::from_secs(1);

/// Checks that the firmware directory exists, `modprobe` is on PATH and the
/// goodix driver module is known to it.
pub fn check_system_requirements(firmware_dir: &Path) -> Result<()> {
    if !firmware_dir.is_dir() {
        return Err(SetupError::InstallError(format!(
            "Directory {} does not exist",
            firmware_dir.display()
        )));
    }

    let modprobe = which::which("modprobe")
        .map_err(|e| SetupError::InstallError(format!("modprobe command not found: {e}")))?;
    debug!("Found modprobe at {}", modprobe.display());

    let output = StdCommand::new(&modprobe)
        .arg("-n")
        .arg(DRIVER_MODULE)
        .output()
        .map_err(|e| SetupError::CommandExecError(format!("modprobe -n {DRIVER_MODULE}: {e}")))?;
    if !output.status.success() {
        return Err(SetupError::InstallError(format!(
            "Goodix driver module not available: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    debug!("System requirements met");
    Ok(())
}

/// Writes `config` into the work directory and installs it as the firmware
/// config the goodix driver loads.
pub fn install_config(gt911: &Gt911Config, config: &Config) -> Result<()> {
    check_system_requirements(&config.firmware_dir)?;
    let destination = config.firmware_config_path();
    let work_dir = WorkDir::prepare(config)?;
    let local = work_dir.path().join(
        destination
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("goodix_911_cfg.bin")),
    );
    gt911.save(&local)?;
    install_file(&local, &destination, DATA_MODE, config.privilege)?;
    info!("Installed GT911 config to {}", destination.display());
    Ok(())
}

/// Unloads and reloads the goodix module so it picks up the new config.
pub async fn reload_driver(privilege: Privilege) -> Result<()> {
    info!("Reloading {} driver", DRIVER_MODULE);
    tokio::task::spawn_blocking(move || run_command(privilege, "modprobe", &["-r", DRIVER_MODULE]))
        .await
        .map_err(|e| SetupError::CommandExecError(format!("modprobe -r {DRIVER_MODULE}: {e}")))??;

    tokio::time::sleep(DRIVER_UNLOAD_PAUSE).await;

    tokio::task::spawn_blocking(move || run_command(privilege, "modprobe", &[DRIVER_MODULE]))
        .await
        .map_err(|e| SetupError::CommandExecError(format!("modprobe {DRIVER_MODULE}: {e}")))??;
    info!("Driver reloaded; check `dmesg | grep -i goodix` for the result");
    Ok(())
}
