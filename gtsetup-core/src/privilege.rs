// gtsetup-core/src/privilege.rs
//! Per-command elevation: operations run as the current user and only the
//! individual commands that need root go through `sudo`.

use std::ffi::OsStr;
use std::io::{ErrorKind, Write};
use std::process::{Command as StdCommand, Stdio};

use gtsetup_common::config::Privilege;
use gtsetup_common::error::{Result, SetupError};
use tracing::{debug, error};

fn build_command<S: AsRef<OsStr>>(privilege: Privilege, program: &str, args: &[S]) -> StdCommand {
    let mut cmd = match privilege {
        Privilege::Sudo => {
            let mut cmd = StdCommand::new("sudo");
            cmd.arg(program);
            cmd
        }
        Privilege::Direct => StdCommand::new(program),
    };
    cmd.args(args);
    cmd
}

fn describe<S: AsRef<OsStr>>(privilege: Privilege, program: &str, args: &[S]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 2);
    if privilege == Privilege::Sudo {
        parts.push("sudo".to_string());
    }
    parts.push(program.to_string());
    parts.extend(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Runs `program args...`, prefixed with `sudo` when `privilege` says so.
pub fn run_command<S: AsRef<OsStr>>(privilege: Privilege, program: &str, args: &[S]) -> Result<()> {
    let shown = describe(privilege, program, args);
    debug!("Running `{}`", shown);
    let output = build_command(privilege, program, args)
        .stdin(Stdio::inherit())
        .output()
        .map_err(|e| SetupError::CommandExecError(format!("`{shown}`: {e}")))?;

    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    error!("`{}` failed ({}): {}", shown, output.status, stderr.trim());
    Err(SetupError::CommandExecError(format!(
        "`{}` exited with {}: {}",
        shown,
        output.status,
        stderr.trim()
    )))
}

/// Appends `data` to `path` through `sudo tee -a`.
pub fn sudo_append(path: &std::path::Path, data: &[u8]) -> Result<()> {
    let shown = format!("sudo tee -a {}", path.display());
    debug!("Running `{}`", shown);
    let mut child = StdCommand::new("sudo")
        .arg("tee")
        .arg("-a")
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SetupError::CommandExecError(format!("`{shown}`: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(data)?;
    }
    let output = child.wait_with_output()?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("`{}` failed ({}): {}", shown, output.status, stderr.trim());
        Err(SetupError::PermissionDenied(format!(
            "cannot write {} even with sudo: {}",
            path.display(),
            stderr.trim()
        )))
    }
}

/// Reads `path` through `sudo cat`.
pub fn sudo_read(path: &std::path::Path) -> Result<Vec<u8>> {
    let shown = format!("sudo cat {}", path.display());
    debug!("Running `{}`", shown);
    let output = StdCommand::new("sudo")
        .arg("cat")
        .arg(path)
        .stdin(Stdio::inherit())
        .output()
        .map_err(|e| SetupError::CommandExecError(format!("`{shown}`: {e}")))?;
    if output.status.success() {
        Ok(output.stdout)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("`{}` failed ({}): {}", shown, output.status, stderr.trim());
        Err(SetupError::PermissionDenied(format!(
            "cannot read {} even with sudo: {}",
            path.display(),
            stderr.trim()
        )))
    }
}

/// Turns a permission error into [`SetupError::PermissionDenied`], anything
/// else into a plain I/O error.
pub fn classify_io(err: std::io::Error, what: impl FnOnce() -> String) -> SetupError {
    if err.kind() == ErrorKind::PermissionDenied {
        SetupError::PermissionDenied(format!("{}: {}", what(), err))
    } else {
        SetupError::from(err)
    }
}
