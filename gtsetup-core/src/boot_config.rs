// gtsetup-core/src/boot_config.rs
//! Keeps a single configuration line present in a text file such as the
//! Raspberry Pi `config.txt`.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use gtsetup_common::config::{LineMatch, Privilege};
use gtsetup_common::error::Result;
use tracing::{debug, info, warn};

use crate::privilege::{classify_io, sudo_append, sudo_read};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The file did not exist and now holds just the line.
    Created,
    /// A blank line and the line were appended.
    Appended,
    /// An existing line already satisfied the rule; nothing was written.
    /// `exact` is false when the line only shares the target as a prefix.
    AlreadyPresent { matched: String, exact: bool },
}

/// Ensures `line` is present in the file at `path`.
///
/// A missing file is created with `line` as its only content. An existing
/// file is left untouched if any of its lines matches under `rule`, otherwise
/// a blank line followed by `line` is appended. Existing content is matched
/// as raw bytes and never rewritten, so it need not be valid UTF-8.
pub fn ensure_line(path: &Path, line: &str, rule: LineMatch, privilege: Privilege) -> Result<EnsureOutcome> {
    let Some(content) = read_existing(path, privilege)? else {
        debug!("{} does not exist, creating it", path.display());
        append(path, format!("{line}\n").as_bytes(), privilege)?;
        info!("Created {} with `{}`", path.display(), line);
        return Ok(EnsureOutcome::Created);
    };

    let target = line.as_bytes();
    let found = content
        .split(|b| *b == b'\n')
        .find(|existing| rule.matches_bytes(existing, target));
    if let Some(matched) = found {
        let exact = LineMatch::Exact.matches_bytes(matched, target);
        let matched = matched.strip_suffix(b"\r").unwrap_or(matched);
        let matched = String::from_utf8_lossy(matched).into_owned();
        if exact {
            debug!("`{}` already present in {}", line, path.display());
        } else {
            warn!(
                "{} has `{}`, which only shares the prefix `{}`; treating it as present",
                path.display(),
                matched,
                line
            );
        }
        return Ok(EnsureOutcome::AlreadyPresent { matched, exact });
    }

    // Terminate an unterminated last line first so the blank separator is a
    // line of its own.
    let block = if content.is_empty() || content.ends_with(b"\n") {
        format!("\n{line}\n")
    } else {
        format!("\n\n{line}\n")
    };
    append(path, block.as_bytes(), privilege)?;
    info!("Added `{}` to {}", line, path.display());
    Ok(EnsureOutcome::Appended)
}

/// Current content of `path`, or `None` if it does not exist.
fn read_existing(path: &Path, privilege: Privilege) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) if e.kind() == ErrorKind::PermissionDenied && privilege == Privilege::Sudo => {
            debug!(
                "Direct read of {} failed (Permission Denied). Trying with sudo cat.",
                path.display()
            );
            sudo_read(path).map(Some)
        }
        Err(e) => Err(classify_io(e, || format!("cannot read {}", path.display()))),
    }
}

fn append(path: &Path, data: &[u8], privilege: Privilege) -> Result<()> {
    let direct = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .and_then(|mut file| file.write_all(data));

    match direct {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied && privilege == Privilege::Sudo => {
            debug!(
                "Direct write to {} failed (Permission Denied). Trying with sudo tee.",
                path.display()
            );
            sudo_append(path, data)
        }
        Err(e) => Err(classify_io(e, || format!("cannot write {}", path.display()))),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use gtsetup_common::error::SetupError;
    use proptest::prelude::*;
    use tempfile::TempDir;

    use super::*;

    const LINE: &str = "dtoverlay=goodix";

    fn scratch(initial: Option<&str>) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.txt");
        if let Some(content) = initial {
            fs::write(&path, content).expect("seed");
        }
        (dir, path)
    }

    fn ensure(path: &Path) -> EnsureOutcome {
        ensure_line(path, LINE, LineMatch::Prefix, Privilege::Direct).expect("ensure")
    }

    #[test]
    fn creates_missing_file_with_only_the_line() {
        let (_dir, path) = scratch(None);
        assert_eq!(ensure(&path), EnsureOutcome::Created);
        assert_eq!(fs::read_to_string(&path).unwrap(), "dtoverlay=goodix\n");
    }

    #[test]
    fn appends_after_blank_line() {
        let (_dir, path) = scratch(Some("dtoverlay=vc4-kms-v3d\n"));
        assert_eq!(ensure(&path), EnsureOutcome::Appended);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "dtoverlay=vc4-kms-v3d\n\ndtoverlay=goodix\n"
        );
    }

    #[test]
    fn unterminated_last_line_still_gets_blank_separator() {
        let (_dir, path) = scratch(Some("dtoverlay=vc4-kms-v3d"));
        ensure(&path);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "dtoverlay=vc4-kms-v3d\n\ndtoverlay=goodix\n"
        );
    }

    #[test]
    fn empty_file_gains_two_lines() {
        let (_dir, path) = scratch(Some(""));
        ensure(&path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "\ndtoverlay=goodix\n");
    }

    #[test]
    fn prefix_match_counts_as_present() {
        let (_dir, path) = scratch(Some("dtoverlay=goodix-extra\n"));
        assert_eq!(
            ensure(&path),
            EnsureOutcome::AlreadyPresent {
                matched: "dtoverlay=goodix-extra".to_string(),
                exact: false,
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "dtoverlay=goodix-extra\n");
    }

    #[test]
    fn exact_rule_appends_past_a_prefix_lookalike() {
        let (_dir, path) = scratch(Some("dtoverlay=goodix-extra\n"));
        let outcome = ensure_line(&path, LINE, LineMatch::Exact, Privilege::Direct).unwrap();
        assert_eq!(outcome, EnsureOutcome::Appended);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "dtoverlay=goodix-extra\n\ndtoverlay=goodix\n"
        );
    }

    #[test]
    fn exact_line_is_reported_as_exact() {
        let (_dir, path) = scratch(Some("dtoverlay=goodix\n"));
        assert_eq!(
            ensure(&path),
            EnsureOutcome::AlreadyPresent {
                matched: "dtoverlay=goodix".to_string(),
                exact: true,
            }
        );
    }

    #[test]
    fn non_utf8_content_is_appended_to_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.txt");
        fs::write(&path, b"# caf\xe9 display\ndtoverlay=vc4-kms-v3d\n").unwrap();

        assert_eq!(ensure(&path), EnsureOutcome::Appended);
        assert_eq!(
            fs::read(&path).unwrap(),
            b"# caf\xe9 display\ndtoverlay=vc4-kms-v3d\n\ndtoverlay=goodix\n"
        );
    }

    #[test]
    fn non_utf8_line_can_satisfy_the_prefix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.txt");
        let content = b"dtoverlay=goodix # caf\xe9\n";
        fs::write(&path, content).unwrap();

        assert!(matches!(ensure(&path), EnsureOutcome::AlreadyPresent { exact: false, .. }));
        assert_eq!(fs::read(&path).unwrap(), content);
    }

    fn restrict(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn read_only_file_is_permission_denied() {
        let (_dir, path) = scratch(Some("dtoverlay=vc4-kms-v3d\n"));
        restrict(&path, 0o444);
        // Root ignores file modes.
        if OpenOptions::new().append(true).open(&path).is_ok() {
            return;
        }

        let err = ensure_line(&path, LINE, LineMatch::Prefix, Privilege::Direct).unwrap_err();
        assert!(matches!(err, SetupError::PermissionDenied(_)), "{err}");
        assert_eq!(fs::read_to_string(&path).unwrap(), "dtoverlay=vc4-kms-v3d\n");
    }

    #[test]
    fn unreadable_file_is_permission_denied_without_sudo() {
        let (_dir, path) = scratch(Some("dtoverlay=vc4-kms-v3d\n"));
        restrict(&path, 0o000);
        if fs::read(&path).is_ok() {
            return;
        }

        let err = ensure_line(&path, LINE, LineMatch::Prefix, Privilege::Direct).unwrap_err();
        assert!(
            matches!(err, SetupError::PermissionDenied(ref msg) if msg.starts_with("cannot read")),
            "{err}"
        );
    }

    #[test]
    fn repeated_lines_are_left_alone() {
        let content = "dtoverlay=goodix\ndtoverlay=goodix\n";
        let (_dir, path) = scratch(Some(content));
        ensure(&path);
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn missing_parent_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("config.txt");
        let err = ensure_line(&path, LINE, LineMatch::Prefix, Privilege::Direct).unwrap_err();
        assert!(matches!(err, SetupError::Io(ref e) if e.kind() == ErrorKind::NotFound), "{err}");
    }

    fn arb_config_line() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z_]{1,12}=[a-z0-9,-]{0,12}",
            "#[ a-z]{0,20}",
            Just(String::new()),
            Just("dtoverlay=goodix".to_string()),
            Just("dtoverlay=goodix,interrupt=4".to_string()),
            Just("dtparam=i2c_arm=on".to_string()),
        ]
    }

    fn arb_config() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(arb_config_line(), 0..12)
    }

    proptest! {
        /// with a prefix match present the line count never changes
        #[test]
        fn prop_present_line_is_noop(lines in arb_config(), at in any::<prop::sample::Index>()) {
            let mut lines = lines;
            let insert_at = at.index(lines.len() + 1);
            lines.insert(insert_at, "dtoverlay=goodix".to_string());
            let content = format!("{}\n", lines.join("\n"));
            let (_dir, path) = scratch(Some(&content));
            ensure(&path);
            prop_assert_eq!(fs::read_to_string(&path).unwrap(), content);
        }

        /// without a match exactly a blank line and the target are appended
        #[test]
        fn prop_absent_line_appends_two(lines in arb_config()) {
            let lines: Vec<String> = lines.into_iter().filter(|l| !l.starts_with(LINE)).collect();
            let content = lines.iter().map(|l| format!("{l}\n")).collect::<String>();
            let (_dir, path) = scratch(Some(&content));
            ensure(&path);
            let after = fs::read_to_string(&path).unwrap();
            let after_lines: Vec<&str> = after.lines().collect();
            prop_assert_eq!(after_lines.len(), lines.len() + 2);
            prop_assert_eq!(&after_lines[..lines.len()], &lines.iter().map(String::as_str).collect::<Vec<_>>()[..]);
            prop_assert_eq!(after_lines[lines.len()], "");
            prop_assert_eq!(after_lines[lines.len() + 1], LINE);
        }

        /// running twice is the same as running once
        #[test]
        fn prop_idempotent(lines in arb_config(), exists in any::<bool>()) {
            let content = lines.iter().map(|l| format!("{l}\n")).collect::<String>();
            let (_dir, path) = scratch(exists.then_some(content.as_str()));
            ensure(&path);
            let once = fs::read_to_string(&path).unwrap();
            ensure(&path);
            prop_assert_eq!(fs::read_to_string(&path).unwrap(), once);
        }
    }
}
