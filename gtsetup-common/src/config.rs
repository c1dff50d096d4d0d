// gtsetup-common/src/config.rs
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use super::error::{Result, SetupError};
use super::model::artifact::{ArtifactKind, ArtifactSpec};

const DEFAULT_BOOT_CONFIG: &str = "/boot/config.txt";
const DEFAULT_OVERLAY_LINE: &str = "dtoverlay=goodix";
const DEFAULT_ARTIFACT_BASE_URL: &str =
    "https://raw.githubusercontent.com/goodix-gt911/gt911-setup/main/artifacts";
const DEFAULT_OVERLAYS_DIR: &str = "/boot/overlays";
const DEFAULT_FIRMWARE_DIR: &str = "/lib/firmware";
const DEFAULT_UTILITY_DIR: &str = "/usr/local/bin";
const DEFAULT_REBOOT_DELAY_SECS: u64 = 5;

pub const OVERLAY_FILE_NAME: &str = "goodix.dtbo";
pub const FIRMWARE_FILE_NAME: &str = "goodix_911_cfg.bin";
pub const UTILITY_FILE_NAME: &str = "goodix_gt911_config.py";

/// How an existing line is recognised as the target line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineMatch {
    /// The existing line starts with the target value.
    #[default]
    Prefix,
    /// The existing line equals the target value.
    Exact,
}

impl LineMatch {
    pub fn matches(self, existing: &str, target: &str) -> bool {
        self.matches_bytes(existing.as_bytes(), target.as_bytes())
    }

    /// Byte-level match, for files that are not valid UTF-8.
    pub fn matches_bytes(self, existing: &[u8], target: &[u8]) -> bool {
        match self {
            LineMatch::Prefix => existing.starts_with(target),
            LineMatch::Exact => existing.strip_suffix(b"\r").unwrap_or(existing) == target,
        }
    }
}

impl FromStr for LineMatch {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefix" => Ok(LineMatch::Prefix),
            "exact" => Ok(LineMatch::Exact),
            other => Err(SetupError::Config(format!(
                "unknown line match rule '{other}' (expected 'prefix' or 'exact')"
            ))),
        }
    }
}

/// Whether writes that hit a permission error get retried through `sudo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Privilege {
    Direct,
    #[default]
    Sudo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebootPolicy {
    pub delay: Duration,
    /// Program and arguments; elevated according to [`Privilege`].
    pub command: Vec<String>,
}

impl Default for RebootPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(DEFAULT_REBOOT_DELAY_SECS),
            command: vec!["reboot".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub boot_config_path: PathBuf,
    pub overlay_line: String,
    pub line_match: LineMatch,
    /// Installed in order; the run stops at the first one that fails.
    pub artifacts: Vec<ArtifactSpec>,
    pub firmware_dir: PathBuf,
    /// Download directory. `None` means a private directory per run.
    pub work_dir: Option<PathBuf>,
    pub privilege: Privilege,
    pub reboot: RebootPolicy,
}

impl Config {
    /// Defaults with `GTSETUP_*` environment overrides applied.
    pub fn load() -> Result<Self> {
        debug!("Loading gtsetup configuration");
        Self::load_with(|key| env::var(key).ok())
    }

    /// Like [`Config::load`] but reads variables through `lookup`.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|s| !s.is_empty());

        let base_url = var("GTSETUP_ARTIFACT_BASE_URL")
            .unwrap_or_else(|| DEFAULT_ARTIFACT_BASE_URL.to_string());
        let mut config = Self::with_base_url(&base_url);

        if let Some(path) = var("GTSETUP_BOOT_CONFIG") {
            config.boot_config_path = PathBuf::from(path);
        }
        if let Some(dir) = var("GTSETUP_WORK_DIR") {
            config.work_dir = Some(PathBuf::from(dir));
        }
        if let Some(rule) = var("GTSETUP_LINE_MATCH") {
            config.line_match = rule.parse()?;
        }
        if let Some(value) = var("GTSETUP_NO_SUDO") {
            config.privilege = if parse_flag("GTSETUP_NO_SUDO", &value)? {
                Privilege::Direct
            } else {
                Privilege::Sudo
            };
        }
        if let Some(secs) = var("GTSETUP_REBOOT_DELAY_SECS") {
            let secs = secs.parse::<u64>().map_err(|e| {
                SetupError::Config(format!("invalid GTSETUP_REBOOT_DELAY_SECS '{secs}': {e}"))
            })?;
            config.reboot.delay = Duration::from_secs(secs);
        }

        config.validate()?;
        debug!("Boot config: {}", config.boot_config_path.display());
        debug!("Artifact base URL: {}", base_url);
        match &config.work_dir {
            Some(dir) => debug!("Work dir: {}", dir.display()),
            None => debug!("Work dir: private per-run directory"),
        }
        debug!("Configuration loaded successfully.");
        Ok(config)
    }

    /// Default layout with every artifact fetched from under `base_url`.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let firmware_dir = PathBuf::from(DEFAULT_FIRMWARE_DIR);
        let artifacts = vec![
            ArtifactSpec::new(
                ArtifactKind::Overlay,
                format!("{base}/{OVERLAY_FILE_NAME}"),
                Path::new(DEFAULT_OVERLAYS_DIR).join(OVERLAY_FILE_NAME),
            ),
            ArtifactSpec::new(
                ArtifactKind::Firmware,
                format!("{base}/{FIRMWARE_FILE_NAME}"),
                firmware_dir.join(FIRMWARE_FILE_NAME),
            ),
            ArtifactSpec::new(
                ArtifactKind::Utility,
                format!("{base}/{UTILITY_FILE_NAME}"),
                Path::new(DEFAULT_UTILITY_DIR).join(UTILITY_FILE_NAME),
            ),
        ];
        Self {
            boot_config_path: PathBuf::from(DEFAULT_BOOT_CONFIG),
            overlay_line: DEFAULT_OVERLAY_LINE.to_string(),
            line_match: LineMatch::default(),
            artifacts,
            firmware_dir,
            work_dir: None,
            privilege: Privilege::default(),
            reboot: RebootPolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.overlay_line.is_empty() || self.overlay_line.contains('\n') {
            return Err(SetupError::Config(
                "overlay line must be a single non-empty line".to_string(),
            ));
        }
        if self.reboot.command.is_empty() {
            return Err(SetupError::Config("reboot command is empty".to_string()));
        }
        Ok(())
    }

    pub fn firmware_config_path(&self) -> PathBuf {
        self.firmware_dir.join(FIRMWARE_FILE_NAME)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SetupError::Config(format!(
            "invalid {key} '{other}' (expected 1/0, true/false, yes/no or on/off)"
        ))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_ARTIFACT_BASE_URL)
    }
}

impl fmt::Display for LineMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineMatch::Prefix => f.write_str("prefix"),
            LineMatch::Exact => f.write_str("exact"),
        }
    }
}
