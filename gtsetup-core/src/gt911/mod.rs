// gtsetup-core/src/gt911/mod.rs
//! GT911 touch controller configuration image.
//!
//! The image is the 186-byte register block starting at 0x8047: 184 bytes
//! of settings, an 8-bit checksum at 0x80FF and the config-fresh flag at
//! 0x8100.

pub mod install;

use std::fmt;
use std::fs;
use std::path::Path;

use gtsetup_common::error::{Result, SetupError};
use tracing::debug;

pub use install::{check_system_requirements, install_config, reload_driver};

pub const CONFIG_LEN: usize = 186;
pub const BASE_REGISTER: u16 = 0x8047;

const MAX_RESOLUTION: u16 = 4095;
const MAX_TOUCH_POINTS: u8 = 10;

const CONFIG_VERSION: usize = 0;
const X_RESOLUTION: usize = 1;
const Y_RESOLUTION: usize = 3;
const TOUCH_NUMBER: usize = 5;
const MODULE_SWITCH_1: usize = 6;
const MODULE_SWITCH_2: usize = 7;
const SHAKE_COUNT: usize = 8;
const FILTER: usize = 9;
const SCREEN_TOUCH_LEVEL: usize = 12;
const CHECKSUM: usize = 184;
const CONFIG_FRESH: usize = 185;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gt911Settings {
    pub x_max: u16,
    pub y_max: u16,
    pub touch_threshold: u8,
    pub num_touch_points: u8,
    pub filter_coefficient: u8,
}

impl Default for Gt911Settings {
    fn default() -> Self {
        PRESETS[0].settings
    }
}

impl Gt911Settings {
    /// Both axes must be in `1..=4095` and even.
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: u16| (1..=MAX_RESOLUTION).contains(&v);
        if !in_range(self.x_max) || !in_range(self.y_max) {
            return Err(SetupError::ValidationError(format!(
                "Resolution must be between 1 and {MAX_RESOLUTION}, got {}x{}",
                self.x_max, self.y_max
            )));
        }
        if self.x_max % 2 != 0 || self.y_max % 2 != 0 {
            return Err(SetupError::ValidationError(format!(
                "Resolution values must be even numbers, got {}x{}",
                self.x_max, self.y_max
            )));
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Gt911Config> {
        self.validate()?;
        let mut bytes = [0u8; CONFIG_LEN];
        bytes[CONFIG_VERSION] = 0x01;
        bytes[X_RESOLUTION..X_RESOLUTION + 2].copy_from_slice(&self.x_max.to_le_bytes());
        bytes[Y_RESOLUTION..Y_RESOLUTION + 2].copy_from_slice(&self.y_max.to_le_bytes());
        bytes[TOUCH_NUMBER] = self.num_touch_points.clamp(1, MAX_TOUCH_POINTS);
        bytes[MODULE_SWITCH_1] = 0x00;
        bytes[MODULE_SWITCH_2] = 0x00;
        bytes[SHAKE_COUNT] = 0x03;
        bytes[FILTER] = self.filter_coefficient;
        bytes[SCREEN_TOUCH_LEVEL] = self.touch_threshold.max(1);
        bytes[CHECKSUM] = checksum(&bytes[..CHECKSUM]);
        bytes[CONFIG_FRESH] = 0x01;
        debug!("Encoded GT911 config {}x{}", self.x_max, self.y_max);
        Ok(Gt911Config { bytes })
    }
}

/// Two's complement of the byte sum, so the covered bytes plus the checksum
/// sum to zero.
fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
        .wrapping_neg()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gt911Config {
    bytes: [u8; CONFIG_LEN],
}

impl Gt911Config {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn version(&self) -> u8 {
        self.bytes[CONFIG_VERSION]
    }

    pub fn x_resolution(&self) -> u16 {
        u16::from_le_bytes([self.bytes[X_RESOLUTION], self.bytes[X_RESOLUTION + 1]])
    }

    pub fn y_resolution(&self) -> u16 {
        u16::from_le_bytes([self.bytes[Y_RESOLUTION], self.bytes[Y_RESOLUTION + 1]])
    }

    pub fn touch_points(&self) -> u8 {
        self.bytes[TOUCH_NUMBER]
    }

    pub fn touch_level(&self) -> u8 {
        self.bytes[SCREEN_TOUCH_LEVEL]
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[CHECKSUM]
    }

    pub fn checksum_is_valid(&self) -> bool {
        checksum(&self.bytes[..CHECKSUM]) == self.bytes[CHECKSUM]
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.bytes)?;
        debug!("Wrote GT911 config to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for Gt911Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg = |offset: usize| BASE_REGISTER + offset as u16;
        let b = &self.bytes;
        writeln!(f, "Config_Version     (0x{:04X}):       0x{:02X}", reg(CONFIG_VERSION), b[CONFIG_VERSION])?;
        writeln!(
            f,
            "X Resolution       (0x{:04X}..{:02X}):   {}",
            reg(X_RESOLUTION),
            reg(X_RESOLUTION + 1) & 0xFF,
            self.x_resolution()
        )?;
        writeln!(
            f,
            "Y Resolution       (0x{:04X}..{:02X}):   {}",
            reg(Y_RESOLUTION),
            reg(Y_RESOLUTION + 1) & 0xFF,
            self.y_resolution()
        )?;
        writeln!(f, "Touch Points       (0x{:04X}):       {}", reg(TOUCH_NUMBER), b[TOUCH_NUMBER])?;
        writeln!(f, "Module_Switch1     (0x{:04X}):       0x{:02X}", reg(MODULE_SWITCH_1), b[MODULE_SWITCH_1])?;
        writeln!(f, "Module_Switch2     (0x{:04X}):       0x{:02X}", reg(MODULE_SWITCH_2), b[MODULE_SWITCH_2])?;
        writeln!(f, "Shake_Count        (0x{:04X}):       {}", reg(SHAKE_COUNT), b[SHAKE_COUNT])?;
        writeln!(f, "Filter             (0x{:04X}):       {}", reg(FILTER), b[FILTER])?;
        writeln!(f, "Screen_Touch_Level (0x{:04X}):       {}", reg(SCREEN_TOUCH_LEVEL), b[SCREEN_TOUCH_LEVEL])?;
        writeln!(f, "Checksum           (0x{:04X}):       0x{:02X}", reg(CHECKSUM), b[CHECKSUM])?;
        write!(f, "Config_Fresh       (0x{:04X}):       0x{:02X}", reg(CONFIG_FRESH), b[CONFIG_FRESH])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub settings: Gt911Settings,
}

pub const PRESETS: [Preset; 3] = [
    Preset {
        name: "7inch",
        settings: Gt911Settings {
            x_max: 1024,
            y_max: 600,
            touch_threshold: 16,
            num_touch_points: 5,
            filter_coefficient: 4,
        },
    },
    Preset {
        name: "5inch",
        settings: Gt911Settings {
            x_max: 800,
            y_max: 480,
            touch_threshold: 20,
            num_touch_points: 5,
            filter_coefficient: 4,
        },
    },
    Preset {
        name: "waveshare7",
        settings: Gt911Settings {
            x_max: 1280,
            y_max: 800,
            touch_threshold: 28,
            num_touch_points: 5,
            filter_coefficient: 4,
        },
    },
];

pub fn preset(name: &str) -> Result<Gt911Settings> {
    let wanted = name.trim().to_ascii_lowercase();
    PRESETS
        .iter()
        .find(|p| p.name == wanted)
        .map(|p| p.settings)
        .ok_or_else(|| {
            let known: Vec<&str> = PRESETS.iter().map(|p| p.name).collect();
            SetupError::ValidationError(format!(
                "Unknown preset '{name}' (known: {})",
                known.join(", ")
            ))
        })
}
