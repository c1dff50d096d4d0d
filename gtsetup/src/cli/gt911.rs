// gtsetup/src/cli/gt911.rs
use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;
use gtsetup_common::config::{Config, FIRMWARE_FILE_NAME};
use gtsetup_common::error::Result;
use gtsetup_core::gt911::{self, Gt911Settings, PRESETS};
use tracing::debug;

#[derive(Debug, Subcommand)]
pub enum Gt911Command {
    /// List the built-in display presets.
    Presets,
    /// Print the decoded register values of a config.
    Show(SettingsArgs),
    /// Write a config blob to a file.
    Save {
        #[command(flatten)]
        settings: SettingsArgs,
        #[arg(short, long, default_value = FIRMWARE_FILE_NAME)]
        output: PathBuf,
    },
    /// Install a config blob into the firmware directory.
    Install {
        #[command(flatten)]
        settings: SettingsArgs,
        /// Reload the goodix driver afterwards.
        #[arg(long)]
        reload_driver: bool,
    },
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Start from a preset (see `gtsetup gt911 presets`).
    #[arg(long, default_value = "7inch")]
    preset: String,
    #[arg(long, value_parser = clap::value_parser!(u16).range(2..=4094))]
    x_max: Option<u16>,
    #[arg(long, value_parser = clap::value_parser!(u16).range(2..=4094))]
    y_max: Option<u16>,
    /// Screen touch level.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=255))]
    threshold: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
    touches: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
    filter: Option<u8>,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<Gt911Settings> {
        let mut settings = gt911::preset(&self.preset)?;
        if let Some(v) = self.x_max {
            settings.x_max = v;
        }
        if let Some(v) = self.y_max {
            settings.y_max = v;
        }
        if let Some(v) = self.threshold {
            settings.touch_threshold = v;
        }
        if let Some(v) = self.touches {
            settings.num_touch_points = v;
        }
        if let Some(v) = self.filter {
            settings.filter_coefficient = v;
        }
        debug!("Resolved GT911 settings: {:?}", settings);
        Ok(settings)
    }
}

impl Gt911Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Presets => {
                println!("{}", "Available presets:".bold());
                for preset in PRESETS.iter() {
                    let s = preset.settings;
                    println!("\n{}:", preset.name.cyan());
                    println!("  Resolution:         {}x{}", s.x_max, s.y_max);
                    println!("  Touch Threshold:    {}", s.touch_threshold);
                    println!("  Number of Touches:  {}", s.num_touch_points);
                    println!("  Filter Coefficient: {}", s.filter_coefficient);
                }
            }
            Self::Show(settings) => {
                let blob = settings.resolve()?.encode()?;
                println!("{}", "=== GT911 Configuration Details ===".bold());
                println!("{blob}");
            }
            Self::Save { settings, output } => {
                let blob = settings.resolve()?.encode()?;
                blob.save(output)?;
                println!(
                    "{} {}",
                    "Configuration saved to".green(),
                    output.display().to_string().green()
                );
            }
            Self::Install {
                settings,
                reload_driver,
            } => {
                let blob = settings.resolve()?.encode()?;
                gt911::install_config(&blob, config)?;
                println!(
                    "{} {}",
                    "Configuration installed to".green(),
                    config.firmware_config_path().display().to_string().green()
                );
                if *reload_driver {
                    gt911::reload_driver(config.privilege).await?;
                } else {
                    println!("Driver not reloaded. Changes will take effect after reboot.");
                }
            }
        }
        Ok(())
    }
}
