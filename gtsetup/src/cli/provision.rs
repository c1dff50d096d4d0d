// gtsetup/src/cli/provision.rs
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use gtsetup_common::config::{Config, Privilege};
use gtsetup_common::error::Result;
use gtsetup_core::{EnsureOutcome, ProvisionOptions, Provisioner};
use tracing::instrument;

#[derive(Debug, Args, Default)]
pub struct ProvisionArgs {
    /// Install everything but do not restart the host.
    #[arg(long)]
    no_reboot: bool,

    /// Seconds to wait before restarting.
    #[arg(long, value_name = "SECS")]
    reboot_delay: Option<u64>,
}

impl ProvisionArgs {
    #[instrument(skip(self, config))]
    pub async fn run(&self, config: &Config) -> Result<()> {
        let mut config = config.clone();
        if let Some(secs) = self.reboot_delay {
            config.reboot.delay = Duration::from_secs(secs);
        }

        if config.privilege == Privilege::Sudo {
            println!(
                "{}",
                "Some steps need root and will run through sudo; you may be asked for your password."
                    .yellow()
            );
        }

        // Report before the restart is requested.
        let provisioner = Provisioner::new(&config)?;
        let report = provisioner.run(ProvisionOptions { reboot: false }).await?;

        println!(
            "{}{} {}",
            "==> ".bold().blue(),
            config.boot_config_path.display().to_string().bold(),
            boot_config_status(&report.boot_config)
        );
        for path in &report.installed {
            println!("{}{}", "==> ".bold().blue(), path.display().to_string().green());
        }
        if self.no_reboot {
            println!(
                "{}",
                "Provisioning complete. Reboot to load the goodix overlay.".green()
            );
        } else {
            println!(
                "{}{}",
                "==> ".bold().blue(),
                format!("Rebooting in {}s.", config.reboot.delay.as_secs()).bold()
            );
            provisioner.reboot().await;
        }
        Ok(())
    }
}

fn boot_config_status(outcome: &EnsureOutcome) -> String {
    match outcome {
        EnsureOutcome::Created => "created".to_string(),
        EnsureOutcome::Appended => "updated".to_string(),
        EnsureOutcome::AlreadyPresent { matched, exact: true } => format!("already had `{matched}`"),
        EnsureOutcome::AlreadyPresent { matched, exact: false } => {
            format!("already had `{matched}` (prefix match only)")
        }
    }
}
