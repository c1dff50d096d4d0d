// gtsetup-core/src/provision.rs
//! The provisioning run: boot config line, three artifacts, reboot.
//!
//! Steps run strictly in order and the first failure ends the run. Nothing
//! is rolled back; artifacts installed before the failure stay installed.

use std::fmt;
use std::path::{Path, PathBuf};

use gtsetup_common::config::Config;
use gtsetup_common::error::Result;
use gtsetup_common::model::ArtifactSpec;
use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::boot_config::{ensure_line, EnsureOutcome};
use crate::install::install_artifact;
use crate::reboot::request_reboot;
use crate::work_dir::WorkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    BootConfig,
    Fetch(String),
    Install(String),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::BootConfig => f.write_str("boot config update"),
            Step::Fetch(name) => write!(f, "download of {name}"),
            Step::Install(name) => write!(f, "install of {name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionOptions {
    pub reboot: bool,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self { reboot: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub boot_config: EnsureOutcome,
    pub installed: Vec<PathBuf>,
    pub reboot_requested: bool,
}

pub struct Provisioner<'a> {
    config: &'a Config,
    client: Client,
    work_dir: WorkDir,
}

impl<'a> Provisioner<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client: gtsetup_net::build_http_client()?,
            work_dir: WorkDir::prepare(config)?,
        })
    }

    /// Directory the artifacts are downloaded into.
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Runs every step, stopping at the first error. The returned error is
    /// a `StepFailed` naming the step.
    #[instrument(skip(self), fields(boot_config = %self.config.boot_config_path.display()))]
    pub async fn run(&self, options: ProvisionOptions) -> Result<ProvisionReport> {
        let config = self.config;

        info!("Ensuring `{}` in {}", config.overlay_line, config.boot_config_path.display());
        let boot_config = ensure_line(
            &config.boot_config_path,
            &config.overlay_line,
            config.line_match,
            config.privilege,
        )
        .map_err(|e| e.in_step(Step::BootConfig))?;

        let mut installed = Vec::with_capacity(config.artifacts.len());
        for artifact in &config.artifacts {
            self.fetch_and_install(artifact).await?;
            installed.push(artifact.destination.clone());
        }

        if options.reboot {
            self.reboot().await;
        } else {
            debug!("Reboot not requested by this run");
        }

        Ok(ProvisionReport {
            boot_config,
            installed,
            reboot_requested: options.reboot,
        })
    }

    /// Waits the configured delay and requests the restart. Callers that ran
    /// with `reboot: false` use this once they have reported the outcome.
    pub async fn reboot(&self) {
        request_reboot(&self.config.reboot, self.config.privilege).await;
    }

    async fn fetch_and_install(&self, artifact: &ArtifactSpec) -> Result<()> {
        let name = artifact.kind.to_string();
        info!("Downloading {}", name);
        let local = gtsetup_net::fetch_artifact(&self.client, artifact, self.work_dir.path())
            .await
            .map_err(|e| e.in_step(Step::Fetch(name.clone())))?;
        debug!("{} downloaded to {}", name, local.display());
        install_artifact(&local, artifact, self.config.privilege)
            .map_err(|e| e.in_step(Step::Install(name)))
    }
}
