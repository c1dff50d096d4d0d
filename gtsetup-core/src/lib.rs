// gtsetup-core/src/lib.rs

pub mod boot_config;
pub mod gt911;
pub mod install;
pub mod privilege;
pub mod provision;
pub mod reboot;
pub mod work_dir;

// Re-export key types for easier use by the CLI crate
pub use boot_config::{ensure_line, EnsureOutcome};
pub use provision::{ProvisionOptions, ProvisionReport, Provisioner, Step};
