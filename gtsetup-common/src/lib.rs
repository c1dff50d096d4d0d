// gtsetup-common/src/lib.rs
pub mod config;
pub mod error;
pub mod model;

// Re-export key types
pub use config::{Config, LineMatch, Privilege, RebootPolicy};
pub use error::{Result, SetupError};
pub use model::{ArtifactKind, ArtifactSpec};
