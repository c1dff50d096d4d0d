// gtsetup-net/src/lib.rs
pub mod http;
pub mod validation;

pub use http::{build_http_client, fetch_artifact, fetch_to_file};
pub use validation::validate_url;
