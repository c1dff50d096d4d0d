// gtsetup-net/src/validation.rs
use gtsetup_common::error::{Result, SetupError};
use url::Url;

/// Validates a URL, ensuring it uses the HTTP or HTTPS scheme.
pub fn validate_url(url_str: &str) -> Result<()> {
    let url = Url::parse(url_str)
        .map_err(|e| SetupError::ValidationError(format!("Failed to parse URL '{url_str}': {e}")))?;
    match url.scheme() {
        "https" | "http" => Ok(()),
        other => Err(SetupError::ValidationError(format!(
            "Invalid URL scheme for '{url_str}': Must be http or https, but got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("https://example.com/goodix.dtbo").is_ok());
        assert!(validate_url("http://127.0.0.1:8000/goodix.dtbo").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(matches!(
            validate_url("file:///boot/overlays/goodix.dtbo"),
            Err(SetupError::ValidationError(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(SetupError::ValidationError(_))
        ));
    }
}
