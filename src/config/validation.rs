use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("public_base_url must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),

    #[error("downloads_dir must not be empty")]
    EmptyDownloadsDir,

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Validate a loaded configuration before anything is built from it.
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    let base_url = &config.server.public_base_url;
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ValidationError::InvalidBaseUrl(base_url.clone()));
    }

    if config.server.downloads_dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyDownloadsDir);
    }

    if config.fetch.connect_timeout_secs == 0 {
        return Err(ValidationError::ZeroValue("fetch.connect_timeout_secs"));
    }

    if config.fetch.job_timeout_secs == 0 {
        return Err(ValidationError::ZeroValue("fetch.job_timeout_secs"));
    }

    if config.fetch.max_clip_bytes.as_u64() == 0 {
        return Err(ValidationError::ZeroValue("fetch.max_clip_bytes"));
    }

    Ok(())
}
