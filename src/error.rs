use thiserror::Error;

/// Failures surfaced by a gateway at runtime.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backing store refused or lost a write.
    #[error("preference backend error: {0}")]
    Backend(String),

    #[error("invalid preference snapshot: {0}")]
    Snapshot(#[from] toml::de::Error),

    #[error("unable to encode preference snapshot: {0}")]
    Encode(#[from] toml::ser::Error),
}
