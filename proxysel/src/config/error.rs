use crate::dispatch::EndpointError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File error: {0}")]
    File(#[from] FileError),
    #[error("Invalid fallback: {0}")]
    Fallback(#[from] ConfigParseError),
    #[error("Internal error: {0}")]
    Internal(&'static str),
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("{0} io error: {1}")]
    Io(String, std::io::Error),
    #[error("{0} deserialization error: {1}")]
    Serde(String, serde_yaml::Error),
}

/// A malformed proxy-list or proxy-settings entry. These are logged and the
/// entry is skipped.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigParseError {
    #[error("Missing '=' in entry \"{0}\"")]
    MissingSeparator(String),
    #[error("Unknown protocol \"{0}\"")]
    UnknownProtocol(String),
    #[error("Bad proxy \"{0}\": {1}")]
    Url(String, url::ParseError),
    #[error("Bad proxy \"{0}\": {1}")]
    Endpoint(String, EndpointError),
    #[error("Proxy \"{0}\" has no host")]
    MissingHost(String),
}
