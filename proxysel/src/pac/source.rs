use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ScriptFetchError {
    #[error("{0} io error: {1}")]
    Io(String, std::io::Error),
    #[error("{0} http error: {1}")]
    Http(String, reqwest::Error),
    #[error("Invalid PAC url {0}: {1}")]
    Url(String, url::ParseError),
    #[error("PAC script {0} is empty")]
    Empty(String),
}

/// Where a PAC script comes from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum PacLocation {
    #[serde(alias = "file")]
    File { path: String },
    #[serde(alias = "url")]
    Url { url: String },
    #[serde(alias = "inline")]
    Inline { script: String },
}

impl PacLocation {
    /// `http(s)://` and `file://` strings become URLs, anything else a path.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("file:")
        {
            PacLocation::Url {
                url: s.to_string(),
            }
        } else {
            PacLocation::File {
                path: s.to_string(),
            }
        }
    }
}

/// Turns `file://x` into `file:///x`; other URLs are returned untouched.
pub fn repair_file_url(url: &str) -> String {
    match url.strip_prefix("file://") {
        Some(rest) if !rest.starts_with('/') => format!("file:///{}", rest),
        _ => url.to_string(),
    }
}

/// A PAC script fetched once and cached.
#[derive(Debug, Clone)]
pub struct PacScriptSource {
    name: String,
    content: Option<String>,
}

impl PacScriptSource {
    pub fn from_script<S: Into<String>>(name: &str, script: S) -> Self {
        let script = script.into();
        Self {
            name: name.to_string(),
            content: (!script.trim().is_empty()).then_some(script),
        }
    }

    /// Never fails; an unavailable script leaves the source invalid.
    pub fn load(name: &str, location: &PacLocation) -> Self {
        match Self::fetch(location) {
            Ok(script) => Self::from_script(name, script),
            Err(e) => {
                tracing::warn!("Failed to load PAC script {}: {}", name, e);
                Self {
                    name: name.to_string(),
                    content: None,
                }
            }
        }
    }

    pub fn fetch(location: &PacLocation) -> Result<String, ScriptFetchError> {
        let script = match location {
            PacLocation::File { path } => {
                fs::read_to_string(path).map_err(|e| ScriptFetchError::Io(path.clone(), e))?
            }
            PacLocation::Url { url } => fetch_url(url)?,
            PacLocation::Inline { script } => script.clone(),
        };
        if script.trim().is_empty() {
            let what = match location {
                PacLocation::File { path } => path.clone(),
                PacLocation::Url { url } => url.clone(),
                PacLocation::Inline { .. } => "inline".to_string(),
            };
            return Err(ScriptFetchError::Empty(what));
        }
        Ok(script)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_script_valid(&self) -> bool {
        self.content.is_some()
    }

    pub fn script_content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

fn fetch_url(raw: &str) -> Result<String, ScriptFetchError> {
    let repaired = repair_file_url(raw);
    let url = url::Url::parse(&repaired).map_err(|e| ScriptFetchError::Url(raw.to_string(), e))?;
    if url.scheme() == "file" {
        let path = url.to_file_path().map_err(|_| {
            ScriptFetchError::Url(raw.to_string(), url::ParseError::InvalidDomainCharacter)
        })?;
        return fs::read_to_string(&path).map_err(|e| ScriptFetchError::Io(raw.to_string(), e));
    }
    let http_error = |e| ScriptFetchError::Http(raw.to_string(), e);
    tracing::debug!("Fetching PAC script from {}", url);
    reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(http_error)?
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .map_err(http_error)
}
