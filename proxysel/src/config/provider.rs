use crate::config::{ConfigError, FileError, RawRootCfg, RawSourceCfg};
use crate::pac::PacLocation;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings of one proxy source, before any selector is built from them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProxyConfig {
    pub name: String,
    /// Proxy list, e.g. `http=a:1;https=b:2` or a single `host:port`.
    pub proxy: Option<String>,
    pub bypass: Option<String>,
    pub pac: Option<PacLocation>,
}

impl RawProxyConfig {
    pub fn is_empty(&self) -> bool {
        self.proxy.is_none() && self.bypass.is_none() && self.pac.is_none()
    }
}

impl From<RawSourceCfg> for RawProxyConfig {
    fn from(cfg: RawSourceCfg) -> Self {
        Self {
            name: cfg.name,
            proxy: cfg.proxy,
            bypass: cfg.bypass,
            pac: cfg.pac,
        }
    }
}

pub trait ConfigProvider {
    fn name(&self) -> &str;

    fn load(&self) -> Result<Vec<RawProxyConfig>, ConfigError>;
}

/// Reads sources from a YAML file. Relative PAC paths are resolved against
/// the directory of the file.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn load_root(&self) -> Result<RawRootCfg, ConfigError> {
        let name = self.path.to_string_lossy().to_string();
        let text = fs::read_to_string(&self.path).map_err(|e| FileError::Io(name.clone(), e))?;
        let mut root: RawRootCfg =
            serde_yaml::from_str(&text).map_err(|e| FileError::Serde(name, e))?;
        let base = self.path.parent().unwrap_or(Path::new("."));
        for source in root.sources.iter_mut() {
            if let Some(PacLocation::File { path }) = &mut source.pac {
                *path = base.join(&*path).to_string_lossy().to_string();
            }
        }
        Ok(root)
    }
}

impl ConfigProvider for FileProvider {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> Result<Vec<RawProxyConfig>, ConfigError> {
        Ok(self
            .load_root()?
            .sources
            .into_iter()
            .map(RawProxyConfig::from)
            .collect())
    }
}

const ENV_PROTOCOLS: [(&str, &str); 4] = [
    ("http_proxy", "http"),
    ("https_proxy", "https"),
    ("ftp_proxy", "ftp"),
    ("socks_proxy", "socks"),
];

/// The conventional `*_proxy` and `no_proxy` environment variables, in
/// either case.
#[derive(Debug, Clone, Default)]
pub struct EnvProvider {
    vars: HashMap<String, String>,
}

impl EnvProvider {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I: IntoIterator<Item = (String, String)>>(vars: I) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }

    fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .or_else(|| self.vars.get(&name.to_ascii_uppercase()))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn config(&self) -> RawProxyConfig {
        let mut entries = Vec::new();
        for (var, key) in ENV_PROTOCOLS {
            if let Some(value) = self.var(var) {
                entries.push(format!("{}={}", key, value));
            }
        }
        if let Some(value) = self.var("all_proxy") {
            entries.push(format!("default={}", value));
        }
        RawProxyConfig {
            name: "env".to_string(),
            proxy: (!entries.is_empty()).then(|| entries.join(";")),
            bypass: self.var("no_proxy").map(no_proxy_to_bypass),
            pac: None,
        }
    }
}

/// `no_proxy` lists domain suffixes such as `.example.com`; bypass lists use
/// wildcards.
fn no_proxy_to_bypass(no_proxy: &str) -> String {
    no_proxy
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.starts_with('.') {
                format!("*{}", s)
            } else {
                s.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

impl ConfigProvider for EnvProvider {
    fn name(&self) -> &str {
        "env"
    }

    fn load(&self) -> Result<Vec<RawProxyConfig>, ConfigError> {
        let config = self.config();
        Ok(if config.proxy.is_some() {
            vec![config]
        } else {
            vec![]
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    configs: Vec<RawProxyConfig>,
}

impl StaticProvider {
    pub fn new(configs: Vec<RawProxyConfig>) -> Self {
        Self { configs }
    }
}

impl ConfigProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self) -> Result<Vec<RawProxyConfig>, ConfigError> {
        Ok(self.configs.clone())
    }
}
