use crate::config::ConfigParseError;
use crate::pac::PacLocation;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct RawRootCfg {
    #[serde(default)]
    pub sources: Vec<RawSourceCfg>,
    #[serde(default)]
    pub fallback: FallbackSetting,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RawSourceCfg {
    pub name: String,
    #[serde(default)]
    pub pac: Option<PacLocation>,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub bypass: Option<String>,
}

/// What to ask when no configured source has an answer.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum FallbackSetting {
    /// Proxy environment variables.
    #[default]
    Env,
    Disabled,
    /// A fixed proxy in proxy-settings form.
    Proxy(String),
}

impl TryFrom<String> for FallbackSetting {
    type Error = ConfigParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "env" => Ok(FallbackSetting::Env),
            "none" => Ok(FallbackSetting::Disabled),
            "" => Err(ConfigParseError::MissingHost(value)),
            _ => Ok(FallbackSetting::Proxy(value.trim().to_string())),
        }
    }
}

impl From<FallbackSetting> for String {
    fn from(value: FallbackSetting) -> Self {
        match value {
            FallbackSetting::Env => "env".to_string(),
            FallbackSetting::Disabled => "none".to_string(),
            FallbackSetting::Proxy(p) => p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cfg() {
        let raw = r#"
sources:
  - name: corp
    pac: { type: url, url: "http://wpad/wpad.dat" }
  - name: manual
    proxy: "http=proxy:8080;socks=socks:1080"
    bypass: "<local>;*.corp.example;10.0.0.0/8"
fallback: none
"#;
        let cfg: RawRootCfg = serde_yaml::from_str(raw).unwrap();
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(
            cfg.sources[0].pac,
            Some(PacLocation::Url {
                url: "http://wpad/wpad.dat".to_string()
            })
        );
        assert_eq!(
            cfg.sources[1].proxy.as_deref(),
            Some("http=proxy:8080;socks=socks:1080")
        );
        assert_eq!(cfg.fallback, FallbackSetting::Disabled);
    }

    #[test]
    fn test_fallback_setting() {
        let cfg: RawRootCfg = serde_yaml::from_str("sources: []").unwrap();
        assert_eq!(cfg.fallback, FallbackSetting::Env);
        let cfg: RawRootCfg = serde_yaml::from_str("fallback: \"proxy:3128\"").unwrap();
        assert_eq!(cfg.fallback, FallbackSetting::Proxy("proxy:3128".to_string()));
        assert!(serde_yaml::from_str::<RawRootCfg>("fallback: \"\"").is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_yaml::from_str::<RawRootCfg>("source: []").is_err());
        assert!(serde_yaml::from_str::<RawRootCfg>("sources: [{name: a, prxy: b}]").is_err());
    }
}
