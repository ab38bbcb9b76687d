use crate::config::{
    build_protocol_dispatch_selector, parse_proxy_settings, ConfigError, ConfigProvider,
    EnvProvider, FallbackSetting, FileProvider, RawProxyConfig, StaticProvider,
};
use crate::dispatch::{
    BypassListSelector, FixedSelector, ListSelector, ProtocolDispatchSelector, ProxyKind,
    ProxySelector,
};
use crate::pac::{PacLocation, PacScriptSource, PacSelector};
use std::path::Path;

/// Builds the selector tree from configuration providers.
///
/// Each source contributes, in order, its PAC selector (when the script could
/// be loaded) and then its fixed proxies behind the bypass list.
pub struct SelectorFactory {
    providers: Vec<Box<dyn ConfigProvider>>,
    fallback: FallbackSetting,
}

impl Default for SelectorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorFactory {
    pub fn new() -> Self {
        Self {
            providers: vec![],
            fallback: FallbackSetting::Env,
        }
    }

    /// Sources and fallback are taken from a single read of the file.
    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        let root = FileProvider::new(path).load_root()?;
        let configs = root
            .sources
            .into_iter()
            .map(RawProxyConfig::from)
            .collect();
        Ok(Self::new()
            .with_provider(StaticProvider::new(configs))
            .with_fallback(root.fallback))
    }

    pub fn with_provider<P: ConfigProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackSetting) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn build(&self) -> Result<ListSelector, ConfigError> {
        let mut list = ListSelector::default();
        for provider in &self.providers {
            let configs = provider.load()?;
            tracing::info!(
                "Loaded {} proxy source(s) from {}",
                configs.len(),
                provider.name()
            );
            for config in configs {
                for selector in build_source(&config) {
                    list.push(selector);
                }
            }
        }
        if let Some(fallback) = self.build_fallback()? {
            list.set_fallback(fallback);
        }
        Ok(list)
    }

    fn build_fallback(&self) -> Result<Option<Box<dyn ProxySelector>>, ConfigError> {
        Ok(match &self.fallback {
            FallbackSetting::Disabled => None,
            FallbackSetting::Proxy(setting) => {
                let spec = parse_proxy_settings(ProxyKind::Http, setting)?;
                Some(Box::new(FixedSelector::new(spec)) as Box<dyn ProxySelector>)
            }
            FallbackSetting::Env => {
                let config = EnvProvider::from_env().config();
                config
                    .proxy
                    .is_some()
                    .then(|| build_fixed(&config))
            }
        })
    }
}

/// Selectors for one source; empty when it yields nothing usable.
pub fn build_source(config: &RawProxyConfig) -> Vec<Box<dyn ProxySelector>> {
    let mut selectors: Vec<Box<dyn ProxySelector>> = vec![];
    if let Some(location) = &config.pac {
        if let Some(pac) = create_pac_selector(&config.name, location) {
            selectors.push(Box::new(pac));
        }
    }
    if config.proxy.is_some() || config.bypass.is_some() {
        selectors.push(build_fixed(config));
    }
    if selectors.is_empty() {
        tracing::warn!("Proxy source {} provides no selector", config.name);
    }
    selectors
}

fn build_fixed(config: &RawProxyConfig) -> Box<dyn ProxySelector> {
    let dispatch = config
        .proxy
        .as_deref()
        .map(build_protocol_dispatch_selector)
        .unwrap_or_else(ProtocolDispatchSelector::new);
    match &config.bypass {
        Some(bypass) => Box::new(BypassListSelector::from_list(bypass, dispatch)),
        None => Box::new(dispatch),
    }
}

/// `None` when the script cannot be loaded.
pub fn create_pac_selector(name: &str, location: &PacLocation) -> Option<PacSelector> {
    match PacSelector::new(PacScriptSource::load(name, location)) {
        Ok(selector) => {
            tracing::info!("Using PAC script {}", name);
            Some(selector)
        }
        Err(e) => {
            tracing::warn!("PAC source {} unavailable: {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ProxySpec;
    use http::Uri;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_build_tree() {
        let factory = SelectorFactory::new()
            .with_provider(StaticProvider::new(vec![
                RawProxyConfig {
                    name: "pac".to_string(),
                    pac: Some(PacLocation::Inline {
                        script: "function FindProxyForURL(u, h) { return h == 'pac.example' ? 'PROXY p:1' : ''; }"
                            .to_string(),
                    }),
                    ..Default::default()
                },
                RawProxyConfig {
                    name: "manual".to_string(),
                    proxy: Some("http=a:1;https=b:2".to_string()),
                    bypass: Some("<local>;*.corp.example".to_string()),
                    pac: None,
                },
            ]))
            .with_fallback(FallbackSetting::Proxy("fb:3128".to_string()));
        let list = factory.build().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.select_all(&uri("http://pac.example/")),
            vec![
                ProxySpec::http("p", 1).unwrap(),
                ProxySpec::http("a", 1).unwrap(),
                ProxySpec::Direct
            ]
        );
        assert_eq!(
            list.select_all(&uri("https://www.corp.example/")),
            vec![ProxySpec::Direct]
        );
        assert_eq!(
            list.select_all(&uri("ftp://files.example/")),
            vec![ProxySpec::http("fb", 3128).unwrap(), ProxySpec::Direct]
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_invalid_pac_skipped() {
        let config = RawProxyConfig {
            name: "broken".to_string(),
            pac: Some(PacLocation::File {
                path: "/nonexistent/broken.pac".to_string(),
            }),
            ..Default::default()
        };
        assert!(build_source(&config).is_empty());
        assert!(logs_contain("PAC source broken unavailable"));
    }

    #[test]
    fn test_config_file_read_once() {
        let dir = std::env::temp_dir().join(format!("proxysel-app-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yml");
        std::fs::write(
            &path,
            "sources:\n  - name: first\n    proxy: a:1\nfallback: none\n",
        )
        .unwrap();
        let factory = SelectorFactory::from_config_file(&path).unwrap();
        std::fs::write(
            &path,
            "sources:\n  - name: second\n    proxy: b:2\nfallback: \"fb:3128\"\n",
        )
        .unwrap();
        let list = factory.build().unwrap();
        assert_eq!(
            list.select_all(&uri("http://x/")),
            vec![ProxySpec::http("a", 1).unwrap(), ProxySpec::Direct]
        );
        assert_eq!(factory.fallback, FallbackSetting::Disabled);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_bad_fallback() {
        let factory =
            SelectorFactory::new().with_fallback(FallbackSetting::Proxy("http://:1".to_string()));
        assert!(matches!(factory.build(), Err(ConfigError::Fallback(_))));
    }
}
