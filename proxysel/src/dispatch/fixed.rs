use crate::dispatch::{ProxySelector, ProxySpec, SelectError};
use http::Uri;

/// Always answers with the same spec.
#[derive(Debug, Clone)]
pub struct FixedSelector {
    spec: ProxySpec,
}

impl FixedSelector {
    pub fn new(spec: ProxySpec) -> Self {
        Self { spec }
    }

    pub fn direct() -> Self {
        Self::new(ProxySpec::Direct)
    }
}

impl ProxySelector for FixedSelector {
    fn select(&self, _uri: &Uri) -> Result<Vec<ProxySpec>, SelectError> {
        Ok(vec![self.spec.clone()])
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[test]
fn test_fixed() {
    let spec = ProxySpec::http("http_proxy.unit-test.invalid", 8090).unwrap();
    let selector = FixedSelector::new(spec.clone());
    for uri in ["http://host1.unit-test.invalid/", "https://host1.unit-test.invalid/"] {
        let result = selector.select(&Uri::from_static(uri)).unwrap();
        assert_eq!(result, vec![spec.clone()]);
    }
}
