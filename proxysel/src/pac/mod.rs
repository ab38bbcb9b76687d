mod engine;
pub mod functions;
mod result;
mod source;

pub use engine::*;
pub use result::*;
pub use source::*;

use crate::common::clean_ipv6;
use crate::dispatch::{ProxySelector, ProxySpec, SelectError};
use http::Uri;
use thiserror::Error;

pub const ENTRY_POINT: &str = "FindProxyForURL";
pub const ENTRY_POINT_EX: &str = "FindProxyForURLEx";

/// A PAC entry point threw, was missing, or returned a non-string.
#[derive(Error, Debug, Clone)]
#[error("{function} failed: {message}")]
pub struct ScriptEvaluationError {
    pub function: String,
    pub message: String,
    /// Exact script text handed to the engine.
    pub script: String,
    /// Failure of the attempt made before this one, if any.
    #[source]
    pub previous: Option<Box<ScriptEvaluationError>>,
}

impl ScriptEvaluationError {
    pub fn new(function: &str, message: &str, script: &str) -> Self {
        Self {
            function: function.to_string(),
            message: message.to_string(),
            script: script.to_string(),
            previous: None,
        }
    }
}

/// Asks a PAC script for the proxies of each URI.
pub struct PacSelector<E = QuickJsEngine> {
    source: PacScriptSource,
    engine: E,
}

impl PacSelector<QuickJsEngine> {
    pub fn new(source: PacScriptSource) -> Result<Self, ScriptFetchError> {
        Self::with_engine(source, QuickJsEngine::new())
    }
}

impl<E: ScriptEngine> PacSelector<E> {
    pub fn with_engine(source: PacScriptSource, engine: E) -> Result<Self, ScriptFetchError> {
        if !source.is_script_valid() {
            return Err(ScriptFetchError::Empty(source.name().to_string()));
        }
        Ok(Self { source, engine })
    }

    pub fn source(&self) -> &PacScriptSource {
        &self.source
    }

    /// Runs `FindProxyForURLEx` and falls back to `FindProxyForURL` once.
    pub fn evaluate(&self, url: &str, host: &str) -> Result<String, ScriptEvaluationError> {
        let script = self.source.script_content().unwrap_or_default();
        let first = match self.invoke(script, ENTRY_POINT_EX, url, host) {
            Ok(r) => return Ok(r),
            Err(e) => e,
        };
        tracing::debug!(
            "PAC {}: {}, retrying with {}",
            self.source.name(),
            first,
            ENTRY_POINT
        );
        self.invoke(script, ENTRY_POINT, url, host)
            .map_err(|mut e| {
                e.previous = Some(Box::new(first));
                e
            })
    }

    fn invoke(
        &self,
        script: &str,
        function: &str,
        url: &str,
        host: &str,
    ) -> Result<String, ScriptEvaluationError> {
        let invocation = build_invocation(script, function, url, host);
        self.engine
            .eval(self.source.name(), &invocation)
            .map_err(|e| ScriptEvaluationError::new(function, &e.to_string(), &invocation))
    }
}

impl<E: ScriptEngine> ProxySelector for PacSelector<E> {
    fn select(&self, uri: &Uri) -> Result<Vec<ProxySpec>, SelectError> {
        let Some(host) = uri.host() else {
            return Ok(vec![]);
        };
        let url = uri.to_string();
        let result = self.evaluate(&url, clean_ipv6(host))?;
        tracing::debug!("PAC {} returned \"{}\" for {}", self.source.name(), result, url);
        Ok(parse_pac_result(&result))
    }

    fn name(&self) -> &str {
        self.source.name()
    }
}

/// The script followed by a call of `function`, e.g.
/// `...\n;FindProxyForURL("http://a/", "a")`.
pub fn build_invocation(script: &str, function: &str, url: &str, host: &str) -> String {
    format!(
        "{}\n;{}({}, {})",
        script,
        function,
        js_string_literal(url),
        js_string_literal(host)
    )
}

fn js_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const LEGACY_ONLY: &str = "\
        function FindProxyForURL(url, host) {
            if (dnsDomainIs(host, '.corp.example')) return 'PROXY corp:3128';
            return 'DIRECT';
        }";

    const WITH_EX: &str = "\
        function FindProxyForURLEx(url, host) { return 'PROXY ex:1; SOCKS5 [::1]:9050'; }
        function FindProxyForURL(url, host) { return 'PROXY legacy:1'; }";

    struct MockEngine {
        calls: Mutex<Vec<String>>,
        ex_result: Result<String, EngineError>,
    }

    impl ScriptEngine for MockEngine {
        fn eval(&self, _name: &str, script: &str) -> Result<String, EngineError> {
            self.calls.lock().unwrap().push(script.to_string());
            if script.ends_with(&format!(";{}(\"http://a/\", \"a\")", ENTRY_POINT_EX)) {
                self.ex_result.clone()
            } else {
                Err(EngineError::Exception("legacy broken".to_string()))
            }
        }
    }

    fn selector(script: &str) -> PacSelector {
        PacSelector::new(PacScriptSource::from_script("test", script)).unwrap()
    }

    #[test]
    fn test_build_invocation() {
        assert_eq!(
            build_invocation("var a;", ENTRY_POINT, "http://x/?q=\"1\"", "x"),
            "var a;\n;FindProxyForURL(\"http://x/?q=\\\"1\\\"\", \"x\")"
        );
        assert_eq!(js_string_literal("a\\b\n\u{1}"), "\"a\\\\b\\n\\u0001\"");
    }

    #[test]
    fn test_invalid_source_rejected() {
        assert!(matches!(
            PacSelector::new(PacScriptSource::from_script("empty", "")),
            Err(ScriptFetchError::Empty(_))
        ));
    }

    #[test]
    fn test_legacy_fallback() {
        let pac = selector(LEGACY_ONLY);
        let uri: Uri = "https://www.corp.example/index.html".parse().unwrap();
        assert_eq!(
            pac.select(&uri).unwrap(),
            vec![ProxySpec::http("corp", 3128).unwrap()]
        );
        let uri: Uri = "http://www.other.example/".parse().unwrap();
        assert_eq!(pac.select(&uri).unwrap(), vec![ProxySpec::Direct]);
    }

    #[test]
    fn test_ex_preferred() {
        let pac = selector(WITH_EX);
        let uri: Uri = "http://[2001:db8::1]:8080/".parse().unwrap();
        assert_eq!(
            pac.select(&uri).unwrap(),
            vec![
                ProxySpec::http("ex", 1).unwrap(),
                ProxySpec::socks("::1", 9050).unwrap()
            ]
        );
    }

    #[test]
    fn test_host_passed_without_brackets() {
        let pac = selector("function FindProxyForURL(url, host) { return 'PROXY ' + host + ':1'; }");
        assert_eq!(pac.evaluate("http://[::1]/", "::1").unwrap(), "PROXY ::1:1");
        let uri: Uri = "http://[::1]/".parse().unwrap();
        assert_eq!(pac.select(&uri).unwrap().len(), 1);
    }

    #[test]
    fn test_no_host() {
        let pac = selector(LEGACY_ONLY);
        let uri: Uri = "/relative".parse().unwrap();
        assert!(pac.select(&uri).unwrap().is_empty());
    }

    #[test]
    fn test_both_entry_points_fail() {
        let pac = selector("function FindProxyForURL(url, host) { throw new Error('nope'); }");
        let err = pac.evaluate("http://x/", "x").unwrap_err();
        assert_eq!(err.function, ENTRY_POINT);
        assert!(err.message.contains("nope"));
        assert!(err
            .script
            .ends_with("\n;FindProxyForURL(\"http://x/\", \"x\")"));
        let previous = err.previous.unwrap();
        assert_eq!(previous.function, ENTRY_POINT_EX);
        assert!(previous.script.ends_with(";FindProxyForURLEx(\"http://x/\", \"x\")"));

        let uri: Uri = "http://x/".parse().unwrap();
        assert!(matches!(pac.select(&uri), Err(SelectError::Script(_))));
    }

    #[test]
    fn test_non_string_result_falls_back() {
        let pac = selector(
            "function FindProxyForURLEx(url, host) { return 42; }
             function FindProxyForURL(url, host) { return 'SOCKS s'; }",
        );
        let uri: Uri = "http://x/".parse().unwrap();
        assert_eq!(
            pac.select(&uri).unwrap(),
            vec![ProxySpec::socks("s", 1080).unwrap()]
        );
    }

    #[test]
    fn test_mock_engine() {
        let engine = MockEngine {
            calls: Mutex::new(vec![]),
            ex_result: Ok("PROXY m:2".to_string()),
        };
        let pac =
            PacSelector::with_engine(PacScriptSource::from_script("mock", "script"), engine).unwrap();
        assert_eq!(pac.evaluate("http://a/", "a").unwrap(), "PROXY m:2");
        assert_eq!(pac.engine.calls.lock().unwrap().len(), 1);

        let engine = MockEngine {
            calls: Mutex::new(vec![]),
            ex_result: Err(EngineError::NotAString("undefined".to_string())),
        };
        let pac =
            PacSelector::with_engine(PacScriptSource::from_script("mock", "script"), engine).unwrap();
        let err = pac.evaluate("http://a/", "a").unwrap_err();
        assert_eq!(err.message, "Script exception: legacy broken");
        let calls = pac.engine.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            [
                "script\n;FindProxyForURLEx(\"http://a/\", \"a\")",
                "script\n;FindProxyForURL(\"http://a/\", \"a\")"
            ]
        );
    }
}
