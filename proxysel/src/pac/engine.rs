use crate::pac::functions::{self, PacClock};
use rquickjs::class::Trace;
use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{Class, Context, Ctx, Runtime, Value};
use thiserror::Error;

/// Namespace object the native helpers are installed under.
pub const HELPER_NAMESPACE: &str = "__pacutil";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Script engine unavailable: {0}")]
    Setup(String),
    #[error("Script exception: {0}")]
    Exception(String),
    #[error("Script returned {0} instead of a string")]
    NotAString(String),
}

/// Runs PAC script text and hands back its completion value.
pub trait ScriptEngine: Send + Sync {
    /// `name` identifies the script in logs.
    fn eval(&self, name: &str, script: &str) -> Result<String, EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

/// Helpers visible to PAC scripts as global functions.
pub const PAC_FUNCTIONS: &[(&str, Arity)] = &[
    ("isPlainHostName", Arity::Fixed(1)),
    ("dnsDomainIs", Arity::Fixed(2)),
    ("localHostOrDomainIs", Arity::Fixed(2)),
    ("isResolvable", Arity::Fixed(1)),
    ("isInNet", Arity::Fixed(3)),
    ("dnsResolve", Arity::Fixed(1)),
    ("myIpAddress", Arity::Fixed(0)),
    ("dnsDomainLevels", Arity::Fixed(1)),
    ("shExpMatch", Arity::Fixed(2)),
    ("weekdayRange", Arity::Variadic),
    ("dateRange", Arity::Variadic),
    ("timeRange", Arity::Variadic),
    ("isResolvableEx", Arity::Fixed(1)),
    ("isInNetEx", Arity::Fixed(2)),
    ("dnsResolveEx", Arity::Fixed(1)),
    ("myIpAddressEx", Arity::Fixed(0)),
    ("sortIpAddressList", Arity::Fixed(1)),
    ("getClientVersion", Arity::Fixed(0)),
    ("alert", Arity::Fixed(1)),
];

/// Global aliases forwarding to the helper namespace, e.g.
/// `function dnsDomainIs(arg0,arg1) { return __pacutil.dnsDomainIs(arg0,arg1); }`.
pub fn alias_script() -> String {
    let mut out = String::new();
    for (name, arity) in PAC_FUNCTIONS {
        match arity {
            Arity::Fixed(n) => {
                let params = (0..*n)
                    .map(|i| format!("arg{}", i))
                    .collect::<Vec<_>>()
                    .join(",");
                out.push_str(&format!(
                    "function {name}({params}) {{ return {HELPER_NAMESPACE}.{name}({params}); }}\n"
                ));
            }
            Arity::Variadic => out.push_str(&format!(
                "function {name}() {{ return {HELPER_NAMESPACE}.{name}.apply({HELPER_NAMESPACE}, arguments); }}\n"
            )),
        }
    }
    out
}

/// QuickJS based engine. A fresh runtime is created for each evaluation, so
/// the engine can be shared between threads and scripts cannot leak state
/// from one request into the next.
#[derive(Debug, Clone)]
pub struct QuickJsEngine {
    aliases: String,
}

impl QuickJsEngine {
    pub fn new() -> Self {
        Self {
            aliases: alias_script(),
        }
    }

    fn setup<'js>(&self, ctx: &Ctx<'js>, name: &str) -> rquickjs::Result<()> {
        let util = Class::instance(
            ctx.clone(),
            PacUtil {
                id: name.to_string(),
            },
        )?;
        ctx.globals().set(HELPER_NAMESPACE, util)?;
        let console = Class::instance(
            ctx.clone(),
            Console {
                id: name.to_string(),
            },
        )?;
        ctx.globals().set("console", console)?;
        ctx.eval::<(), _>(self.aliases.as_bytes())
    }
}

impl Default for QuickJsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine for QuickJsEngine {
    fn eval(&self, name: &str, script: &str) -> Result<String, EngineError> {
        let runtime = Runtime::new().map_err(|e| EngineError::Setup(e.to_string()))?;
        let ctx = Context::full(&runtime).map_err(|e| EngineError::Setup(e.to_string()))?;
        ctx.with(|ctx| {
            self.setup(&ctx, name)
                .map_err(|e| EngineError::Setup(describe(&ctx, e)))?;
            let value = ctx
                .eval::<Value, _>(script.as_bytes())
                .map_err(|e| EngineError::Exception(describe(&ctx, e)))?;
            match value.as_string() {
                Some(s) => s
                    .to_string()
                    .map_err(|e| EngineError::Exception(describe(&ctx, e))),
                None => Err(EngineError::NotAString(value.type_of().as_str().to_string())),
            }
        })
    }
}

fn describe(ctx: &Ctx<'_>, e: rquickjs::Error) -> String {
    if !matches!(e, rquickjs::Error::Exception) {
        return e.to_string();
    }
    let v = ctx.catch();
    if let Some(ex) = v.as_exception() {
        format!(
            "{}{}",
            ex.message().unwrap_or_else(|| "MISSING MSG".to_string()),
            ex.line()
                .map_or_else(String::default, |l| format!(" in line {}", l))
        )
    } else if let Some(s) = v.as_string() {
        s.to_string().unwrap_or_default()
    } else {
        format!("{:?}", v)
    }
}

fn strings(args: Rest<Coerced<String>>) -> Vec<String> {
    args.0.into_iter().map(|s| s.0).collect()
}

#[derive(Debug, Clone, Trace)]
#[rquickjs::class]
struct PacUtil {
    id: String,
}

#[rquickjs::methods(rename_all = "camelCase")]
impl PacUtil {
    pub fn is_plain_host_name(&self, host: String) -> bool {
        functions::is_plain_host_name(&host)
    }

    pub fn dns_domain_is(&self, host: String, domain: String) -> bool {
        functions::dns_domain_is(&host, &domain)
    }

    pub fn local_host_or_domain_is(&self, host: String, domain: String) -> bool {
        functions::local_host_or_domain_is(&host, &domain)
    }

    pub fn is_resolvable(&self, host: String) -> bool {
        functions::is_resolvable(&host)
    }

    pub fn is_in_net(&self, host: String, pattern: String, mask: String) -> bool {
        functions::is_in_net(&host, &pattern, &mask)
    }

    pub fn dns_resolve(&self, host: String) -> Option<String> {
        functions::dns_resolve(&host)
    }

    pub fn my_ip_address(&self) -> String {
        functions::my_ip_address()
    }

    pub fn dns_domain_levels(&self, host: String) -> i32 {
        functions::dns_domain_levels(&host)
    }

    pub fn sh_exp_match(&self, s: String, pattern: String) -> bool {
        functions::sh_exp_match(&s, &pattern)
    }

    pub fn weekday_range(&self, args: Rest<Coerced<String>>) -> bool {
        functions::weekday_range(&strings(args), &PacClock::now())
    }

    pub fn date_range(&self, args: Rest<Coerced<String>>) -> bool {
        functions::date_range(&strings(args), &PacClock::now())
    }

    pub fn time_range(&self, args: Rest<Coerced<String>>) -> bool {
        functions::time_range(&strings(args), &PacClock::now())
    }

    pub fn is_resolvable_ex(&self, host: String) -> bool {
        functions::is_resolvable_ex(&host)
    }

    pub fn is_in_net_ex(&self, host: String, prefix: String) -> bool {
        functions::is_in_net_ex(&host, &prefix)
    }

    pub fn dns_resolve_ex(&self, host: String) -> String {
        functions::dns_resolve_ex(&host)
    }

    pub fn my_ip_address_ex(&self) -> String {
        functions::my_ip_address_ex()
    }

    pub fn sort_ip_address_list(&self, list: String) -> String {
        functions::sort_ip_address_list(&list)
    }

    pub fn get_client_version(&self) -> String {
        functions::get_client_version()
    }

    pub fn alert(&self, message: Coerced<String>) {
        tracing::info!("[pac:{}]:{}", self.id, message.0);
    }
}

#[derive(Debug, Clone, Trace)]
#[rquickjs::class]
struct Console {
    id: String,
}

#[rquickjs::methods]
impl Console {
    pub fn log(&self, str: Coerced<String>) {
        tracing::info!("[pac:{}]:{}", self.id, str.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_script() {
        let aliases = alias_script();
        assert!(aliases.contains(
            "function dnsDomainIs(arg0,arg1) { return __pacutil.dnsDomainIs(arg0,arg1); }"
        ));
        assert!(aliases.contains("function myIpAddress() { return __pacutil.myIpAddress(); }"));
        assert!(aliases.contains(
            "function timeRange() { return __pacutil.timeRange.apply(__pacutil, arguments); }"
        ));
        assert_eq!(aliases.lines().count(), PAC_FUNCTIONS.len());
    }

    #[test]
    fn test_eval_string() {
        let engine = QuickJsEngine::new();
        let result = engine.eval("test", "'PROXY ' + 'a:1'").unwrap();
        assert_eq!(result, "PROXY a:1");
    }

    #[test]
    fn test_helpers_callable() {
        let engine = QuickJsEngine::new();
        let script = "\
            var r = [];
            r.push(isPlainHostName('intranet'));
            r.push(dnsDomainIs('www.example.com', '.example.com'));
            r.push(isInNet('10.1.2.3', '10.0.0.0', '255.0.0.0'));
            r.push(isInNetEx('10.1.2.3', '10.0.0.0/8'));
            r.push(shExpMatch('www.example.com', '*.example.*'));
            r.push(dnsDomainLevels('www.example.com'));
            r.push(dnsResolve('10.1.2.3'));
            r.push(sortIpAddressList('10.0.0.2;::1'));
            r.push(typeof weekdayRange('MON', 'SUN'));
            r.push(typeof timeRange(0, 23));
            r.join(',')
        ";
        assert_eq!(
            engine.eval("helpers", script).unwrap(),
            "true,true,true,true,true,2,10.1.2.3,::1;10.0.0.2,boolean,boolean"
        );
    }

    #[test]
    fn test_fresh_context_per_eval() {
        let engine = QuickJsEngine::new();
        engine
            .eval("first", "var leaked = 'x'; dnsDomainIs = null; 'DIRECT'")
            .unwrap();
        assert_eq!(
            engine
                .eval("second", "typeof leaked + ',' + typeof dnsDomainIs")
                .unwrap(),
            "undefined,function"
        );
    }

    #[test]
    fn test_huge_time_components() {
        let engine = QuickJsEngine::new();
        assert_eq!(
            engine
                .eval("time", "String(timeRange(2000000, 0, 2000001, 0))")
                .unwrap(),
            "false"
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_alert_logged() {
        let engine = QuickJsEngine::new();
        engine
            .eval("alerting", "alert('hello'); console.log(42); 'DIRECT'")
            .unwrap();
        assert!(logs_contain("[pac:alerting]:hello"));
        assert!(logs_contain("[pac:alerting]:42"));
    }

    #[test]
    fn test_eval_errors() {
        let engine = QuickJsEngine::new();
        assert!(matches!(
            engine.eval("throw", "throw new Error('bad')"),
            Err(EngineError::Exception(msg)) if msg.contains("bad")
        ));
        assert!(matches!(
            engine.eval("missing", "FindProxyForURLEx('a', 'b')"),
            Err(EngineError::Exception(_))
        ));
        assert_eq!(
            engine.eval("number", "1 + 1"),
            Err(EngineError::NotAString("int".to_string()))
        );
    }
}
