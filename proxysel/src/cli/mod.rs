use proxysel::app::SelectorFactory;
use proxysel::config::{EnvProvider, FallbackSetting, RawProxyConfig, StaticProvider};
use proxysel::dispatch::{ListSelector, ProxySpec};
use proxysel::filter::UriFilter;
use proxysel::pac::{parse_pac_result, PacLocation, PacScriptSource, PacSelector};
use anyhow::anyhow;
use clap::{Args, Subcommand, ValueHint};
use colored::Colorize;
use http::Uri;
use std::path::PathBuf;
use tabular::{Row, Table};

#[derive(Debug, Args)]
pub(crate) struct SelectOptions {
    /// Request URI, e.g. https://www.example.com/
    #[clap(value_hint = ValueHint::Url)]
    pub uri: String,
    /// YAML configuration; without it proxy environment variables are used
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Proxy list, e.g. "http=proxy:8080;https=proxy:8443"
    #[arg(long)]
    pub proxy: Option<String>,
    /// Bypass list, e.g. "<local>;*.corp.example;10.0.0.0/8"
    #[arg(long)]
    pub bypass: Option<String>,
    /// PAC script path or URL
    #[arg(long)]
    pub pac: Option<String>,
    /// Print candidates as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum SubCommand {
    /// Show the proxies to try for a URI
    Select(SelectOptions),
    /// Evaluate a PAC script for a URL
    Pac {
        #[clap(value_hint = ValueHint::AnyPath)]
        script: String,
        #[clap(value_hint = ValueHint::Url)]
        url: String,
    },
    /// Test one bypass-list entry against a URI
    Filter {
        #[clap(value_hint = ValueHint::Other)]
        pattern: String,
        #[clap(value_hint = ValueHint::Url)]
        uri: String,
    },
}

pub(crate) fn run(cmd: SubCommand) -> anyhow::Result<()> {
    match cmd {
        SubCommand::Select(opts) => select(opts),
        SubCommand::Pac { script, url } => evaluate_pac(&script, &url),
        SubCommand::Filter { pattern, uri } => test_filter(&pattern, &uri),
    }
}

fn parse_uri(uri: &str) -> anyhow::Result<Uri> {
    uri.parse::<Uri>()
        .map_err(|e| anyhow!("Invalid URI {}: {}", uri, e))
}

fn build_selector(opts: &SelectOptions) -> anyhow::Result<ListSelector> {
    let mut factory = match &opts.config {
        Some(path) => SelectorFactory::from_config_file(path)?,
        None => SelectorFactory::new(),
    };
    let inline = RawProxyConfig {
        name: "cli".to_string(),
        proxy: opts.proxy.clone(),
        bypass: opts.bypass.clone(),
        pac: opts.pac.as_deref().map(PacLocation::parse),
    };
    if !inline.is_empty() {
        factory = factory
            .with_provider(StaticProvider::new(vec![inline]))
            .with_fallback(FallbackSetting::Disabled);
    } else if opts.config.is_none() {
        factory = factory
            .with_provider(EnvProvider::from_env())
            .with_fallback(FallbackSetting::Disabled);
    }
    Ok(factory.build()?)
}

fn select(opts: SelectOptions) -> anyhow::Result<()> {
    let uri = parse_uri(&opts.uri)?;
    let selector = build_selector(&opts)?;
    let proxies = selector.select_all(&uri);
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&proxies)?);
    } else {
        print_candidates(&proxies);
    }
    Ok(())
}

fn print_candidates(proxies: &[ProxySpec]) {
    let mut table = Table::new("{:>} {:<} {:<} {:>}");
    table.add_row(
        Row::new()
            .with_cell("#")
            .with_cell("Type")
            .with_cell("Host")
            .with_cell("Port"),
    );
    for (idx, proxy) in proxies.iter().enumerate() {
        let row = Row::new().with_cell(idx + 1);
        table.add_row(match proxy.endpoint() {
            None => row
                .with_cell("DIRECT".green())
                .with_cell("")
                .with_cell(""),
            Some(e) => row
                .with_cell(e.kind().to_string().yellow())
                .with_cell(e.host())
                .with_cell(e.port()),
        });
    }
    println!("{}", table);
}

fn evaluate_pac(script: &str, url: &str) -> anyhow::Result<()> {
    let uri = parse_uri(url)?;
    let host = uri
        .host()
        .ok_or_else(|| anyhow!("URL {} has no host", url))?;
    let source = PacScriptSource::fetch(&PacLocation::parse(script))
        .map(|content| PacScriptSource::from_script(script, content))?;
    let selector = PacSelector::new(source)?;
    let result = selector.evaluate(&uri.to_string(), proxysel::common::clean_ipv6(host))?;
    println!("{} {}", "Result:".bold(), result);
    print_candidates(&parse_pac_result(&result));
    Ok(())
}

fn test_filter(pattern: &str, uri: &str) -> anyhow::Result<()> {
    let uri = parse_uri(uri)?;
    let filter = UriFilter::parse(pattern).ok_or_else(|| anyhow!("Invalid pattern {}", pattern))?;
    if filter.accept(&uri) {
        println!("{} {} matches {}", "Bypass:".green(), filter, uri);
    } else {
        println!("{} {} does not match {}", "Proxy:".red(), filter, uri);
    }
    Ok(())
}
