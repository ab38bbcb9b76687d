use crate::config::ConfigError;
use chrono::Timelike;
use std::str::FromStr;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct SystemTime;

impl FormatTime for SystemTime {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        let time = chrono::prelude::Local::now();
        write!(
            w,
            "{:02}:{:02}:{:02}.{:03}",
            time.hour() % 24,
            time.minute(),
            time.second(),
            time.timestamp_subsec_millis()
        )
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Logs go to stderr so that command output on stdout stays parseable.
/// `RUST_LOG` overrides `default_directive`.
pub fn init_tracing(format: LogFormat, default_directive: &str) -> Result<(), ConfigError> {
    let layer = match format {
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_timer(SystemTime)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_timer(SystemTime)
            .boxed(),
    };
    tracing_subscriber::registry()
        .with(layer)
        .with(
            EnvFilter::builder()
                .with_default_directive(
                    Directive::from_str(default_directive)
                        .map_err(|_| ConfigError::Internal("Tracing filter"))?,
                )
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| ConfigError::Internal("Tracing already initialized"))
}
