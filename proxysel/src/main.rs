use clap::Parser;
use proxysel::external::{init_tracing, LogFormat};
use std::process::ExitCode;

mod cli;

#[derive(Debug, Parser)]
#[command(name = "proxysel", about = "Find the proxies to use for a URI")]
struct ProgramArgs {
    /// Emit logs as JSON
    #[arg(long)]
    pub json_log: bool,
    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "proxysel=info")]
    pub log: String,
    #[command(subcommand)]
    pub cmd: cli::SubCommand,
}

fn main() -> ExitCode {
    let args = ProgramArgs::parse();
    let format = if args.json_log {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    if let Err(e) = init_tracing(format, &args.log) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    match cli::run(args.cmd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
