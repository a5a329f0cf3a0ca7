//! `ferry` names downloaded photos and videos and moves them into place.
//!
//! `ferry serve` speaks JSON lines: requests on stdin, responses on stdout,
//! logs on stderr. `ferry check` validates the configuration and previews
//! the names it produces.

mod check;
mod cli;
mod error;
mod request;
mod serve;

use crate::cli::{Args, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use ferry_config::Config;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const CRATES: [&str; 5] = ["ferry", "ferry_config", "ferry_download", "ferry_naming", "ferry_storage"];

fn init_tracing(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(CRATES.iter().map(|name| format!("{name}={level}")).collect::<Vec<_>>().join(","))
    });
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match args.command {
        Command::Serve => serve::run(config).await,
        Command::Check => {
            for line in check::report(&config, ferry_download::local_now()) {
                println!("{line}");
            }
            Ok(())
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:?}");
            ExitCode::FAILURE
        },
    }
}
