use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Names downloaded photos and videos and moves them into place.
#[derive(Parser, Debug)]
#[command(name = "ferry", version, about, long_about = None)]
pub struct Args {
    /// Configuration file (TOML, YAML or JSON). Defaults to `config.toml`
    /// in the platform configuration directory, if present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// More logging on stderr. Repeat for trace output. `RUST_LOG` wins.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Read requests as JSON lines on stdin and answer on stdout.
    Serve,
    /// Validate the configuration and show what sample files would be named.
    Check,
}

impl Args {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["ferry", "serve"], Command::Serve, None, "info")]
    #[case(&["ferry", "-v", "check"], Command::Check, None, "debug")]
    #[case(&["ferry", "serve", "-vvv", "--config", "/etc/ferry.toml"], Command::Serve, Some("/etc/ferry.toml"), "trace")]
    fn test_parse(
        #[case] argv: &[&str],
        #[case] command: Command,
        #[case] config: Option<&str>,
        #[case] level: &str,
    ) {
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.command, command);
        assert_eq!(args.config, config.map(PathBuf::from));
        assert_eq!(args.log_level(), level);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["ferry"]).is_err());
    }
}
