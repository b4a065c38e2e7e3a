use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use connect_hooks_codemod::{batch, Config};

/// Rewrite connect()-wrapped React components to use hooks, in place.
#[derive(Parser, Debug)]
#[command(name = "connect-hooks-codemod", version, about)]
struct Cli {
    /// Files to rewrite.
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    let report = batch::run(&cli.paths, &config);
    print!("{report}");
    ExitCode::SUCCESS
}
