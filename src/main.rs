//! comptree - shell completion over a command grammar
//!
//! Resolves completion candidates for a partially typed command line
//! against a grammar file, and generates the shell glue that calls back
//! into it.
//!
//! # Usage
//!
//! ```bash
//! # Candidates for `kubectl get po<TAB>`
//! comptree complete --grammar kubectl.toml -- kubectl get po
//!
//! # Bash glue for kubectl
//! comptree completion bash --program kubectl --grammar kubectl.toml
//! ```

use tracing_subscriber::EnvFilter;

use comptree::cli::CliInterface;
use comptree::error::Result;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "COMPTREE_LOG";

/// Application entry point
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Parse arguments, set up logging and dispatch the subcommand
fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.handle_subcommand()
}

/// Initialize logging system based on verbosity level
///
/// Logs go to stderr so completion output on stdout stays clean.
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.into()));

    // Build subscriber with level filter
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Configure timestamps
    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
