// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tollgate - egress-safe HTTP transport.
//!
//! Operator CLI for inspecting the address classifier, the safe dial
//! strategy and the client factory against the effective configuration.

mod classify;
mod dial;
mod fetch;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tollgate_config::TollgateConfig;
use tollgate_core::TollgateError;
use tracing::error;

/// Tollgate - egress-safe HTTP transport.
#[derive(Parser, Debug)]
#[command(name = "tollgate", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify IP literals as public or non-public.
    Classify {
        /// Addresses to classify; IPv6 may be bracketed.
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Resolve and connect to host:port through the safe dialer.
    Dial {
        /// `host:port` or `[v6]:port`.
        target: String,
        /// Resolution and connect timeout in seconds. Defaults to egress.timeout_secs.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// GET a URL through the client factory and print the status.
    Fetch {
        url: String,
        /// Do not block private networks for this request.
        #[arg(long)]
        allow_private: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => tollgate_config::load_and_validate_path(path),
        None => tollgate_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            tollgate_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log.level);

    let use_color = !cli.plain && std::io::stdout().is_terminal();
    match run(cli.command, &config, use_color).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Commands,
    config: &TollgateConfig,
    use_color: bool,
) -> Result<(), TollgateError> {
    match command {
        Commands::Classify { addresses } => {
            let policy = egress_policy(config)?;
            classify::run_classify(&addresses, &policy, use_color)
        }
        Commands::Dial { target, timeout } => {
            let timeout = timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.egress.timeout());
            dial::run_dial(&target, timeout, egress_policy(config)?).await
        }
        Commands::Fetch { url, allow_private } => {
            let client_config = config
                .egress
                .client_config()
                .map_err(|e| TollgateError::Config(e.to_string()))?;
            fetch::run_fetch(&url, client_config, allow_private).await
        }
        Commands::Config => {
            let rendered = config
                .to_toml()
                .map_err(|e| TollgateError::Internal(format!("unable to render config: {e}")))?;
            print!("{rendered}");
            Ok(())
        }
    }
}

fn egress_policy(config: &TollgateConfig) -> Result<tollgate_egress::AddressPolicy, TollgateError> {
    config
        .egress
        .policy()
        .map_err(|e| TollgateError::Config(e.to_string()))
}

/// Blocked destinations get their own message so they are not mistaken for
/// network trouble.
fn error_message(err: &TollgateError) -> String {
    if err.is_blocked() {
        format!("tollgate: blocked by egress policy: {err}")
    } else {
        format!("tollgate: {err}")
    }
}

fn report_error(err: &TollgateError) {
    error!(blocked = err.is_blocked(), "command failed: {err}");
    eprintln!("{}", error_message(err));
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the config level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tollgate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::EgressError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tollgate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = parse(&["classify", "10.0.0.1", "::1"]);
        assert!(
            matches!(cli.command, Commands::Classify { ref addresses } if addresses.len() == 2)
        );

        let cli = parse(&["dial", "example.com:443", "--timeout", "3"]);
        assert!(matches!(cli.command, Commands::Dial { timeout: Some(3), .. }));

        let cli = parse(&["--plain", "fetch", "https://a.example", "--allow-private"]);
        assert!(cli.plain);
        assert!(matches!(cli.command, Commands::Fetch { allow_private: true, .. }));
    }

    #[test]
    fn classify_requires_an_address() {
        assert!(Cli::try_parse_from(["tollgate", "classify"]).is_err());
    }

    #[test]
    fn blocked_errors_have_distinct_message() {
        let blocked = TollgateError::from(EgressError::Blocked {
            host: "internal.example".into(),
        });
        assert!(error_message(&blocked).starts_with("tollgate: blocked by egress policy:"));

        let other = TollgateError::from(EgressError::ResolutionFailed {
            host: "nx.example".into(),
            reason: "no such host".into(),
        });
        assert!(error_message(&other).starts_with("tollgate: unable to resolve"));
    }

    #[tokio::test]
    async fn config_command_prints_defaults() {
        run(Commands::Config, &TollgateConfig::default(), false)
            .await
            .unwrap();
    }

    #[test]
    fn default_config_builds_a_guarded_policy() {
        let config = tollgate_config::load_and_validate_str("").unwrap();
        assert!(egress_policy(&config).unwrap().is_default());
        assert!(config.egress.client_config().unwrap().block_private_networks);
    }
}
