// # aliasctl - Load Balancer Alias CLI
//
// Thin command-line front end over alias-core. All lookup, mutation and
// convergence logic lives in the library; this binary only:
// 1. Parses flags and environment variables
// 2. Initializes logging and the runtime
// 3. Builds a backend through the registry
// 4. Runs one workflow and reports the result
//
// ## Commands
//
// - `aliasctl create <alias> <zone> <lb-dns-name> [--no-wait] [--timeout-secs N]`
// - `aliasctl remove <alias> <zone>`
// - `aliasctl status <change-id> [--wait]`
//
// ## Configuration
//
// Every global flag has an environment fallback:
//
// - `ALIAS_BACKEND_TYPE`: Backend type (file, memory)
// - `ALIAS_BACKEND_PATH`: Sandbox file (for the file backend)
// - `ALIAS_PROPAGATION_DELAY_SECS`: Seconds before a sandbox change is INSYNC
// - `ALIAS_WAIT_TIMEOUT_SECS`: Convergence timeout
// - `ALIAS_POLL_INTERVAL_MS`: Delay between status polls
// - `ALIAS_LOG_FORMAT`: Log output format (text, json)
// - `ALIAS_LOG`: Log filter in EnvFilter syntax, overrides `--verbose`
//
// ## Example
//
// ```bash
// export ALIAS_BACKEND_PATH=/var/lib/aliasctl/sandbox.json
//
// aliasctl create www example.com my-lb-1234.us-east-1.elb.amazonaws.com
// aliasctl remove www example.com
// ```

use alias_core::{
    AliasConfig, AliasEngine, BackendConfig, BackendRegistry, CreateAliasRequest, Error,
    RemoveAliasRequest, WaitConfig, WaitOutcome,
};
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug, error};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_FILTER_ENV: &str = "ALIAS_LOG";

/// Exit codes for the different outcomes
///
/// - 0: Success (including an unconfirmed propagation)
/// - 1: Configuration or startup error
/// - 2: Runtime error reported by the core
#[derive(Debug, Clone, Copy)]
enum AliasExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<AliasExitCode> for ExitCode {
    fn from(code: AliasExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser)]
#[command(name = "aliasctl")]
#[command(about = "Point DNS alias records at load balancers", long_about = None)]
#[command(version)]
struct Cli {
    /// Backend type
    #[arg(long, env = "ALIAS_BACKEND_TYPE", value_enum, default_value_t = BackendKind::File)]
    backend: BackendKind,

    /// Sandbox file for the file backend
    #[arg(long, env = "ALIAS_BACKEND_PATH", default_value = "aliasctl-sandbox.json")]
    sandbox: String,

    /// Seconds before a sandbox change reports INSYNC
    #[arg(long, env = "ALIAS_PROPAGATION_DELAY_SECS", default_value_t = 0)]
    propagation_delay_secs: u64,

    /// Maximum time to wait for a change to sync
    #[arg(long, global = true, env = "ALIAS_WAIT_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,

    /// Delay between status polls
    #[arg(long, env = "ALIAS_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Log output format
    #[arg(long, env = "ALIAS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// JSON sandbox file shared between runs
    File,
    /// In-process store, empty on every run
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update an alias pointing at a load balancer
    Create {
        /// Alias name (e.g. www, www.example.com)
        alias: String,

        /// Zone name (e.g. example.com)
        zone: String,

        /// DNS name of the load balancer
        lb_dns_name: String,

        /// Return as soon as the change is submitted
        #[arg(long)]
        no_wait: bool,
    },

    /// Remove an alias
    Remove {
        /// Alias name
        alias: String,

        /// Zone name
        zone: String,
    },

    /// Show the status of a submitted change
    Status {
        /// Change id printed by create or remove
        change_id: String,

        /// Wait for the change to sync
        #[arg(long)]
        wait: bool,
    },
}

impl Cli {
    /// Build the library configuration from the parsed flags
    fn alias_config(&self) -> Result<AliasConfig> {
        let backend = match self.backend {
            BackendKind::File => BackendConfig::File {
                path: self.sandbox.clone(),
                propagation_delay_secs: self.propagation_delay_secs,
            },
            BackendKind::Memory => BackendConfig::Memory,
        };

        let config = AliasConfig {
            backend,
            wait: WaitConfig::new(
                Duration::from_millis(self.poll_interval_ms),
                Duration::from_secs(self.timeout_secs),
            ),
            ..AliasConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_format) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AliasExitCode::ConfigError.into();
    }

    let config = match cli.alias_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return AliasExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AliasExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run(config, cli.command));
    match result {
        Ok(()) => AliasExitCode::Success.into(),
        Err(e) => {
            eprintln!("Error [{}]: {}", e.category(), e);
            match e {
                Error::Config(_) => AliasExitCode::ConfigError.into(),
                _ => AliasExitCode::RuntimeError.into(),
            }
        }
    }
}

/// Install the global tracing subscriber
///
/// Logs go to stderr so stdout carries only command output.
fn init_logging(verbose: bool, format: LogFormat) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

/// Run one command against a freshly built backend
async fn run(config: AliasConfig, command: Commands) -> alias_core::Result<()> {
    let registry = BackendRegistry::with_builtin();
    let backend = registry.create_backend(&config.backend).await?;
    debug!(backend = %backend.name, "backend ready");

    // Events are reported through the tracing output; the receiver is unused.
    let (engine, _events) = AliasEngine::new(backend, config)?;

    match command {
        Commands::Create {
            alias,
            zone,
            lb_dns_name,
            no_wait,
        } => {
            let mut request = CreateAliasRequest::new(alias, zone, lb_dns_name);
            if no_wait {
                request = request.no_wait();
            }
            let report = engine.create_alias(request).await?;

            println!(
                "{} -> {} (zone {})",
                report.record_name, report.load_balancer.dns_name, report.zone.name
            );
            println!("Change {} is {}", report.change.id, report.change.state);
            if let Some(outcome) = report.wait {
                print_outcome(&outcome);
            }
        }

        Commands::Remove { alias, zone } => {
            let report = engine.remove_alias(RemoveAliasRequest::new(alias, zone)).await?;

            println!("Removed {} (zone {})", report.record_name, report.zone.name);
            println!("Change {} is {}", report.change.id, report.change.state);
        }

        Commands::Status { change_id, wait } => {
            if wait {
                let outcome = engine.wait_for_change(&change_id).await?;
                print_outcome(&outcome);
            } else {
                let status = engine.change_status(&change_id).await?;
                println!(
                    "Change {} is {} (submitted {})",
                    status.id,
                    status.state,
                    status.submitted_at.to_rfc3339()
                );
                if let Some(comment) = status.comment.filter(|c| !c.is_empty()) {
                    println!("Comment: {}", comment);
                }
            }
        }
    }

    Ok(())
}

fn print_outcome(outcome: &WaitOutcome) {
    match outcome {
        WaitOutcome::Converged { .. } => println!("Done."),
        WaitOutcome::TimedOut { change_id, .. } => println!(
            "It is taking longer than expected to synchronize the change to all DNS servers. \
             You can check the status with:\n\n    aliasctl status {} --wait\n",
            change_id
        ),
    }
}
