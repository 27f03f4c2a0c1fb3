mod config;
mod server;

use config::{MirrorOverrides, RelhookConfig, ServeOverrides};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use console::style;
use relhook_core::{FetchOutcome, SelectMode, WebhookHandler};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "relhook")]
#[command(about = "Mirror the latest GitHub release of a repository on webhook")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to relhook.toml (default: search upward from the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    mirror: MirrorArgs,
}

#[derive(ClapArgs, Debug)]
struct MirrorArgs {
    /// Repository to mirror, as owner/name
    #[arg(long, global = true)]
    repository: Option<String>,

    /// GitHub API token (default: RELHOOK_TOKEN or GITHUB_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// What to download: "assets" or "release"
    #[arg(long, global = true)]
    mode: Option<SelectMode>,

    /// List targets without downloading them (--report-only=false overrides the config file)
    #[arg(
        long,
        global = true,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    report_only: Option<bool>,

    /// Directory downloads are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Maximum number of downloads in flight
    #[arg(long, global = true)]
    max_concurrent: Option<usize>,

    /// Seconds a download may stall before it fails
    #[arg(long, global = true)]
    read_timeout: Option<u64>,
}

impl From<MirrorArgs> for MirrorOverrides {
    fn from(args: MirrorArgs) -> Self {
        MirrorOverrides {
            repository: args.repository,
            token: args.token,
            api_base: args.api_base,
            mode: args.mode,
            report_only: args.report_only,
            output_dir: args.output_dir,
            max_concurrent: args.max_concurrent,
            read_timeout_secs: args.read_timeout,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Listen for webhook calls and mirror the latest release on each one
    Serve {
        /// Address to listen on (default: 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default: 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Route of the hook (default: /rels/hook)
        #[arg(long)]
        path: Option<String>,

        /// Answer failures with their HTTP status instead of 200
        #[arg(long)]
        strict_status: bool,
    },

    /// Mirror the latest release once and exit
    Run,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn run() -> Result<i32> {
    let args = Args::parse();
    init_logging(args.verbose);

    let file_config = match &args.config {
        Some(path) => Some(RelhookConfig::load_file(path)?),
        None => RelhookConfig::load_from_cwd()?,
    };

    let mut mirror = config::resolve_mirror_config(
        file_config.as_ref(),
        config::env_var,
        &MirrorOverrides::from(args.mirror),
    )?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {}", e))?;

    match args.command {
        Commands::Serve {
            host,
            port,
            path,
            strict_status,
        } => {
            let overrides = ServeOverrides {
                host,
                port,
                path,
                always_ok_status: strict_status.then_some(false),
            };
            let settings = config::resolve_serve_settings(file_config.as_ref(), &overrides);
            mirror = mirror.with_always_ok_status(settings.always_ok_status);

            let handler = WebhookHandler::new(mirror).context("Invalid mirror configuration")?;
            server::serve(&rt, &handler, &settings)
        }
        Commands::Run => {
            let handler = WebhookHandler::new(mirror).context("Invalid mirror configuration")?;
            rt.block_on(run_once(&handler))
        }
    }
}

async fn run_once(handler: &WebhookHandler) -> Result<i32> {
    let config = handler.config();
    println!(
        "{} Mirroring latest release of {} ({})",
        style("Relhook").green().bold(),
        style(&config.repository).white().bold(),
        config.mode.as_str()
    );

    let outcomes = handler
        .run()
        .await
        .with_context(|| format!("Failed to look up the latest release of {}", config.repository))?;

    if outcomes.is_empty() {
        println!("{} Nothing to download.", style("Info:").cyan());
        return Ok(0);
    }

    for outcome in &outcomes {
        print_outcome(outcome);
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        eprintln!(
            "{} {} of {} downloads failed",
            style("Error:").red().bold(),
            failed,
            outcomes.len()
        );
        return Ok(1);
    }

    if config.report_only {
        println!("{} {} targets listed", style("Success:").green().bold(), outcomes.len());
    } else {
        let bytes: u64 = outcomes.iter().map(|o| o.bytes_written).sum();
        println!(
            "{} {} files written ({} bytes)",
            style("Success:").green().bold(),
            outcomes.len(),
            bytes
        );
    }
    Ok(0)
}

fn print_outcome(outcome: &FetchOutcome) {
    match (&outcome.error, &outcome.destination) {
        (Some(err), _) => println!(
            "  {} {} ({})",
            style("-").red(),
            style(&outcome.target).white().bold(),
            style(err).red()
        ),
        (None, Some(path)) => println!(
            "  {} {} => {} ({} bytes)",
            style("-").green(),
            style(&outcome.target).white().bold(),
            path.display(),
            style(outcome.bytes_written).yellow()
        ),
        (None, None) => println!(
            "  {} {} {}",
            style("-").cyan(),
            style(&outcome.target).white().bold(),
            style(outcome.target.location()).yellow()
        ),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_only_flag_forms() {
        let args = Args::try_parse_from(["relhook", "run"]).unwrap();
        assert_eq!(args.mirror.report_only, None);

        let args = Args::try_parse_from(["relhook", "run", "--report-only"]).unwrap();
        assert_eq!(args.mirror.report_only, Some(true));

        let args = Args::try_parse_from(["relhook", "--report-only=false", "run"]).unwrap();
        assert_eq!(args.mirror.report_only, Some(false));
    }

    #[test]
    fn test_serve_arguments() {
        let args = Args::try_parse_from([
            "relhook",
            "serve",
            "--port",
            "8080",
            "--strict-status",
            "--read-timeout",
            "30",
        ])
        .unwrap();

        assert_eq!(args.mirror.read_timeout, Some(30));
        match args.command {
            Commands::Serve {
                port, strict_status, ..
            } => {
                assert_eq!(port, Some(8080));
                assert!(strict_status);
            }
            Commands::Run => panic!("Expected serve"),
        }
    }
}
