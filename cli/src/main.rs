use std::path::PathBuf;

use clap::{Parser, Subcommand};
use harness_logs::config::{Config, HarnessArgs};
use harness_logs::download;
use harness_logs::log_service::LogServiceClient;
use harness_logs::models::DownloadLogsParams;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "harness-logs-cli", about = "Harness execution log CLI")]
struct Cli {
    #[command(flatten)]
    harness: HarnessArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the most recent lines of a local log archive
    Analyze {
        /// Path to a logs.zip archive
        archive: PathBuf,

        /// Number of lines (clamped to the configured maximum)
        #[arg(short = 'n', long)]
        lines: Option<i64>,
    },

    /// Download an execution's logs and show the most recent lines
    Fetch {
        /// Plan execution identifier
        plan_execution_id: String,

        /// Directory to save logs-<id>/logs.zip under
        #[arg(short, long, default_value = ".")]
        dir: String,

        /// Number of lines (clamped to the configured maximum)
        #[arg(short = 'n', long)]
        lines: Option<i64>,

        /// Direct log key prefix, skipping the execution lookup
        #[arg(long)]
        log_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::from(cli.harness);

    match cli.command {
        Commands::Analyze { archive, lines } => {
            analyze(&cfg, archive, lines).await?;
        }
        Commands::Fetch {
            plan_execution_id,
            dir,
            lines,
            log_key,
        } => {
            fetch(&cfg, plan_execution_id, dir, lines, log_key).await?;
        }
    }

    Ok(())
}

// ─── Commands ───

async fn analyze(cfg: &Config, archive: PathBuf, lines: Option<i64>) -> anyhow::Result<()> {
    let num_lines = cfg.lines.clamp(lines);
    let tail = harness_logs::analyzer::analyze_archive_file(archive, num_lines, cfg.read).await?;
    println!("{}", tail);
    Ok(())
}

async fn fetch(
    cfg: &Config,
    plan_execution_id: String,
    dir: String,
    lines: Option<i64>,
    log_key: Option<String>,
) -> anyhow::Result<()> {
    let client = LogServiceClient::new(cfg)?;
    let params = DownloadLogsParams {
        plan_execution_id,
        logs_directory: dir,
        num_lines: lines,
        log_key,
        org_id: None,
        project_id: None,
    };

    println!("Downloading logs for {}...", params.plan_execution_id);
    let outcome = download::download_execution_logs(&client, cfg, &params).await?;
    println!("{}", outcome.summary());
    Ok(())
}
