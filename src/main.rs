use clap::{Parser, Subcommand};
use harness_logs::config::{Config, HarnessArgs};
use harness_logs::mcp;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "harness-logs", about = "Harness execution log tools over MCP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the log tools over stdio
    Stdio {
        #[command(flatten)]
        harness: HarnessArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stdio { harness } => {
            let cfg = Config::from(harness);
            if cfg.account_id.is_empty() {
                tracing::warn!("No account id configured; download_execution_logs will fail");
            }
            mcp::run_mcp_server(cfg).await?;
        }
    }

    Ok(())
}
