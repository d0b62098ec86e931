//! # Application Insights Output CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 指标转发（JSON lines → Application Insights）
//! - 有界超时的优雅关闭

mod cli;
mod commands;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_describe, run_output, run_sample_config, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Application Insights output starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_output(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::SampleConfig => run_sample_config(),
        Commands::Describe => run_describe(),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging (and Prometheus for `run --metrics-port`) based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(observability_config(cli))
}

fn observability_config(cli: &Cli) -> observability::ObservabilityConfig {
    let level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let metrics_port = match &cli.command {
        Commands::Run(args) if args.metrics_port != 0 && !args.dry_run => Some(args.metrics_port),
        _ => None,
    };

    observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: level.to_string(),
    }
}
