//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Application Insights output - forward collected metrics to Azure Application Insights
#[derive(Parser, Debug)]
#[command(
    name = "appinsights-output",
    author,
    version,
    about = "Forward metrics to Azure Application Insights",
    long_about = "Hosts the Application Insights metrics output.\n\n\
                  Reads metrics as JSON lines, translates every numeric field into a \n\
                  named telemetry measurement and ships them through a buffered client, \n\
                  closing with a bounded flush on end of input or Ctrl+C."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "APPINSIGHTS_OUTPUT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "APPINSIGHTS_OUTPUT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Forward metrics read from a file or stdin
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Print an annotated sample configuration
    SampleConfig,

    /// Print a one-line description of the output
    Describe,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "appinsights.toml",
        env = "APPINSIGHTS_OUTPUT_CONFIG"
    )]
    pub config: PathBuf,

    /// Metrics input (JSON lines); reads stdin when omitted or "-"
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the instrumentation key from configuration
    #[arg(long, env = "APPINSIGHTS_INSTRUMENTATION_KEY", hide_env_values = true)]
    pub instrumentation_key: Option<String>,

    /// Override the close timeout (e.g. "5s", "0s" = wait indefinitely)
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Override the aggregate metric policy
    #[arg(long, value_enum)]
    pub aggregate_policy: Option<AggregatePolicyArg>,

    /// Log batches instead of sending them
    #[arg(long)]
    pub log_only: bool,

    /// Metrics per write call
    #[arg(long, default_value = "1000", env = "APPINSIGHTS_OUTPUT_BATCH_SIZE")]
    pub batch_size: usize,

    /// Validate configuration and exit without reading input
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "APPINSIGHTS_OUTPUT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "appinsights.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Aggregate policy as a CLI value
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum AggregatePolicyArg {
    /// Skip aggregate metrics, keep the rest of the batch
    SkipMetric,
    /// Drop the rest of the batch at the first aggregate metric
    AbortBatch,
}

impl From<AggregatePolicyArg> for contracts::AggregatePolicy {
    fn from(arg: AggregatePolicyArg) -> Self {
        match arg {
            AggregatePolicyArg::SkipMetric => Self::SkipMetric,
            AggregatePolicyArg::AbortBatch => Self::AbortBatch,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
