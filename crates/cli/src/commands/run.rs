//! `run` command implementation.

use anyhow::{Context, Result};
use dispatcher::OUTPUT_NAME;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{open_input, Pipeline};

/// Execute the `run` command
pub async fn run_output(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut config = if args.config.exists() {
        config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else if let Some(ref key) = args.instrumentation_key {
        info!(
            config = %args.config.display(),
            "Configuration file not found, using defaults with the given instrumentation key"
        );
        contracts::OutputConfig::new(key.clone())
    } else {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    };

    // Apply CLI overrides
    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config).context("Invalid configuration")?;

    info!(
        timeout = %humantime::format_duration(config.timeout),
        aggregate_policy = ?config.aggregate_policy,
        transport = ?config.client.transport,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let mut output = dispatcher::create_output(OUTPUT_NAME, config)?;
    output.connect().context("Failed to connect output")?;

    let input = open_input(args.input.as_deref()).await?;
    let mut pipeline = Pipeline::new(args.batch_size);

    info!("Forwarding metrics...");

    let forwarded = tokio::select! {
        result = pipeline.forward(&mut output, input) => result,
        _ = setup_shutdown_signal() => {
            warn!("Received shutdown signal, closing output...");
            Ok(())
        }
    };
    if let Err(ref e) = forwarded {
        warn!(error = %e, "Forwarding stopped, closing output");
    }

    let stats = pipeline.finish(&mut output).await;
    info!(
        items_submitted = stats.writes.items_submitted,
        duration_secs = stats.duration.as_secs_f64(),
        "Application Insights output finished"
    );
    stats.print_summary();

    forwarded
}

fn apply_overrides(config: &mut contracts::OutputConfig, args: &RunArgs) {
    if let Some(ref key) = args.instrumentation_key {
        info!("Overriding instrumentation key from CLI");
        config.instrumentation_key = key.clone();
    }
    if let Some(timeout) = args.timeout {
        info!(timeout = %timeout, "Overriding close timeout from CLI");
        config.timeout = timeout.into();
    }
    if let Some(policy) = args.aggregate_policy {
        config.aggregate_policy = policy.into();
    }
    if args.log_only {
        config.client.transport = contracts::TransportKind::Log;
    }
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::OutputConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Output: {}", OUTPUT_NAME);
    println!("  Close timeout: {}", describe_timeout(config));
    println!("  Aggregate policy: {:?}", config.aggregate_policy);
    println!("\nClient:");
    println!("  Transport: {:?}", config.client.transport);
    println!("  Endpoint: {}", config.client.endpoint_url);
    println!("  Queue capacity: {}", config.client.queue_capacity);
    println!(
        "  Batch: {} items / {}",
        config.client.max_batch_size,
        humantime::format_duration(config.client.max_batch_interval)
    );
    println!();
}

fn describe_timeout(config: &contracts::OutputConfig) -> String {
    match config.shutdown_timeout() {
        contracts::ShutdownTimeout::Bounded(d) => humantime::format_duration(d).to_string(),
        contracts::ShutdownTimeout::Unbounded => "none (wait for flush)".to_string(),
    }
}
