//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{OutputConfig, ShutdownTimeout, TransportKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    timeout: String,
    aggregate_policy: String,
    transport: String,
    endpoint_url: String,
    queue_capacity: usize,
    max_batch_size: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    timeout: humantime::format_duration(config.timeout).to_string(),
                    aggregate_policy: format!("{:?}", config.aggregate_policy),
                    transport: format!("{:?}", config.client.transport),
                    endpoint_url: config.client.endpoint_url.clone(),
                    queue_capacity: config.client.queue_capacity,
                    max_batch_size: config.client.max_batch_size,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &OutputConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.shutdown_timeout() == ShutdownTimeout::Unbounded {
        warnings.push("timeout is 0 - close waits until every buffered item is sent".to_string());
    }

    if config.client.transport == TransportKind::Log {
        warnings.push("client.transport is \"log\" - telemetry is logged, not sent".to_string());
    }

    if config.client.max_batch_size > config.client.queue_capacity {
        warnings.push(format!(
            "client.max_batch_size ({}) exceeds client.queue_capacity ({}) - batches never fill",
            config.client.max_batch_size, config.client.queue_capacity
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Timeout: {}", summary.timeout);
            println!("  Aggregate policy: {}", summary.aggregate_policy);
            println!("  Transport: {}", summary.transport);
            println!("  Endpoint: {}", summary.endpoint_url);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Max batch size: {}", summary.max_batch_size);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
