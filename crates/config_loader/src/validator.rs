//! 配置校验模块
//!
//! 校验规则：
//! - instrumentation_key 非空 (不校验格式)
//! - endpoint_url 为 http(s) 地址
//! - queue_capacity / max_batch_size > 0
//! - max_batch_interval / request_timeout > 0
//!
//! `timeout = 0` 合法，表示 close 时无限等待。

use contracts::{ClientConfig, ContractError, OutputConfig, TransportKind};

/// 校验 OutputConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &OutputConfig) -> Result<(), ContractError> {
    validate_instrumentation_key(config)?;
    validate_client(&config.client)?;
    Ok(())
}

fn validate_instrumentation_key(config: &OutputConfig) -> Result<(), ContractError> {
    if config.instrumentation_key.trim().is_empty() {
        return Err(ContractError::config_validation(
            "instrumentation_key",
            "instrumentation_key cannot be empty",
        ));
    }
    Ok(())
}

/// 校验客户端缓冲与批量配置
fn validate_client(client: &ClientConfig) -> Result<(), ContractError> {
    if client.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "client.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }

    if client.max_batch_size == 0 {
        return Err(ContractError::config_validation(
            "client.max_batch_size",
            "max_batch_size must be > 0",
        ));
    }

    if client.max_batch_interval.is_zero() {
        return Err(ContractError::config_validation(
            "client.max_batch_interval",
            "max_batch_interval must be > 0",
        ));
    }

    if client.transport == TransportKind::Ingestion {
        validate_endpoint(client)?;
    }

    Ok(())
}

fn validate_endpoint(client: &ClientConfig) -> Result<(), ContractError> {
    let url = client.endpoint_url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ContractError::config_validation(
            "client.endpoint_url",
            format!("endpoint_url must be an http(s) URL, got '{url}'"),
        ));
    }

    if client.request_timeout.is_zero() {
        return Err(ContractError::config_validation(
            "client.request_timeout",
            "request_timeout must be > 0",
        ));
    }

    Ok(())
}
