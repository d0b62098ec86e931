//! # Dispatcher
//!
//! 遥测输出模块 (Application Insights)。
//!
//! 负责：
//! - 将 `Metric` 翻译为逐字段的 `TelemetryItem`
//! - 非阻塞地提交给遥测客户端
//! - 关闭时在超时内等待客户端排空

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod plugin;
pub mod shutdown;
pub mod transports;
pub mod translator;

#[cfg(test)]
mod test_support;

pub use client::{BufferedClient, BufferedClientFactory};
pub use contracts::{Metric, TelemetryClient, TelemetryItem};
pub use dispatcher::Dispatcher;
pub use error::{DispatcherError, TranslateError};
pub use metrics::{ClientMetrics, ClientSnapshot, DispatchMetrics, DispatchSnapshot, WriteReport};
pub use plugin::{create_output, registered_outputs, ApplicationInsightsOutput, OUTPUT_NAME};
pub use shutdown::{ShutdownCoordinator, ShutdownOutcome};
pub use transports::{IngestionTransport, LogTransport};
pub use translator::translate;
