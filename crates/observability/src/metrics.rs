//! 输出插件指标收集模块
//!
//! 记录写入、翻译拒绝、客户端投递与关闭结果。

use metrics::{counter, gauge, histogram};

/// 记录一次 write 调用
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_write_batch;
///
/// let report = dispatcher.write(&batch)?;
/// record_write_batch(batch.len(), report.items_submitted);
/// ```
pub fn record_write_batch(metrics_in_batch: usize, items_submitted: usize) {
    counter!("appinsights_output_write_calls_total").increment(1);
    histogram!("appinsights_output_write_batch_metrics").record(metrics_in_batch as f64);
    histogram!("appinsights_output_write_batch_items").record(items_submitted as f64);
}

/// 记录提交给客户端的遥测项
pub fn record_items_submitted(count: usize) {
    if count > 0 {
        counter!("appinsights_output_items_submitted_total").increment(count as u64);
    }
}

/// 记录被拒绝的非数值字段
pub fn record_field_rejected(metric_name: &str, value_kind: &str) {
    counter!(
        "appinsights_output_fields_rejected_total",
        "metric" => metric_name.to_string(),
        "kind" => value_kind.to_string()
    )
    .increment(1);
}

/// 记录被跳过的聚合指标
///
/// `abandoned` 为因 abort_batch 策略而未处理的后续指标数。
pub fn record_aggregate_skipped(metric_name: &str, abandoned: usize) {
    counter!(
        "appinsights_output_aggregates_skipped_total",
        "metric" => metric_name.to_string()
    )
    .increment(1);

    if abandoned > 0 {
        counter!("appinsights_output_metrics_abandoned_total").increment(abandoned as u64);
    }
}

/// 记录关闭结果
pub fn record_shutdown(outcome: &str, elapsed_ms: f64) {
    counter!(
        "appinsights_output_shutdowns_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("appinsights_output_shutdown_duration_ms").record(elapsed_ms);
}

/// 记录客户端批量投递
pub fn record_client_batch_sent(transport: &str, items: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "appinsights_client_batches_total",
        "transport" => transport.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "appinsights_client_batch_size",
        "transport" => transport.to_string()
    )
    .record(items as f64);
}

/// 记录客户端队列满时丢弃的遥测项
pub fn record_client_items_dropped(count: u64, queue_len: usize) {
    counter!("appinsights_client_items_dropped_total").increment(count);
    gauge!("appinsights_client_queue_len").set(queue_len as f64);
}

/// 写入统计聚合器
///
/// 在内存中聚合每次 write 的结果，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct WriteStatsAggregator {
    /// write 调用次数
    pub write_calls: u64,

    /// 处理过的指标总数
    pub metrics_seen: u64,

    /// 提交的遥测项总数
    pub items_submitted: u64,

    /// 被拒绝的字段数
    pub fields_rejected: u64,

    /// 跳过的聚合指标数
    pub aggregates_skipped: u64,

    /// 因 abort_batch 未处理的指标数
    pub metrics_abandoned: u64,

    /// 每批遥测项数统计
    pub batch_items: RunningStats,
}

impl WriteStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(
        &mut self,
        metrics_seen: usize,
        items_submitted: usize,
        fields_rejected: usize,
        aggregates_skipped: usize,
        metrics_abandoned: usize,
    ) {
        self.write_calls += 1;
        self.metrics_seen += metrics_seen as u64;
        self.items_submitted += items_submitted as u64;
        self.fields_rejected += fields_rejected as u64;
        self.aggregates_skipped += aggregates_skipped as u64;
        self.metrics_abandoned += metrics_abandoned as u64;
        self.batch_items.push(items_submitted as f64);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> WriteSummary {
        WriteSummary {
            write_calls: self.write_calls,
            metrics_seen: self.metrics_seen,
            items_submitted: self.items_submitted,
            fields_rejected: self.fields_rejected,
            aggregates_skipped: self.aggregates_skipped,
            metrics_abandoned: self.metrics_abandoned,
            batch_items: StatsSummary::from(&self.batch_items),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 写入摘要
#[derive(Debug, Clone, Default)]
pub struct WriteSummary {
    pub write_calls: u64,
    pub metrics_seen: u64,
    pub items_submitted: u64,
    pub fields_rejected: u64,
    pub aggregates_skipped: u64,
    pub metrics_abandoned: u64,
    pub batch_items: StatsSummary,
}

impl std::fmt::Display for WriteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Output Write Summary ===")?;
        writeln!(f, "Write calls: {}", self.write_calls)?;
        writeln!(f, "Metrics seen: {}", self.metrics_seen)?;
        writeln!(f, "Items submitted: {}", self.items_submitted)?;
        writeln!(f, "Fields rejected: {}", self.fields_rejected)?;
        writeln!(f, "Aggregates skipped: {}", self.aggregates_skipped)?;
        if self.metrics_abandoned > 0 {
            writeln!(f, "Metrics abandoned: {}", self.metrics_abandoned)?;
        }
        writeln!(f, "Items per batch: {}", self.batch_items)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
