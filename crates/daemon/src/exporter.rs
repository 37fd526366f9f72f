// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prometheus exporter: one sample per (host, metric) from the current
//! metrics snapshot, collected lazily at scrape time.

use prometheus_client::collector::Collector;
use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric};
use prometheus_client::metrics::counter::ConstCounter;
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::registry::Registry;
use std::fmt;
use std::sync::Arc;
use zackup_core::HostMetrics;

/// Version label value for the process-wide info sample.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Read-side view of the metrics store, implemented by
/// [`State`](crate::State).
pub trait MetricsSource: Send + Sync + 'static {
    fn export(&self) -> Vec<HostMetrics>;
}

impl<C: zackup_core::Clock> MetricsSource for crate::State<C> {
    fn export(&self) -> Vec<HostMetrics> {
        crate::State::export(self)
    }
}

/// Build a registry with the state collector registered.
pub fn registry(source: Arc<dyn MetricsSource>) -> Registry {
    let mut registry = Registry::default();
    registry.register_collector(Box::new(StateCollector { source }));
    registry
}

struct StateCollector {
    source: Arc<dyn MetricsSource>,
}

impl fmt::Debug for StateCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCollector").finish_non_exhaustive()
    }
}

impl Collector for StateCollector {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), fmt::Error> {
        let version = ConstGauge::new(1i64);
        let mut metric_encoder = encoder.encode_descriptor(
            "zackup_version",
            "zackup version information",
            None,
            version.metric_type(),
        )?;
        version.encode(metric_encoder.encode_family(&[("version", VERSION)])?)?;

        let snapshot = self.source.export();

        encode_each(&mut encoder, &snapshot, "zackup_last_success",
            "unix timestamp of the last successful backup (-1 if none)",
            |m| {
                let value = m.succeeded_at.map_or(-1.0, |t| t.timestamp() as f64);
                ConstCounter::new(value)
            })?;

        encode_gauges(&mut encoder, &snapshot, "zackup_last_duration",
            "duration of the last successful backup in seconds",
            |m| m.success_duration.map_or(0.0, |d| d.as_secs_f64()))?;

        encode_gauges(&mut encoder, &snapshot, "zackup_space_used",
            "total space used by the host's dataset in bytes",
            |m| m.space_used_total() as f64)?;
        encode_gauges(&mut encoder, &snapshot, "zackup_space_used_by_snapshots",
            "space used by snapshots in bytes",
            |m| m.space_used_by_snapshots as f64)?;
        encode_gauges(&mut encoder, &snapshot, "zackup_space_used_by_dataset",
            "space used by the dataset itself in bytes",
            |m| m.space_used_by_dataset as f64)?;
        encode_gauges(&mut encoder, &snapshot, "zackup_space_used_by_children",
            "space used by child datasets in bytes",
            |m| m.space_used_by_children as f64)?;
        encode_gauges(&mut encoder, &snapshot, "zackup_space_used_by_refreservation",
            "space reserved via refreservation in bytes",
            |m| m.space_used_by_ref_reservation as f64)?;

        encode_gauges(&mut encoder, &snapshot, "zackup_compression",
            "compression factor achieved for the used space",
            |m| m.compression_factor)?;

        Ok(())
    }
}

fn encode_each(
    encoder: &mut DescriptorEncoder,
    snapshot: &[HostMetrics],
    name: &str,
    help: &str,
    sample: impl Fn(&HostMetrics) -> ConstCounter<f64>,
) -> Result<(), fmt::Error> {
    let mut metric_encoder = encoder.encode_descriptor(
        name,
        help,
        None,
        prometheus_client::metrics::MetricType::Counter,
    )?;
    for metrics in snapshot {
        let counter = sample(metrics);
        counter.encode(metric_encoder.encode_family(&[("host", metrics.host.as_str())])?)?;
    }
    Ok(())
}

fn encode_gauges(
    encoder: &mut DescriptorEncoder,
    snapshot: &[HostMetrics],
    name: &str,
    help: &str,
    sample: impl Fn(&HostMetrics) -> f64,
) -> Result<(), fmt::Error> {
    let mut metric_encoder = encoder.encode_descriptor(
        name,
        help,
        None,
        prometheus_client::metrics::MetricType::Gauge,
    )?;
    for metrics in snapshot {
        let gauge = ConstGauge::new(sample(metrics));
        gauge.encode(metric_encoder.encode_family(&[("host", metrics.host.as_str())])?)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "exporter_tests.rs"]
mod tests;
