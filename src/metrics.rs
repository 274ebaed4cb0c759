//! Metric Handles
//!
//! Typed wrappers around host-defined metrics. A handle only carries the
//! host-assigned id; values live on the host.

use crate::hostcall;
use crate::types::{MetricType, Status};

/// Host metric of any type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    id: u32,
    metric_type: MetricType,
}

impl Metric {
    pub fn define(metric_type: MetricType, name: &str) -> Result<Self, Status> {
        let id = hostcall::define_metric(metric_type, name)?;
        Ok(Metric { id, metric_type })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    pub fn increment(&self, offset: i64) -> Result<(), Status> {
        hostcall::increment_metric(self.id, offset)
    }

    pub fn record(&self, value: u64) -> Result<(), Status> {
        hostcall::record_metric(self.id, value)
    }

    pub fn get(&self) -> Result<u64, Status> {
        hostcall::get_metric(self.id)
    }
}

/// Monotonic counter
#[derive(Debug, Clone, Copy)]
pub struct Counter(Metric);

impl Counter {
    pub fn new(name: &str) -> Result<Self, Status> {
        Metric::define(MetricType::Counter, name).map(Counter)
    }

    pub fn inc(&self) -> Result<(), Status> {
        self.0.increment(1)
    }

    pub fn add(&self, n: u64) -> Result<(), Status> {
        self.0.increment(n.min(i64::MAX as u64) as i64)
    }

    pub fn value(&self) -> Result<u64, Status> {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Gauge(Metric);

impl Gauge {
    pub fn new(name: &str) -> Result<Self, Status> {
        Metric::define(MetricType::Gauge, name).map(Gauge)
    }

    pub fn set(&self, value: u64) -> Result<(), Status> {
        self.0.record(value)
    }

    pub fn add(&self, offset: i64) -> Result<(), Status> {
        self.0.increment(offset)
    }

    pub fn value(&self) -> Result<u64, Status> {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Histogram(Metric);

impl Histogram {
    pub fn new(name: &str) -> Result<Self, Status> {
        Metric::define(MetricType::Histogram, name).map(Histogram)
    }

    pub fn observe(&self, value: u64) -> Result<(), Status> {
        self.0.record(value)
    }
}
