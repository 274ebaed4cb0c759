//! Metrics Host Calls
//!
//! Metric identifiers are opaque values assigned by the host.

use super::raw;
use crate::types::{MetricType, Status};

pub fn define_metric(metric_type: MetricType, name: &str) -> Result<u32, Status> {
    let mut metric_id = 0u32;
    let status = unsafe {
        raw::proxy_define_metric(metric_type as u32, name.as_ptr(), name.len(), &mut metric_id)
    };
    Status::check(status)?;
    Ok(metric_id)
}

pub fn increment_metric(metric_id: u32, offset: i64) -> Result<(), Status> {
    Status::check(unsafe { raw::proxy_increment_metric(metric_id, offset) })
}

pub fn record_metric(metric_id: u32, value: u64) -> Result<(), Status> {
    Status::check(unsafe { raw::proxy_record_metric(metric_id, value) })
}

pub fn get_metric(metric_id: u32) -> Result<u64, Status> {
    let mut value = 0u64;
    Status::check(unsafe { raw::proxy_get_metric(metric_id, &mut value) })?;
    Ok(value)
}
