//! Logging Host Call

use super::raw;
use crate::types::{LogLevel, Status};

/// Emit a single flat message at `level`
pub fn log(level: LogLevel, message: &str) -> Result<(), Status> {
    let status = unsafe { raw::proxy_log(level as u32, message.as_ptr(), message.len()) };
    Status::check(status)
}
