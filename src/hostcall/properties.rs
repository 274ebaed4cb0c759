//! Configuration and Property Host Calls

use bytes::Bytes;

use super::{raw, OutBuffer};
use crate::map;
use crate::types::Status;

/// Fetch the plugin configuration handed to `on_configure` / `on_vm_start`.
///
/// An absent configuration is reported as `NotFound`.
pub fn get_configuration() -> Result<Bytes, Status> {
    let mut out = OutBuffer::new();
    Status::check(unsafe { raw::proxy_get_configuration(&mut out.data, &mut out.size) })?;
    match out.take() {
        Some(buf) => Ok(buf.into_bytes()),
        None => Err(Status::NotFound),
    }
}

/// Read a host property such as `["request", "path"]`
pub fn get_property(path: &[&str]) -> Result<Bytes, Status> {
    let path = map::serialize_property_path(path);
    let mut out = OutBuffer::new();
    let status = unsafe {
        raw::proxy_get_property(path.as_ptr(), path.len(), &mut out.data, &mut out.size)
    };
    Status::check(status)?;
    match out.take() {
        Some(buf) => Ok(buf.into_bytes()),
        None => Err(Status::NotFound),
    }
}

pub fn set_property(path: &[&str], value: &[u8]) -> Result<(), Status> {
    let path = map::serialize_property_path(path);
    Status::check(unsafe {
        raw::proxy_set_property(path.as_ptr(), path.len(), value.as_ptr(), value.len())
    })
}
