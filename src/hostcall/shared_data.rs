//! Shared Data and Shared Queue Host Calls
//!
//! Both are managed by the host across guest instances; the guest only
//! brokers reads and writes.

use bytes::Bytes;

use super::{raw, OutBuffer};
use crate::types::Status;

/// Read a shared value and its CAS token.
///
/// The value is `None` when the host holds the key without data.
pub fn get_shared_data(key: &str) -> Result<(Option<Bytes>, u32), Status> {
    let mut out = OutBuffer::new();
    let mut cas = 0u32;
    let status = unsafe {
        raw::proxy_get_shared_data(
            key.as_ptr(),
            key.len(),
            &mut out.data,
            &mut out.size,
            &mut cas,
        )
    };
    Status::check(status)?;
    Ok((out.take().map(|buf| buf.into_bytes()), cas))
}

/// Write a shared value.
///
/// `cas` must be the token from the last read, or 0 to write
/// unconditionally. A stale token yields `CasMismatch` and the host keeps
/// its current value; callers re-read and retry.
pub fn set_shared_data(key: &str, value: &[u8], cas: u32) -> Result<(), Status> {
    Status::check(unsafe {
        raw::proxy_set_shared_data(key.as_ptr(), key.len(), value.as_ptr(), value.len(), cas)
    })
}

pub fn register_shared_queue(name: &str) -> Result<u32, Status> {
    let mut queue_id = 0u32;
    Status::check(unsafe {
        raw::proxy_register_shared_queue(name.as_ptr(), name.len(), &mut queue_id)
    })?;
    Ok(queue_id)
}

pub fn resolve_shared_queue(vm_id: &str, name: &str) -> Result<u32, Status> {
    let mut queue_id = 0u32;
    Status::check(unsafe {
        raw::proxy_resolve_shared_queue(
            vm_id.as_ptr(),
            vm_id.len(),
            name.as_ptr(),
            name.len(),
            &mut queue_id,
        )
    })?;
    Ok(queue_id)
}

/// Pop the next item; an exhausted queue reports `Empty`
pub fn dequeue_shared_queue(queue_id: u32) -> Result<Bytes, Status> {
    let mut out = OutBuffer::new();
    Status::check(unsafe {
        raw::proxy_dequeue_shared_queue(queue_id, &mut out.data, &mut out.size)
    })?;
    Ok(out.take().map(|buf| buf.into_bytes()).unwrap_or_default())
}

pub fn enqueue_shared_queue(queue_id: u32, value: &[u8]) -> Result<(), Status> {
    Status::check(unsafe { raw::proxy_enqueue_shared_queue(queue_id, value.as_ptr(), value.len()) })
}
