//! Buffer Host Calls

use bytes::Bytes;

use super::{raw, OutBuffer};
use crate::types::{BufferType, Status};

/// Read up to `max_size` bytes of a host buffer starting at `start`.
///
/// The host may answer `Ok` without a buffer; that is reported as
/// `NotFound` so callers see a single "nothing there" outcome.
pub fn get_buffer(buffer_type: BufferType, start: usize, max_size: usize) -> Result<Bytes, Status> {
    let mut out = OutBuffer::new();
    let status = unsafe {
        raw::proxy_get_buffer_bytes(
            buffer_type as u32,
            start,
            max_size,
            &mut out.data,
            &mut out.size,
        )
    };
    Status::check(status)?;
    match out.take() {
        Some(buf) => Ok(buf.into_bytes()),
        None => Err(Status::NotFound),
    }
}
