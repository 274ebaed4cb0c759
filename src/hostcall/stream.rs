//! Stream Control, Timer and Context Host Calls

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::raw;
use crate::map;
use crate::types::Status;

/// gRPC status passed with plain HTTP local responses
const NO_GRPC_STATUS: i32 = -1;

/// Resume a request paused by a handler returning `Action::Pause`
pub fn continue_request() -> Result<(), Status> {
    Status::check(unsafe { raw::proxy_continue_request() })
}

/// Resume a response paused by a handler returning `Action::Pause`
pub fn continue_response() -> Result<(), Status> {
    Status::check(unsafe { raw::proxy_continue_response() })
}

/// Answer the request locally instead of forwarding it upstream.
///
/// Only one local response may be sent per HTTP context; the host rejects
/// any further attempt and that status is returned unchanged.
pub fn send_local_response<K: AsRef<[u8]>, V: AsRef<[u8]>>(
    status_code: u32,
    headers: &[(K, V)],
    body: Option<&[u8]>,
) -> Result<(), Status> {
    let headers = map::encode(headers);
    let body = body.unwrap_or_default();
    let details = "";
    Status::check(unsafe {
        raw::proxy_send_local_response(
            status_code,
            details.as_ptr(),
            details.len(),
            body.as_ptr(),
            body.len(),
            headers.as_ptr(),
            headers.len(),
            NO_GRPC_STATUS,
        )
    })
}

pub fn clear_route_cache() -> Result<(), Status> {
    Status::check(unsafe { raw::proxy_clear_route_cache() })
}

/// Ask the host to call `on_tick` every `period`; zero disables the timer
pub fn set_tick_period(period: Duration) -> Result<(), Status> {
    let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
    Status::check(unsafe { raw::proxy_set_tick_period_milliseconds(millis) })
}

pub fn get_current_time() -> Result<SystemTime, Status> {
    let mut nanos = 0u64;
    Status::check(unsafe { raw::proxy_get_current_time_nanoseconds(&mut nanos) })?;
    Ok(UNIX_EPOCH + Duration::from_nanos(nanos))
}

/// Tell the host which context subsequent host calls belong to
pub fn set_effective_context(context_id: u32) -> Result<(), Status> {
    Status::check(unsafe { raw::proxy_set_effective_context(context_id) })
}

/// Signal that a context which answered `false` from `on_done` has finished
pub fn done() -> Result<(), Status> {
    Status::check(unsafe { raw::proxy_done() })
}
