//! HTTP Call Host Call

use std::time::Duration;

use super::raw;
use crate::dispatcher;
use crate::map;
use crate::types::Status;

/// Issue an out-of-band HTTP request to `upstream` (a host cluster name).
///
/// On success the callout is bound to the active context before
/// returning, so the response is delivered to the caller's
/// `on_http_call_response`. A missing binding would make the response
/// undeliverable.
pub fn dispatch_http_call(
    upstream: &str,
    headers: &[(&str, &str)],
    body: Option<&[u8]>,
    trailers: &[(&str, &str)],
    timeout: Duration,
) -> Result<u32, Status> {
    let headers = map::encode(headers);
    let trailers = map::encode(trailers);
    let body = body.unwrap_or_default();
    let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
    let mut callout_id = 0u32;
    let status = unsafe {
        raw::proxy_http_call(
            upstream.as_ptr(),
            upstream.len(),
            headers.as_ptr(),
            headers.len(),
            body.as_ptr(),
            body.len(),
            trailers.as_ptr(),
            trailers.len(),
            timeout_ms,
            &mut callout_id,
        )
    };
    Status::check(status)?;
    dispatcher::register_callout(callout_id);
    log::debug!(
        "[sdk] http call to '{}' dispatched as callout {}",
        upstream,
        callout_id
    );
    Ok(callout_id)
}
