//! Host Calls for Proxy-Wasm ABI 0.1.0
//!
//! Typed wrappers over the raw `proxy_*` imports. Every wrapper returns
//! `Result<_, Status>`; a non-`Ok` status from the host is surfaced as-is and
//! never aborts. Host-allocated out-buffers are taken over by
//! [`HostBuffer`](crate::memory::HostBuffer) and copied or moved into owned
//! values before returning, so no view into host-written memory outlives the
//! call.

mod buffers;
#[cfg(not(target_arch = "wasm32"))]
pub mod emulator;
mod headers;
mod http_call;
mod logging;
mod metrics;
mod properties;
pub mod raw;
mod shared_data;
mod stream;

use std::ptr;

use crate::memory::HostBuffer;

pub use buffers::get_buffer;
#[cfg(not(target_arch = "wasm32"))]
pub use emulator::{set_host_emulator, take_host_emulator, HostEmulator, HostResult};
pub use headers::{
    add_map_value, get_map, get_map_bytes, get_map_value, remove_map_value, replace_map_value,
    set_map,
};
pub use http_call::dispatch_http_call;
pub use logging::log;
pub use metrics::{define_metric, get_metric, increment_metric, record_metric};
pub use properties::{get_configuration, get_property, set_property};
pub use shared_data::{
    dequeue_shared_queue, enqueue_shared_queue, get_shared_data, register_shared_queue,
    resolve_shared_queue, set_shared_data,
};
pub use stream::{
    clear_route_cache, continue_request, continue_response, done, get_current_time,
    send_local_response, set_effective_context, set_tick_period,
};

/// Out-parameter pair the host fills with a `malloc` region
pub(crate) struct OutBuffer {
    pub data: *mut u8,
    pub size: usize,
}

impl OutBuffer {
    pub fn new() -> Self {
        OutBuffer {
            data: ptr::null_mut(),
            size: 0,
        }
    }

    /// Take ownership of whatever the host wrote
    pub fn take(self) -> Option<HostBuffer> {
        // SAFETY: the host writes either null or a region obtained from our
        // malloc with exactly `size` bytes; each OutBuffer is taken once
        unsafe { HostBuffer::from_raw(self.data, self.size) }
    }
}
