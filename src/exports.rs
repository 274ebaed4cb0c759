//! Exported Entry Points
//!
//! The `proxy_on_*` functions the host calls into. Each one is a thin
//! trampoline into the dispatcher; argument meaning follows the ABI 0.1.0
//! export list. Symbols are only unmangled on wasm32 so native test
//! binaries never collide with a host's own exports.
//!
//! Entry points use the `C-unwind` ABI. It has the same calling convention
//! as `C`; a fatal panic still traps on wasm32 (`panic = "abort"`), and on
//! native builds it unwinds to the caller instead of aborting the process.

use crate::dispatcher;
use crate::types::{Action, PeerType};

/// ABI version marker the host probes for
#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C" fn proxy_abi_version_0_1_0() {}

// ============================================================
// Lifecycle
// ============================================================

/// `root_context_id == 0` creates a root context
#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_context_create(context_id: u32, root_context_id: u32) {
    dispatcher::on_context_create(context_id, root_context_id)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_vm_start(context_id: u32, vm_configuration_size: usize) -> bool {
    dispatcher::on_vm_start(context_id, vm_configuration_size)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_configure(context_id: u32, plugin_configuration_size: usize) -> bool {
    dispatcher::on_configure(context_id, plugin_configuration_size)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_tick(context_id: u32) {
    dispatcher::on_tick(context_id)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_queue_ready(context_id: u32, queue_id: u32) {
    dispatcher::on_queue_ready(context_id, queue_id)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_done(context_id: u32) -> bool {
    dispatcher::on_done(context_id)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_log(context_id: u32) {
    dispatcher::on_log(context_id)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_delete(context_id: u32) {
    dispatcher::on_delete(context_id)
}

// ============================================================
// L4 stream
// ============================================================

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_new_connection(context_id: u32) -> Action {
    dispatcher::on_new_connection(context_id)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_downstream_data(
    context_id: u32,
    data_size: usize,
    end_of_stream: bool,
) -> Action {
    dispatcher::on_downstream_data(context_id, data_size, end_of_stream)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_downstream_connection_close(context_id: u32, peer_type: u32) {
    dispatcher::on_downstream_close(context_id, PeerType::from_raw(peer_type))
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_upstream_data(
    context_id: u32,
    data_size: usize,
    end_of_stream: bool,
) -> Action {
    dispatcher::on_upstream_data(context_id, data_size, end_of_stream)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_upstream_connection_close(context_id: u32, peer_type: u32) {
    dispatcher::on_upstream_close(context_id, PeerType::from_raw(peer_type))
}

// ============================================================
// L7 HTTP
// ============================================================

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_request_headers(context_id: u32, num_headers: usize) -> Action {
    dispatcher::on_http_request_headers(context_id, num_headers)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_request_body(
    context_id: u32,
    body_size: usize,
    end_of_stream: bool,
) -> Action {
    dispatcher::on_http_request_body(context_id, body_size, end_of_stream)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_request_trailers(context_id: u32, num_trailers: usize) -> Action {
    dispatcher::on_http_request_trailers(context_id, num_trailers)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_response_headers(context_id: u32, num_headers: usize) -> Action {
    dispatcher::on_http_response_headers(context_id, num_headers)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_response_body(
    context_id: u32,
    body_size: usize,
    end_of_stream: bool,
) -> Action {
    dispatcher::on_http_response_body(context_id, body_size, end_of_stream)
}

#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_response_trailers(context_id: u32, num_trailers: usize) -> Action {
    dispatcher::on_http_response_trailers(context_id, num_trailers)
}

/// Response to a callout; routed to the context that issued it
#[cfg_attr(target_arch = "wasm32", no_mangle)]
pub extern "C-unwind" fn proxy_on_http_call_response(
    _context_id: u32,
    callout_id: u32,
    num_headers: usize,
    body_size: usize,
    num_trailers: usize,
) {
    dispatcher::on_http_call_response(callout_id, num_headers, body_size, num_trailers)
}
