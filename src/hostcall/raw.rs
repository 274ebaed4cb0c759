//! Raw Proxy-Wasm Host Calls (ABI 0.1.0)
//!
//! The `env` imports the host links into the guest. Names, parameter order
//! and numeric types are fixed by the ABI. Every call returns a raw
//! `proxy_status_t`.
//!
//! Out-parameters of the form `(*mut *mut u8, *mut usize)` receive a region
//! the host obtained through the guest's exported `malloc`; the caller owns
//! it afterwards (see [`crate::memory::HostBuffer`]).
//!
//! On non-wasm32 targets the same functions are provided as `unsafe fn`s
//! forwarding to the installed [`HostEmulator`](super::emulator::HostEmulator).

#[cfg(target_arch = "wasm32")]
#[link(wasm_import_module = "env")]
extern "C" {
    // === Logging / configuration ===
    pub fn proxy_log(level: u32, message_data: *const u8, message_size: usize) -> u32;
    pub fn proxy_get_configuration(
        return_buffer_data: *mut *mut u8,
        return_buffer_size: *mut usize,
    ) -> u32;

    // === Properties ===
    pub fn proxy_set_property(
        path_data: *const u8,
        path_size: usize,
        value_data: *const u8,
        value_size: usize,
    ) -> u32;
    pub fn proxy_get_property(
        path_data: *const u8,
        path_size: usize,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
    ) -> u32;

    // === HTTP stream control ===
    pub fn proxy_continue_request() -> u32;
    pub fn proxy_continue_response() -> u32;
    pub fn proxy_send_local_response(
        status_code: u32,
        status_code_details_data: *const u8,
        status_code_details_size: usize,
        body_data: *const u8,
        body_size: usize,
        headers_data: *const u8,
        headers_size: usize,
        grpc_status: i32,
    ) -> u32;
    pub fn proxy_clear_route_cache() -> u32;

    // === Shared data ===
    pub fn proxy_get_shared_data(
        key_data: *const u8,
        key_size: usize,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
        return_cas: *mut u32,
    ) -> u32;
    pub fn proxy_set_shared_data(
        key_data: *const u8,
        key_size: usize,
        value_data: *const u8,
        value_size: usize,
        cas: u32,
    ) -> u32;

    // === Shared queues ===
    pub fn proxy_register_shared_queue(
        name_data: *const u8,
        name_size: usize,
        return_queue_id: *mut u32,
    ) -> u32;
    pub fn proxy_resolve_shared_queue(
        vm_id_data: *const u8,
        vm_id_size: usize,
        name_data: *const u8,
        name_size: usize,
        return_queue_id: *mut u32,
    ) -> u32;
    pub fn proxy_dequeue_shared_queue(
        queue_id: u32,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
    ) -> u32;
    pub fn proxy_enqueue_shared_queue(
        queue_id: u32,
        value_data: *const u8,
        value_size: usize,
    ) -> u32;

    // === Header maps ===
    pub fn proxy_get_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
    ) -> u32;
    pub fn proxy_add_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
        value_data: *const u8,
        value_size: usize,
    ) -> u32;
    pub fn proxy_replace_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
        value_data: *const u8,
        value_size: usize,
    ) -> u32;
    pub fn proxy_remove_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
    ) -> u32;
    pub fn proxy_get_header_map_pairs(
        map_type: u32,
        return_map_data: *mut *mut u8,
        return_map_size: *mut usize,
    ) -> u32;
    pub fn proxy_set_header_map_pairs(map_type: u32, map_data: *const u8, map_size: usize) -> u32;

    // === Buffers ===
    pub fn proxy_get_buffer_bytes(
        buffer_type: u32,
        start: usize,
        max_size: usize,
        return_buffer_data: *mut *mut u8,
        return_buffer_size: *mut usize,
    ) -> u32;

    // === HTTP calls ===
    pub fn proxy_http_call(
        upstream_data: *const u8,
        upstream_size: usize,
        headers_data: *const u8,
        headers_size: usize,
        body_data: *const u8,
        body_size: usize,
        trailers_data: *const u8,
        trailers_size: usize,
        timeout_milliseconds: u32,
        return_callout_id: *mut u32,
    ) -> u32;

    // === Timer / clock / context ===
    pub fn proxy_set_tick_period_milliseconds(period: u32) -> u32;
    pub fn proxy_get_current_time_nanoseconds(return_time: *mut u64) -> u32;
    pub fn proxy_set_effective_context(context_id: u32) -> u32;
    pub fn proxy_done() -> u32;

    // === Metrics ===
    pub fn proxy_define_metric(
        metric_type: u32,
        name_data: *const u8,
        name_size: usize,
        return_metric_id: *mut u32,
    ) -> u32;
    pub fn proxy_increment_metric(metric_id: u32, offset: i64) -> u32;
    pub fn proxy_record_metric(metric_id: u32, value: u64) -> u32;
    pub fn proxy_get_metric(metric_id: u32, return_metric_value: *mut u64) -> u32;
}

#[cfg(not(target_arch = "wasm32"))]
pub use self::emulated::*;

#[cfg(not(target_arch = "wasm32"))]
#[allow(clippy::missing_safety_doc, clippy::too_many_arguments)]
mod emulated {
    use std::slice;

    use crate::hostcall::emulator::{with_host, HostEmulator, HostResult};
    use crate::memory::HostBuffer;
    use crate::types::Status;

    unsafe fn input<'a>(data: *const u8, size: usize) -> &'a [u8] {
        if data.is_null() || size == 0 {
            &[]
        } else {
            slice::from_raw_parts(data, size)
        }
    }

    /// Run `f` against the installed emulator, `InternalFailure` if none
    fn call(f: impl FnOnce(&mut dyn HostEmulator) -> Status) -> u32 {
        with_host(f).unwrap_or(Status::InternalFailure) as u32
    }

    /// Copy an emulator result into a `malloc` region and publish it
    unsafe fn publish(
        result: HostResult<Option<Vec<u8>>>,
        return_data: *mut *mut u8,
        return_size: *mut usize,
    ) -> Status {
        match result {
            Ok(Some(bytes)) => {
                let (ptr, len) = HostBuffer::copy_from(&bytes).into_raw();
                *return_data = ptr;
                *return_size = len;
                Status::Ok
            }
            Ok(None) => {
                *return_data = std::ptr::null_mut();
                *return_size = 0;
                Status::Ok
            }
            Err(status) => status,
        }
    }

    unsafe fn publish_u32(result: HostResult<u32>, out: *mut u32) -> Status {
        match result {
            Ok(value) => {
                *out = value;
                Status::Ok
            }
            Err(status) => status,
        }
    }

    unsafe fn publish_u64(result: HostResult<u64>, out: *mut u64) -> Status {
        match result {
            Ok(value) => {
                *out = value;
                Status::Ok
            }
            Err(status) => status,
        }
    }

    pub unsafe fn proxy_log(level: u32, message_data: *const u8, message_size: usize) -> u32 {
        let message = String::from_utf8_lossy(input(message_data, message_size)).into_owned();
        call(|h| h.log(level, &message))
    }

    pub unsafe fn proxy_get_configuration(
        return_buffer_data: *mut *mut u8,
        return_buffer_size: *mut usize,
    ) -> u32 {
        call(|h| publish(h.get_configuration(), return_buffer_data, return_buffer_size))
    }

    pub unsafe fn proxy_set_property(
        path_data: *const u8,
        path_size: usize,
        value_data: *const u8,
        value_size: usize,
    ) -> u32 {
        let path = input(path_data, path_size);
        let value = input(value_data, value_size);
        call(|h| h.set_property(path, value))
    }

    pub unsafe fn proxy_get_property(
        path_data: *const u8,
        path_size: usize,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
    ) -> u32 {
        let path = input(path_data, path_size);
        call(|h| publish(h.get_property(path), return_value_data, return_value_size))
    }

    pub unsafe fn proxy_continue_request() -> u32 {
        call(|h| h.continue_request())
    }

    pub unsafe fn proxy_continue_response() -> u32 {
        call(|h| h.continue_response())
    }

    pub unsafe fn proxy_send_local_response(
        status_code: u32,
        status_code_details_data: *const u8,
        status_code_details_size: usize,
        body_data: *const u8,
        body_size: usize,
        headers_data: *const u8,
        headers_size: usize,
        grpc_status: i32,
    ) -> u32 {
        let details = input(status_code_details_data, status_code_details_size);
        let body = input(body_data, body_size);
        let headers = input(headers_data, headers_size);
        call(|h| h.send_local_response(status_code, details, body, headers, grpc_status))
    }

    pub unsafe fn proxy_clear_route_cache() -> u32 {
        call(|h| h.clear_route_cache())
    }

    pub unsafe fn proxy_get_shared_data(
        key_data: *const u8,
        key_size: usize,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
        return_cas: *mut u32,
    ) -> u32 {
        let key = input(key_data, key_size);
        call(|h| match h.get_shared_data(key) {
            Ok((value, cas)) => {
                *return_cas = cas;
                publish(Ok(value), return_value_data, return_value_size)
            }
            Err(status) => status,
        })
    }

    pub unsafe fn proxy_set_shared_data(
        key_data: *const u8,
        key_size: usize,
        value_data: *const u8,
        value_size: usize,
        cas: u32,
    ) -> u32 {
        let key = input(key_data, key_size);
        let value = input(value_data, value_size);
        call(|h| h.set_shared_data(key, value, cas))
    }

    pub unsafe fn proxy_register_shared_queue(
        name_data: *const u8,
        name_size: usize,
        return_queue_id: *mut u32,
    ) -> u32 {
        let name = input(name_data, name_size);
        call(|h| publish_u32(h.register_shared_queue(name), return_queue_id))
    }

    pub unsafe fn proxy_resolve_shared_queue(
        vm_id_data: *const u8,
        vm_id_size: usize,
        name_data: *const u8,
        name_size: usize,
        return_queue_id: *mut u32,
    ) -> u32 {
        let vm_id = input(vm_id_data, vm_id_size);
        let name = input(name_data, name_size);
        call(|h| publish_u32(h.resolve_shared_queue(vm_id, name), return_queue_id))
    }

    pub unsafe fn proxy_dequeue_shared_queue(
        queue_id: u32,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
    ) -> u32 {
        call(|h| {
            publish(
                h.dequeue_shared_queue(queue_id),
                return_value_data,
                return_value_size,
            )
        })
    }

    pub unsafe fn proxy_enqueue_shared_queue(
        queue_id: u32,
        value_data: *const u8,
        value_size: usize,
    ) -> u32 {
        let value = input(value_data, value_size);
        call(|h| h.enqueue_shared_queue(queue_id, value))
    }

    pub unsafe fn proxy_get_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
    ) -> u32 {
        let key = input(key_data, key_size);
        call(|h| {
            publish(
                h.get_header_map_value(map_type, key),
                return_value_data,
                return_value_size,
            )
        })
    }

    pub unsafe fn proxy_add_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
        value_data: *const u8,
        value_size: usize,
    ) -> u32 {
        let key = input(key_data, key_size);
        let value = input(value_data, value_size);
        call(|h| h.add_header_map_value(map_type, key, value))
    }

    pub unsafe fn proxy_replace_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
        value_data: *const u8,
        value_size: usize,
    ) -> u32 {
        let key = input(key_data, key_size);
        let value = input(value_data, value_size);
        call(|h| h.replace_header_map_value(map_type, key, value))
    }

    pub unsafe fn proxy_remove_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
    ) -> u32 {
        let key = input(key_data, key_size);
        call(|h| h.remove_header_map_value(map_type, key))
    }

    pub unsafe fn proxy_get_header_map_pairs(
        map_type: u32,
        return_map_data: *mut *mut u8,
        return_map_size: *mut usize,
    ) -> u32 {
        call(|h| {
            publish(
                h.get_header_map_pairs(map_type),
                return_map_data,
                return_map_size,
            )
        })
    }

    pub unsafe fn proxy_set_header_map_pairs(
        map_type: u32,
        map_data: *const u8,
        map_size: usize,
    ) -> u32 {
        let map = input(map_data, map_size);
        call(|h| h.set_header_map_pairs(map_type, map))
    }

    pub unsafe fn proxy_get_buffer_bytes(
        buffer_type: u32,
        start: usize,
        max_size: usize,
        return_buffer_data: *mut *mut u8,
        return_buffer_size: *mut usize,
    ) -> u32 {
        call(|h| {
            publish(
                h.get_buffer_bytes(buffer_type, start, max_size),
                return_buffer_data,
                return_buffer_size,
            )
        })
    }

    pub unsafe fn proxy_http_call(
        upstream_data: *const u8,
        upstream_size: usize,
        headers_data: *const u8,
        headers_size: usize,
        body_data: *const u8,
        body_size: usize,
        trailers_data: *const u8,
        trailers_size: usize,
        timeout_milliseconds: u32,
        return_callout_id: *mut u32,
    ) -> u32 {
        let upstream = input(upstream_data, upstream_size);
        let headers = input(headers_data, headers_size);
        let body = input(body_data, body_size);
        let trailers = input(trailers_data, trailers_size);
        call(|h| {
            publish_u32(
                h.http_call(upstream, headers, body, trailers, timeout_milliseconds),
                return_callout_id,
            )
        })
    }

    pub unsafe fn proxy_set_tick_period_milliseconds(period: u32) -> u32 {
        call(|h| h.set_tick_period_milliseconds(period))
    }

    pub unsafe fn proxy_get_current_time_nanoseconds(return_time: *mut u64) -> u32 {
        call(|h| publish_u64(h.get_current_time_nanoseconds(), return_time))
    }

    pub unsafe fn proxy_set_effective_context(context_id: u32) -> u32 {
        call(|h| h.set_effective_context(context_id))
    }

    pub unsafe fn proxy_done() -> u32 {
        call(|h| h.done())
    }

    pub unsafe fn proxy_define_metric(
        metric_type: u32,
        name_data: *const u8,
        name_size: usize,
        return_metric_id: *mut u32,
    ) -> u32 {
        let name = input(name_data, name_size);
        call(|h| publish_u32(h.define_metric(metric_type, name), return_metric_id))
    }

    pub unsafe fn proxy_increment_metric(metric_id: u32, offset: i64) -> u32 {
        call(|h| h.increment_metric(metric_id, offset))
    }

    pub unsafe fn proxy_record_metric(metric_id: u32, value: u64) -> u32 {
        call(|h| h.record_metric(metric_id, value))
    }

    pub unsafe fn proxy_get_metric(metric_id: u32, return_metric_value: *mut u64) -> u32 {
        call(|h| publish_u64(h.get_metric(metric_id), return_metric_value))
    }
}
