//! Plugin Contexts
//!
//! The three context kinds a plugin implements. Handler methods are called
//! by the dispatcher when the host fires the matching `proxy_on_*` export;
//! every handler has a default so a plugin only overrides what it needs.
//!
//! The provided (non-handler) methods are thin conveniences over
//! [`crate::hostcall`]. They act on the context the host is currently
//! dispatching to, so call them from inside a handler.

use std::time::{Duration, SystemTime};

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::config;
use crate::hostcall;
use crate::types::{Action, BufferType, ContextType, MapType, PeerType, Status};

/// Capabilities and handlers shared by every context kind
#[allow(unused_variables)]
pub trait Context {
    /// Response to a callout issued by this context
    fn on_http_call_response(
        &mut self,
        callout_id: u32,
        num_headers: usize,
        body_size: usize,
        num_trailers: usize,
    ) {
    }

    /// Return `false` to keep the context alive until [`Context::done`]
    fn on_done(&mut self) -> bool {
        true
    }

    fn on_log(&mut self) {}

    fn get_current_time(&self) -> Result<SystemTime, Status> {
        hostcall::get_current_time()
    }

    fn dispatch_http_call(
        &self,
        upstream: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
        trailers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<u32, Status> {
        hostcall::dispatch_http_call(upstream, headers, body, trailers, timeout)
    }

    fn get_http_call_response_headers(&self) -> Result<Vec<(String, String)>, Status> {
        hostcall::get_map(MapType::HttpCallResponseHeaders)
    }

    fn get_http_call_response_header(&self, name: &str) -> Result<String, Status> {
        hostcall::get_map_value(MapType::HttpCallResponseHeaders, name)
    }

    fn get_http_call_response_body(&self, start: usize, max_size: usize) -> Result<Bytes, Status> {
        hostcall::get_buffer(BufferType::HttpCallResponseBody, start, max_size)
    }

    fn get_http_call_response_trailers(&self) -> Result<Vec<(String, String)>, Status> {
        hostcall::get_map(MapType::HttpCallResponseTrailers)
    }

    fn get_shared_data(&self, key: &str) -> Result<(Option<Bytes>, u32), Status> {
        hostcall::get_shared_data(key)
    }

    fn set_shared_data(&self, key: &str, value: &[u8], cas: u32) -> Result<(), Status> {
        hostcall::set_shared_data(key, value, cas)
    }

    fn register_shared_queue(&self, name: &str) -> Result<u32, Status> {
        hostcall::register_shared_queue(name)
    }

    fn resolve_shared_queue(&self, vm_id: &str, name: &str) -> Result<u32, Status> {
        hostcall::resolve_shared_queue(vm_id, name)
    }

    fn enqueue_shared_queue(&self, queue_id: u32, value: &[u8]) -> Result<(), Status> {
        hostcall::enqueue_shared_queue(queue_id, value)
    }

    fn dequeue_shared_queue(&self, queue_id: u32) -> Result<Bytes, Status> {
        hostcall::dequeue_shared_queue(queue_id)
    }

    fn get_property(&self, path: &[&str]) -> Result<Bytes, Status> {
        hostcall::get_property(path)
    }

    fn set_property(&self, path: &[&str], value: &[u8]) -> Result<(), Status> {
        hostcall::set_property(path, value)
    }

    fn done(&self) -> Result<(), Status> {
        hostcall::done()
    }
}

/// Per-VM / per-plugin context, parent of every child context
#[allow(unused_variables)]
pub trait RootContext: Context {
    /// Return `false` to abort loading the VM
    fn on_vm_start(&mut self, vm_configuration_size: usize) -> bool {
        true
    }

    /// Return `false` to reject the plugin configuration
    fn on_configure(&mut self, plugin_configuration_size: usize) -> bool {
        true
    }

    fn on_tick(&mut self) {}

    fn on_queue_ready(&mut self, queue_id: u32) {}

    /// Child kind this root creates when no factory was registered
    fn get_type(&self) -> Option<ContextType> {
        None
    }

    fn create_http_context(&self, context_id: u32) -> Option<Box<dyn HttpContext>> {
        None
    }

    fn create_stream_context(&self, context_id: u32) -> Option<Box<dyn StreamContext>> {
        None
    }

    fn get_configuration(&self) -> Result<Bytes, Status> {
        hostcall::get_configuration()
    }

    /// Fetch the configuration and deserialize it from JSON or TOML
    fn configuration_as<T: DeserializeOwned>(&self) -> anyhow::Result<T>
    where
        Self: Sized,
    {
        let raw = self
            .get_configuration()
            .map_err(|status| anyhow::anyhow!("failed to read configuration: {}", status))?;
        config::parse(&raw)
    }

    fn set_tick_period(&self, period: Duration) -> Result<(), Status> {
        hostcall::set_tick_period(period)
    }
}

/// Per-request L7 context
#[allow(unused_variables)]
pub trait HttpContext: Context {
    fn on_http_request_headers(&mut self, num_headers: usize) -> Action {
        Action::Continue
    }

    fn on_http_request_body(&mut self, body_size: usize, end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_http_request_trailers(&mut self, num_trailers: usize) -> Action {
        Action::Continue
    }

    fn on_http_response_headers(&mut self, num_headers: usize) -> Action {
        Action::Continue
    }

    fn on_http_response_body(&mut self, body_size: usize, end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_http_response_trailers(&mut self, num_trailers: usize) -> Action {
        Action::Continue
    }

    // === Request ===

    fn get_http_request_headers(&self) -> Result<Vec<(String, String)>, Status> {
        hostcall::get_map(MapType::HttpRequestHeaders)
    }

    fn set_http_request_headers(&self, headers: &[(&str, &str)]) -> Result<(), Status> {
        hostcall::set_map(MapType::HttpRequestHeaders, headers)
    }

    fn get_http_request_header(&self, name: &str) -> Result<String, Status> {
        hostcall::get_map_value(MapType::HttpRequestHeaders, name)
    }

    fn add_http_request_header(&self, name: &str, value: &str) -> Result<(), Status> {
        hostcall::add_map_value(MapType::HttpRequestHeaders, name, value)
    }

    fn set_http_request_header(&self, name: &str, value: &str) -> Result<(), Status> {
        hostcall::replace_map_value(MapType::HttpRequestHeaders, name, value)
    }

    fn remove_http_request_header(&self, name: &str) -> Result<(), Status> {
        hostcall::remove_map_value(MapType::HttpRequestHeaders, name)
    }

    fn get_http_request_body(&self, start: usize, max_size: usize) -> Result<Bytes, Status> {
        hostcall::get_buffer(BufferType::HttpRequestBody, start, max_size)
    }

    fn get_http_request_trailers(&self) -> Result<Vec<(String, String)>, Status> {
        hostcall::get_map(MapType::HttpRequestTrailers)
    }

    fn set_http_request_trailers(&self, trailers: &[(&str, &str)]) -> Result<(), Status> {
        hostcall::set_map(MapType::HttpRequestTrailers, trailers)
    }

    fn get_http_request_trailer(&self, name: &str) -> Result<String, Status> {
        hostcall::get_map_value(MapType::HttpRequestTrailers, name)
    }

    fn add_http_request_trailer(&self, name: &str, value: &str) -> Result<(), Status> {
        hostcall::add_map_value(MapType::HttpRequestTrailers, name, value)
    }

    fn set_http_request_trailer(&self, name: &str, value: &str) -> Result<(), Status> {
        hostcall::replace_map_value(MapType::HttpRequestTrailers, name, value)
    }

    fn remove_http_request_trailer(&self, name: &str) -> Result<(), Status> {
        hostcall::remove_map_value(MapType::HttpRequestTrailers, name)
    }

    fn resume_http_request(&self) -> Result<(), Status> {
        hostcall::continue_request()
    }

    // === Response ===

    fn get_http_response_headers(&self) -> Result<Vec<(String, String)>, Status> {
        hostcall::get_map(MapType::HttpResponseHeaders)
    }

    fn set_http_response_headers(&self, headers: &[(&str, &str)]) -> Result<(), Status> {
        hostcall::set_map(MapType::HttpResponseHeaders, headers)
    }

    fn get_http_response_header(&self, name: &str) -> Result<String, Status> {
        hostcall::get_map_value(MapType::HttpResponseHeaders, name)
    }

    fn add_http_response_header(&self, name: &str, value: &str) -> Result<(), Status> {
        hostcall::add_map_value(MapType::HttpResponseHeaders, name, value)
    }

    fn set_http_response_header(&self, name: &str, value: &str) -> Result<(), Status> {
        hostcall::replace_map_value(MapType::HttpResponseHeaders, name, value)
    }

    fn remove_http_response_header(&self, name: &str) -> Result<(), Status> {
        hostcall::remove_map_value(MapType::HttpResponseHeaders, name)
    }

    fn get_http_response_body(&self, start: usize, max_size: usize) -> Result<Bytes, Status> {
        hostcall::get_buffer(BufferType::HttpResponseBody, start, max_size)
    }

    fn get_http_response_trailers(&self) -> Result<Vec<(String, String)>, Status> {
        hostcall::get_map(MapType::HttpResponseTrailers)
    }

    fn set_http_response_trailers(&self, trailers: &[(&str, &str)]) -> Result<(), Status> {
        hostcall::set_map(MapType::HttpResponseTrailers, trailers)
    }

    fn get_http_response_trailer(&self, name: &str) -> Result<String, Status> {
        hostcall::get_map_value(MapType::HttpResponseTrailers, name)
    }

    fn add_http_response_trailer(&self, name: &str, value: &str) -> Result<(), Status> {
        hostcall::add_map_value(MapType::HttpResponseTrailers, name, value)
    }

    fn set_http_response_trailer(&self, name: &str, value: &str) -> Result<(), Status> {
        hostcall::replace_map_value(MapType::HttpResponseTrailers, name, value)
    }

    fn remove_http_response_trailer(&self, name: &str) -> Result<(), Status> {
        hostcall::remove_map_value(MapType::HttpResponseTrailers, name)
    }

    fn resume_http_response(&self) -> Result<(), Status> {
        hostcall::continue_response()
    }

    // === Local response / routing ===

    /// Terminate the request with a locally generated response
    fn send_http_response(
        &self,
        status_code: u32,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> Result<(), Status> {
        hostcall::send_local_response(status_code, headers, body)
    }

    fn clear_http_route_cache(&self) -> Result<(), Status> {
        hostcall::clear_route_cache()
    }
}

/// Per-connection L4 context
#[allow(unused_variables)]
pub trait StreamContext: Context {
    fn on_new_connection(&mut self) -> Action {
        Action::Continue
    }

    fn on_downstream_data(&mut self, data_size: usize, end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_downstream_close(&mut self, peer_type: PeerType) {}

    fn on_upstream_data(&mut self, data_size: usize, end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_upstream_close(&mut self, peer_type: PeerType) {}

    fn get_downstream_data(&self, start: usize, max_size: usize) -> Result<Bytes, Status> {
        hostcall::get_buffer(BufferType::DownstreamData, start, max_size)
    }

    fn get_upstream_data(&self, start: usize, max_size: usize) -> Result<Bytes, Status> {
        hostcall::get_buffer(BufferType::UpstreamData, start, max_size)
    }
}

/// Root context used when the plugin registers no root factory
pub(crate) struct DefaultRootContext;

impl Context for DefaultRootContext {}

impl RootContext for DefaultRootContext {}
