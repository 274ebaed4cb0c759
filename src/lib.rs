//! Guest-side SDK for Proxy-Wasm ABI 0.1.0 filters
//!
//! A plugin built with this crate compiles to a `wasm32` module that a
//! Proxy-Wasm host (Envoy, veil-proxy, ...) loads as an L4 or L7 filter.
//!
//! # Features
//! - Typed wrappers over every `proxy_*` host call (ABI 0.1.0)
//! - Context registry routing `proxy_on_*` callbacks to plugin objects
//! - HTTP callouts delivered back to the context that issued them
//! - `log` backend and JSON/TOML configuration parsing
//! - Native host emulation for running plugins under `cargo test`
//!
//! # Usage
//! ```ignore
//! use veil_wasm_sdk::{Action, Context, HttpContext, RootContext};
//!
//! struct Root;
//! impl Context for Root {}
//! impl RootContext for Root {}
//!
//! struct AddHeader;
//! impl Context for AddHeader {}
//! impl HttpContext for AddHeader {
//!     fn on_http_request_headers(&mut self, _num_headers: usize) -> Action {
//!         let _ = self.add_http_request_header("x-filtered", "1");
//!         Action::Continue
//!     }
//! }
//!
//! #[no_mangle]
//! pub fn _start() {
//!     veil_wasm_sdk::set_root_context(|_| Box::new(Root));
//!     veil_wasm_sdk::set_http_context(|_, _| Box::new(AddHeader));
//! }
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod exports;
pub mod hostcall;
pub mod logger;
pub mod map;
pub mod memory;
pub mod metrics;
pub mod types;

pub use context::{Context, HttpContext, RootContext, StreamContext};
pub use dispatcher::{
    active_context_id, context_kind, pending_callouts, set_http_context, set_root_context,
    set_stream_context, ContextKind,
};
pub use logger::{
    log_critical, log_debug, log_error, log_info, log_trace, log_warn, set_log_level,
};
pub use metrics::{Counter, Gauge, Histogram, Metric};
pub use types::*;
