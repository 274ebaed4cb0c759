//! Proxy-Wasm ABI Types
//!
//! Numeric enumerations shared across the host/guest boundary (ABI 0.1.0).
//! Every discriminant is part of the wire contract and must not be renumbered.

use std::fmt;

// ============================================================
// proxy_status_t - Return status for host functions
// ============================================================

/// Status returned by every host call
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Success
    Ok = 0,
    /// Key/value not found
    NotFound = 1,
    /// Invalid argument
    BadArgument = 2,
    /// Serialization error
    SerializationFailure = 3,
    /// Parse error
    ParseFailure = 4,
    /// Expression evaluation failed
    BadExpression = 5,
    /// Invalid memory access
    InvalidMemoryAccess = 6,
    /// Empty result
    Empty = 7,
    /// Compare-and-swap mismatch
    CasMismatch = 8,
    /// Returned result is too large
    ResultMismatch = 9,
    /// Internal error
    InternalFailure = 10,
    /// Unimplemented
    Unimplemented = 12,
}

impl Status {
    /// Decode a raw status code returned by the host.
    ///
    /// Codes outside the ABI table are reported as `InternalFailure`.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Status::Ok,
            1 => Status::NotFound,
            2 => Status::BadArgument,
            3 => Status::SerializationFailure,
            4 => Status::ParseFailure,
            5 => Status::BadExpression,
            6 => Status::InvalidMemoryAccess,
            7 => Status::Empty,
            8 => Status::CasMismatch,
            9 => Status::ResultMismatch,
            12 => Status::Unimplemented,
            _ => Status::InternalFailure,
        }
    }

    /// Turn a raw code into `Ok(())` or `Err(status)`
    pub fn check(raw: u32) -> Result<(), Status> {
        match Status::from_raw(raw) {
            Status::Ok => Ok(()),
            other => Err(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::NotFound => "not found",
            Status::BadArgument => "bad argument",
            Status::SerializationFailure => "serialization failure",
            Status::ParseFailure => "parse failure",
            Status::BadExpression => "bad expression",
            Status::InvalidMemoryAccess => "invalid memory access",
            Status::Empty => "empty",
            Status::CasMismatch => "cas mismatch",
            Status::ResultMismatch => "result mismatch",
            Status::InternalFailure => "internal failure",
            Status::Unimplemented => "unimplemented",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), *self as u32)
    }
}

impl std::error::Error for Status {}

// ============================================================
// proxy_action_t - Action returned by data-path callbacks
// ============================================================

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Continue processing
    #[default]
    Continue = 0,
    /// Pause processing until the guest resumes it
    Pause = 1,
}

// ============================================================
// proxy_peer_type_t - Which side closed an L4 connection
// ============================================================

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerType {
    Unknown = 0,
    Local = 1,
    Remote = 2,
}

impl PeerType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => PeerType::Local,
            2 => PeerType::Remote,
            _ => PeerType::Unknown,
        }
    }
}

// ============================================================
// proxy_log_level_t - Log levels
// ============================================================

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Critical = 5,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => LogLevel::Trace,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Info => LogLevel::Info,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Error => LogLevel::Error,
        }
    }
}

impl LogLevel {
    /// Most verbose `log` filter that still lets this level through
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => log::LevelFilter::Error,
        }
    }
}

// ============================================================
// proxy_map_type_t - Header map types
// ============================================================

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapType {
    /// Request headers from downstream
    HttpRequestHeaders = 0,
    /// Request trailers from downstream
    HttpRequestTrailers = 1,
    /// Response headers from upstream
    HttpResponseHeaders = 2,
    /// Response trailers from upstream
    HttpResponseTrailers = 3,
    /// HTTP call response headers
    HttpCallResponseHeaders = 7,
    /// HTTP call response trailers
    HttpCallResponseTrailers = 8,
}

// ============================================================
// proxy_buffer_type_t - Buffer types
// ============================================================

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferType {
    /// Request body from downstream
    HttpRequestBody = 0,
    /// Response body from upstream
    HttpResponseBody = 1,
    /// Bytes received from the downstream connection
    DownstreamData = 2,
    /// Bytes received from the upstream connection
    UpstreamData = 3,
    /// HTTP call response body
    HttpCallResponseBody = 4,
}

// ============================================================
// proxy_metric_type_t - Metric types
// ============================================================

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// Counter metric (cumulative)
    Counter = 0,
    /// Gauge metric (current value)
    Gauge = 1,
    /// Histogram metric
    Histogram = 2,
}

/// Child context kind a plugin produces.
///
/// A plugin produces either HTTP contexts or stream contexts, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextType {
    HttpContext,
    StreamContext,
}
