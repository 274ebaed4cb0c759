//! Native Host Emulation
//!
//! Outside wasm32 there is no host to link against. The raw host calls
//! forward to a [`HostEmulator`] installed on the current thread, which lets
//! plugins and the SDK itself be exercised with ordinary `cargo test`.
//!
//! Arguments reach the emulator as the byte slices the guest passed;
//! out-buffers it returns are copied into regions from the guest's own
//! `malloc`, so the ownership path is identical to the wasm32 one.
//! Enumerations are passed as their raw ABI values, as a real host sees them.

use std::cell::RefCell;

use crate::types::Status;

pub type HostResult<T> = Result<T, Status>;

/// Host side of the ABI, as seen by the guest.
///
/// Every method defaults to `Unimplemented` so an emulator only provides
/// what a test exercises. `Ok(None)` for a buffer result means the host
/// returned success with a null pointer.
#[allow(unused_variables)]
pub trait HostEmulator {
    fn log(&mut self, level: u32, message: &str) -> Status {
        Status::Unimplemented
    }

    fn get_configuration(&mut self) -> HostResult<Option<Vec<u8>>> {
        Err(Status::Unimplemented)
    }

    fn set_property(&mut self, path: &[u8], value: &[u8]) -> Status {
        Status::Unimplemented
    }

    fn get_property(&mut self, path: &[u8]) -> HostResult<Option<Vec<u8>>> {
        Err(Status::Unimplemented)
    }

    fn continue_request(&mut self) -> Status {
        Status::Unimplemented
    }

    fn continue_response(&mut self) -> Status {
        Status::Unimplemented
    }

    fn send_local_response(
        &mut self,
        status_code: u32,
        details: &[u8],
        body: &[u8],
        headers: &[u8],
        grpc_status: i32,
    ) -> Status {
        Status::Unimplemented
    }

    fn clear_route_cache(&mut self) -> Status {
        Status::Unimplemented
    }

    /// Returns the value (if any) and its CAS token
    fn get_shared_data(&mut self, key: &[u8]) -> HostResult<(Option<Vec<u8>>, u32)> {
        Err(Status::Unimplemented)
    }

    fn set_shared_data(&mut self, key: &[u8], value: &[u8], cas: u32) -> Status {
        Status::Unimplemented
    }

    fn register_shared_queue(&mut self, name: &[u8]) -> HostResult<u32> {
        Err(Status::Unimplemented)
    }

    fn resolve_shared_queue(&mut self, vm_id: &[u8], name: &[u8]) -> HostResult<u32> {
        Err(Status::Unimplemented)
    }

    fn dequeue_shared_queue(&mut self, queue_id: u32) -> HostResult<Option<Vec<u8>>> {
        Err(Status::Unimplemented)
    }

    fn enqueue_shared_queue(&mut self, queue_id: u32, value: &[u8]) -> Status {
        Status::Unimplemented
    }

    fn get_header_map_value(&mut self, map_type: u32, key: &[u8]) -> HostResult<Option<Vec<u8>>> {
        Err(Status::Unimplemented)
    }

    fn add_header_map_value(&mut self, map_type: u32, key: &[u8], value: &[u8]) -> Status {
        Status::Unimplemented
    }

    fn replace_header_map_value(&mut self, map_type: u32, key: &[u8], value: &[u8]) -> Status {
        Status::Unimplemented
    }

    fn remove_header_map_value(&mut self, map_type: u32, key: &[u8]) -> Status {
        Status::Unimplemented
    }

    /// Returns the map already encoded in the header-map wire format
    fn get_header_map_pairs(&mut self, map_type: u32) -> HostResult<Option<Vec<u8>>> {
        Err(Status::Unimplemented)
    }

    fn set_header_map_pairs(&mut self, map_type: u32, map: &[u8]) -> Status {
        Status::Unimplemented
    }

    fn get_buffer_bytes(
        &mut self,
        buffer_type: u32,
        start: usize,
        max_size: usize,
    ) -> HostResult<Option<Vec<u8>>> {
        Err(Status::Unimplemented)
    }

    /// Returns the callout id
    fn http_call(
        &mut self,
        upstream: &[u8],
        headers: &[u8],
        body: &[u8],
        trailers: &[u8],
        timeout_ms: u32,
    ) -> HostResult<u32> {
        Err(Status::Unimplemented)
    }

    fn set_tick_period_milliseconds(&mut self, period: u32) -> Status {
        Status::Unimplemented
    }

    fn get_current_time_nanoseconds(&mut self) -> HostResult<u64> {
        Err(Status::Unimplemented)
    }

    fn set_effective_context(&mut self, context_id: u32) -> Status {
        Status::Unimplemented
    }

    fn done(&mut self) -> Status {
        Status::Unimplemented
    }

    /// Returns the metric id
    fn define_metric(&mut self, metric_type: u32, name: &[u8]) -> HostResult<u32> {
        Err(Status::Unimplemented)
    }

    fn increment_metric(&mut self, metric_id: u32, offset: i64) -> Status {
        Status::Unimplemented
    }

    fn record_metric(&mut self, metric_id: u32, value: u64) -> Status {
        Status::Unimplemented
    }

    fn get_metric(&mut self, metric_id: u32) -> HostResult<u64> {
        Err(Status::Unimplemented)
    }
}

thread_local! {
    static HOST: RefCell<Option<Box<dyn HostEmulator>>> = RefCell::new(None);
}

/// Install the emulator for the current thread, returning the previous one
pub fn set_host_emulator(host: Box<dyn HostEmulator>) -> Option<Box<dyn HostEmulator>> {
    HOST.with(|h| h.borrow_mut().replace(host))
}

/// Remove the emulator installed on the current thread
pub fn take_host_emulator() -> Option<Box<dyn HostEmulator>> {
    HOST.with(|h| h.borrow_mut().take())
}

/// Run `f` against the current emulator.
///
/// Returns `None` when no emulator is installed or when called from inside
/// another emulator call.
pub(crate) fn with_host<R>(f: impl FnOnce(&mut dyn HostEmulator) -> R) -> Option<R> {
    HOST.with(|h| {
        let mut slot = h.try_borrow_mut().ok()?;
        let host = slot.as_mut()?;
        Some(f(host.as_mut()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock(u64);

    impl HostEmulator for Clock {
        fn get_current_time_nanoseconds(&mut self) -> HostResult<u64> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_defaults_are_unimplemented() {
        set_host_emulator(Box::new(Clock(7)));
        assert_eq!(with_host(|h| h.done()), Some(Status::Unimplemented));
        assert_eq!(with_host(|h| h.get_current_time_nanoseconds()), Some(Ok(7)));
        take_host_emulator();
    }

    #[test]
    fn test_no_emulator_installed() {
        take_host_emulator();
        assert!(with_host(|h| h.done()).is_none());
    }

    #[test]
    fn test_replace_returns_previous() {
        take_host_emulator();
        assert!(set_host_emulator(Box::new(Clock(1))).is_none());
        assert!(set_host_emulator(Box::new(Clock(2))).is_some());
        assert_eq!(with_host(|h| h.get_current_time_nanoseconds()), Some(Ok(2)));
        take_host_emulator();
    }
}
