//! Guest Logging
//!
//! Flat helpers that send one message per call to the host log, plus a
//! [`log::Log`] backend so plugins (and this crate) can use the ordinary
//! `log` macros. Host failures while logging are dropped; there is nowhere
//! left to report them.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Once;

use crate::hostcall;
use crate::types::LogLevel;

pub fn log_trace(message: &str) {
    let _ = hostcall::log(LogLevel::Trace, message);
}

pub fn log_debug(message: &str) {
    let _ = hostcall::log(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    let _ = hostcall::log(LogLevel::Info, message);
}

pub fn log_warn(message: &str) {
    let _ = hostcall::log(LogLevel::Warn, message);
}

pub fn log_error(message: &str) {
    let _ = hostcall::log(LogLevel::Error, message);
}

pub fn log_critical(message: &str) {
    let _ = hostcall::log(LogLevel::Critical, message);
}

// ============================================================
// `log` backend
// ============================================================

struct HostLogger {
    level: AtomicU32,
}

static LOGGER: HostLogger = HostLogger {
    level: AtomicU32::new(LogLevel::Info as u32),
};

static INSTALLED: AtomicBool = AtomicBool::new(false);

impl log::Log for HostLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        LogLevel::from(metadata.level()) as u32 >= self.level.load(Ordering::Relaxed)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        let _ = hostcall::log(LogLevel::from(record.level()), &message);
    }

    fn flush(&self) {}
}

/// Route the `log` macros to the host at `level` and above.
///
/// The backend is installed on first call; later calls only move the level.
/// Returns `false` if another `log` backend was installed first.
pub fn set_log_level(level: LogLevel) -> bool {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| INSTALLED.store(log::set_logger(&LOGGER).is_ok(), Ordering::Relaxed));

    LOGGER.level.store(level as u32, Ordering::Relaxed);
    let installed = INSTALLED.load(Ordering::Relaxed);
    if installed {
        log::set_max_level(level.to_level_filter());
    }
    installed
}

/// Report guest panics to the host log before the instance traps
#[cfg(target_arch = "wasm32")]
pub(crate) fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let _ = hostcall::log(LogLevel::Critical, &info.to_string());
        }));
    });
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn install_panic_hook() {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hostcall::{set_host_emulator, HostEmulator};
    use crate::types::Status;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Sink(Rc<RefCell<Vec<(u32, String)>>>);

    impl HostEmulator for Sink {
        fn log(&mut self, level: u32, message: &str) -> Status {
            self.0.borrow_mut().push((level, message.to_string()));
            Status::Ok
        }
    }

    fn sink() -> Rc<RefCell<Vec<(u32, String)>>> {
        let lines = Rc::new(RefCell::new(Vec::new()));
        set_host_emulator(Box::new(Sink(lines.clone())));
        lines
    }

    #[test]
    fn test_flat_helpers_use_their_level() {
        let lines = sink();
        log_trace("t");
        log_debug("d");
        log_info("i");
        log_warn("w");
        log_error("e");
        log_critical("c");
        let levels: Vec<u32> = lines.borrow().iter().map(|(l, _)| *l).collect();
        assert_eq!(levels, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(lines.borrow()[4].1, "e");
    }

    #[test]
    fn test_helpers_without_host_do_not_panic() {
        crate::hostcall::take_host_emulator();
        log_info("dropped");
    }

    #[test]
    fn test_backend_filters_by_level() {
        let lines = sink();
        assert!(set_log_level(LogLevel::Warn));
        log::info!("hidden");
        log::warn!("shown {}", 1);
        log::error!("also shown");
        let seen = lines.borrow().clone();
        assert_eq!(seen, vec![(3, "shown 1".to_string()), (4, "also shown".to_string())]);
    }
}
