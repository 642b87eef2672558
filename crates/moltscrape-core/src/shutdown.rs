//! Graceful-stop flag set from signal handlers
//!
//! The harvest loop polls this between batches; setting it lets the current
//! batch finish and its checkpoint land before the process exits.

use std::sync::atomic::{AtomicBool, Ordering};

pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::Relaxed)
}

pub fn request_shutdown() {
    shutdown_flag().store(true, Ordering::Relaxed);
}
