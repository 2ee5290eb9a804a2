//! Global panic hook
//!
//! Logs the panic location and message through tracing, then exits
//! non-zero. With `panic = "abort"` in release builds no unwinding
//! cleanup runs, so the log line is the last word from the process.
//!
//! ```no_run
//! use quoter_core::resilience::install_panic_handler;
//!
//! fn main() {
//!     install_panic_handler();
//!     // ... rest of application
//! }
//! ```

use std::panic;
use std::process;
use tracing::error;

/// Install the panic hook; safe to call more than once
pub fn install_panic_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "<unknown location>".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "<no message>".to_string()
        };

        error!(
            location = %location,
            message = %message,
            "PANIC: quoter crashed, resting orders may need manual cancellation"
        );

        // Backup in case tracing is not initialised
        eprintln!("FATAL PANIC at {}: {}", location, message);

        // Prints the backtrace if RUST_BACKTRACE=1
        default_hook(panic_info);

        std::thread::sleep(std::time::Duration::from_millis(100));
        process::exit(1);
    }));

    tracing::debug!("Panic handler installed");
}
