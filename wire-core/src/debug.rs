//! `WAYLAND_DEBUG`-gated wire dump to stderr, independent of the `log`
//! crate's structured logging — this always prints in the same terse
//! `object@id.message(args)` shape a reference implementation uses, so
//! existing tooling that greps for it keeps working.

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

fn debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        matches!(std::env::var_os("WAYLAND_DEBUG"), Some(v) if v == "1" || v == "client" || v == "server")
    })
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Print one dispatched (inbound) message if `WAYLAND_DEBUG` is set.
pub fn print_dispatched(interface: &str, id: u32, message: &str, args: &str) {
    if !debug_enabled() {
        return;
    }
    eprintln!("[{:>10}] {}@{}.{}({})", timestamp_ms(), interface, id, message, args);
}

/// Print one outbound message if `WAYLAND_DEBUG` is set.
pub fn print_sent(interface: &str, id: u32, message: &str, args: &str) {
    if !debug_enabled() {
        return;
    }
    eprintln!("[{:>10}] {}@{}.{} -> ({})", timestamp_ms(), interface, id, message, args);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_by_default_does_not_panic() {
        // SAFETY: test-local env mutation, no other thread in this test touches this var.
        unsafe {
            std::env::remove_var("WAYLAND_DEBUG");
        }
        print_dispatched("wl_display", 1, "error", "1, 2, \"boom\"");
    }
}
