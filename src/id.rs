//! Request identifiers

use std::sync::atomic::{AtomicU32, Ordering};

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a request ID
///
/// Format: `req-{timestamp_ms}-{sequence_hex}`
/// Example: `req-1738300800123-002a`
pub fn generate_request_id() -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xffff;
    format!("req-{}-{:04x}", now_ms(), seq)
}
