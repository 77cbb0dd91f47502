//! Shared utilities for adapter-layer validation and FFI strings.
//!
//! Used by the WiFi adapter (SSID checks) and the mDNS adapter (hostname
//! checks and NUL-terminated buffers for the C API).

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// RFC 1123 host label: 1-63 of `[A-Za-z0-9-]`, no leading or trailing hyphen.
pub(super) fn is_valid_hostname(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 63
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Copy `s` into a NUL-terminated buffer, truncating to `N - 1` bytes.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
pub(super) fn c_string<const N: usize>(s: &str) -> [u8; N] {
    let mut buf = [0u8; N];
    let len = s.len().min(N.saturating_sub(1));
    buf[..len].copy_from_slice(&s.as_bytes()[..len]);
    buf
}
