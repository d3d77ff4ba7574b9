// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream notification backend: URL construction and the per-user bridge.

pub mod bridge;

/// Path prefix of the backend's per-patient notification socket.
pub const NOTIFICATION_PATH: &str = "/ws/notifications/patient";

/// Build the upstream WebSocket URL for `user_id`.
///
/// `http(s)://` backends are flipped to `ws(s)://`; `ws(s)://` is kept.
pub fn upstream_url(backend_url: &str, user_id: &str) -> String {
    let base = backend_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    format!("{ws_base}{NOTIFICATION_PATH}/{}", encode_path_segment(user_id))
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0xf) as usize]));
            }
        }
    }
    out
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
