// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::ClientError;

/// Relay endpoint path, same-origin with the page.
pub const RELAY_PATH: &str = "/ws/notifications";

/// Build the relay URL for `user_id` from the page origin.
///
/// `http://` becomes `ws://` and `https://` becomes `wss://`. Any path on the
/// origin is discarded.
pub fn relay_url(origin: &str, user_id: &str) -> Result<String, ClientError> {
    let (scheme, rest) = if let Some(rest) = origin.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = origin.strip_prefix("http://") {
        ("ws", rest)
    } else {
        return Err(ClientError::InvalidOrigin(origin.to_owned()));
    };

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(ClientError::InvalidOrigin(origin.to_owned()));
    }

    Ok(format!("{scheme}://{host}{RELAY_PATH}?userId={}", urlencoding(user_id)))
}

fn urlencoding(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
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
#[path = "url_tests.rs"]
mod tests;
