use std::fmt::Write;

use sha2::{Digest, Sha256};

use crate::MonitoredEntry;

/// SHA-256 of the UTF-8 bytes of `text`, as 64 lowercase hex characters.
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// True exactly when `new_hash` differs from the stored fingerprint.
pub fn has_changed(entry: &MonitoredEntry, new_hash: &str) -> bool {
    entry.last_content_hash != new_hash
}
