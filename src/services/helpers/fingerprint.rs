//! Content-based message identity for deduplication.

use sha2::{Digest, Sha256};

/// Number of body characters folded into the fingerprint. Enough to tell
/// messages apart without hashing multi-megabyte bodies.
const BODY_PREFIX_CHARS: usize = 100;

/// Derive a stable id from sender, subject, and the body prefix.
///
/// Reprocessing the same logical message always yields the same id, which
/// makes storage upserts idempotent. This is a dedup key, not an
/// authentication mechanism.
pub fn fingerprint(sender: &str, subject: &str, body: &str) -> String {
    let prefix: String = body.chars().take(BODY_PREFIX_CHARS).collect();

    let mut hasher = Sha256::new();
    hasher.update(sender.as_bytes());
    hasher.update(subject.as_bytes());
    hasher.update(prefix.as_bytes());

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
