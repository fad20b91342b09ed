//! Upload identifier derivation.
//!
//! The hashing deriver is what makes the store content-addressed: the same
//! bytes under the same seed always map to the same [`UploadId`], which is
//! what lets the metadata store's uniqueness constraint detect duplicates.
//!
//! Identifiers are the first 32 characters of the URL-safe base64 encoding
//! of a SHA3-256 digest, i.e. 192 bits of the digest. That is a deliberate
//! trade of collision resistance for a compact, path-safe identifier; it is
//! not a cryptographic guarantee of uniqueness.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha3::{Digest, Sha3_256};

use crate::types::{MAX_UPLOAD_ID_LEN, UploadId};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 32;

/// Width of the big-endian seed prefix fed into the hash.
const SEED_WIDTH: usize = 32;

/// Maps upload content to an [`UploadId`].
pub trait IdDeriver: Send + Sync {
    /// Compute the identifier for `content`.
    fn derive(&self, content: &[u8]) -> UploadId;

    /// Whether [`derive`](Self::derive) is a pure function of the content.
    ///
    /// Only content-addressed derivers can answer "what id did this content
    /// get" after the fact, so duplicate reporting depends on this.
    fn is_content_addressed(&self) -> bool;
}

/// Derive the identifier for `content` under `seed`.
///
/// The seed is written as a 32-byte big-endian integer, followed by the
/// content, into SHA3-256. The digest is base64 (URL-safe alphabet) encoded
/// and truncated to [`MAX_UPLOAD_ID_LEN`] characters.
#[must_use]
pub fn derive_upload_id(seed: u64, content: &[u8]) -> UploadId {
    let mut seed_bytes = [0u8; SEED_WIDTH];
    seed_bytes[SEED_WIDTH - 8..].copy_from_slice(&seed.to_be_bytes());

    let mut hasher = Sha3_256::new();
    hasher.update(seed_bytes);
    hasher.update(content);
    let digest = hasher.finalize();

    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(MAX_UPLOAD_ID_LEN);
    UploadId::from_derived(encoded)
}

/// Content-addressed deriver: SHA3-256 over a fixed seed and the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingIdDeriver {
    seed: u64,
}

impl HashingIdDeriver {
    /// Create a deriver bound to `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The seed this deriver was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for HashingIdDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl IdDeriver for HashingIdDeriver {
    fn derive(&self, content: &[u8]) -> UploadId {
        derive_upload_id(self.seed, content)
    }

    fn is_content_addressed(&self) -> bool {
        true
    }
}

/// Opaque monotonic ids (`"1"`, `"2"`, ...), independent of content.
///
/// Every call yields a fresh id and duplicates are never detected. The
/// counter starts over with the process, so ids can collide with records
/// already in a durable store.
#[derive(Debug, Default)]
pub struct CountingIdDeriver {
    next: AtomicU64,
}

impl CountingIdDeriver {
    /// Create a counter starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdDeriver for CountingIdDeriver {
    fn derive(&self, _content: &[u8]) -> UploadId {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        UploadId::from_derived(n.to_string())
    }

    fn is_content_addressed(&self) -> bool {
        false
    }
}

impl UploadId {
    /// Wrap a value produced by a deriver. Derivers only emit URL-safe
    /// base64 or decimal digits, both of which satisfy the id grammar.
    fn from_derived(value: String) -> Self {
        debug_assert!(Self::parse(value.clone()).is_ok(), "derived id {value} is invalid");
        Self(value)
    }
}
