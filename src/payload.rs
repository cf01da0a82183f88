//! Scratch payload for the upload probe.
//!
//! The original agent truncated a `test-upload` file on disk before
//! scheduling the upload job; here the payload is an in-memory [`Bytes`]
//! blob created once during bootstrap. It is immutable after creation and
//! cheap to clone into every upload request body, so concurrent upload runs
//! share the same backing storage without synchronization.

use bytes::Bytes;

/// Build the fixed-size, zero-filled upload payload.
///
/// Must be called before the upload job first runs; the returned value's
/// length is what the upload size gauge reports on success.
pub fn scratch_payload(len: usize) -> Bytes {
    Bytes::from(vec![0u8; len])
}
