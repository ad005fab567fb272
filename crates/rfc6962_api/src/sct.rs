// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Signed certificate timestamps and signed tree heads as the node stores
//! and serves them.

use crate::wire::{write_length_prefixed, WireError};
use crate::UnixTimestamp;
use byteorder::{BigEndian, WriteBytesExt};

const SCT_VERSION_V1: u8 = 0;

/// A log's signed promise to incorporate a submission.
///
/// `signature` holds the serialized RFC 5246 `DigitallySigned` structure
/// exactly as produced by the signer, so re-serializing an SCT is
/// byte-stable across nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedCertificateTimestamp {
    /// SHA-256 of the log's public key (`LogID.key_id`).
    pub log_id: [u8; 32],
    /// Milliseconds since the Unix epoch.
    pub timestamp: UnixTimestamp,
    /// `CtExtensions`, usually empty.
    pub extensions: Vec<u8>,
    /// Serialized `DigitallySigned` blob.
    pub signature: Vec<u8>,
}

impl SignedCertificateTimestamp {
    /// Returns the wire form per [RFC 6962 §3.2](https://datatracker.ietf.org/doc/html/rfc6962#section-3.2):
    ///
    /// ```text
    /// struct {
    ///     Version sct_version;
    ///     LogID id;
    ///     uint64 timestamp;
    ///     CtExtensions extensions;
    ///     digitally-signed struct { ... };
    /// } SignedCertificateTimestamp;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the extensions exceed their length-prefix width.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut buffer = vec![SCT_VERSION_V1];
        buffer.extend_from_slice(&self.log_id);
        buffer.write_u64::<BigEndian>(self.timestamp).unwrap();
        write_length_prefixed(&mut buffer, &self.extensions, 2)?;
        buffer.extend_from_slice(&self.signature);
        Ok(buffer)
    }
}

/// A signed commitment to the Merkle root at a given tree size, as served
/// by `get-sth`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedTreeHead {
    pub tree_size: u64,
    pub timestamp: UnixTimestamp,
    pub sha256_root_hash: [u8; 32],
    /// Serialized `DigitallySigned` blob over the `TreeHeadSignature` input.
    pub signature: Vec<u8>,
}
