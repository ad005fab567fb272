// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! TLS-style length-prefixed writes used by the RFC 6962 encodings.

use byteorder::{BigEndian, WriteBytesExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WireError {
    #[error("value of {len} bytes exceeds a {prefix_bytes}-byte length prefix")]
    Oversize { len: usize, prefix_bytes: usize },
}

/// Appends `data` to `buffer` behind a big-endian length prefix of
/// `prefix_bytes` bytes.
///
/// # Errors
///
/// Returns [`WireError::Oversize`] if `data` does not fit the prefix width.
pub(crate) fn write_length_prefixed(
    buffer: &mut Vec<u8>,
    data: &[u8],
    prefix_bytes: usize,
) -> Result<(), WireError> {
    if data.len() >= 1 << (8 * prefix_bytes) {
        return Err(WireError::Oversize {
            len: data.len(),
            prefix_bytes,
        });
    }
    buffer
        .write_uint::<BigEndian>(data.len() as u64, prefix_bytes)
        .unwrap();
    buffer.extend_from_slice(data);
    Ok(())
}
