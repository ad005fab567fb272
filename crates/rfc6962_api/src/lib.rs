// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Log entry model, [RFC 6962](https://datatracker.ietf.org/doc/html/rfc6962)
//! wire serialization, and the JSON types of the `/ct/v1/` HTTP surface.

pub mod api;
pub mod entry;
pub mod sct;
mod wire;

pub use api::*;
pub use entry::*;
pub use sct::*;
pub use wire::WireError;

/// Unix timestamp, measured since the epoch (January 1, 1970, 00:00),
/// ignoring leap seconds, in milliseconds.
/// This can be unsigned as we never deal with negative timestamps.
pub type UnixTimestamp = u64;
