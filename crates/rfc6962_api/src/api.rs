// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! JSON bodies of the RFC 6962 submission and monitoring APIs.

use crate::UnixTimestamp;
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

/// Add-(pre-)chain request.
#[serde_as]
#[derive(Deserialize)]
pub struct AddChainRequest {
    #[serde_as(as = "Vec<Base64>")]
    pub chain: Vec<Vec<u8>>,
}

/// Add-signed-data request.
#[serde_as]
#[derive(Deserialize)]
pub struct AddSignedDataRequest {
    #[serde_as(as = "Base64")]
    pub keyid: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub signature: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub data: Vec<u8>,
}

/// Add-(pre-)chain and add-signed-data response.
#[serde_as]
#[derive(Serialize)]
pub struct AddChainResponse {
    pub sct_version: u8,
    #[serde_as(as = "Base64")]
    pub id: Vec<u8>,
    pub timestamp: UnixTimestamp,
    #[serde_as(as = "Base64")]
    pub extensions: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub signature: Vec<u8>,
}

/// Get-sth response.
#[serde_as]
#[derive(Serialize)]
pub struct GetSthResponse {
    pub tree_size: u64,
    pub timestamp: UnixTimestamp,
    #[serde_as(as = "Base64")]
    pub sha256_root_hash: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub tree_head_signature: Vec<u8>,
}

/// One element of a get-entries response.
#[serde_as]
#[derive(Serialize)]
pub struct EntryResponse {
    #[serde_as(as = "Base64")]
    pub leaf_input: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub extra_data: Vec<u8>,
    /// Only populated for `include_scts` requests; non-standard, used by
    /// peer nodes following this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<Base64>")]
    pub sct: Option<Vec<u8>>,
}

/// Get-entries response.
#[derive(Serialize)]
pub struct GetEntriesResponse {
    pub entries: Vec<EntryResponse>,
}

/// Get-proof-by-hash response.
#[serde_as]
#[derive(Serialize)]
pub struct GetProofByHashResponse {
    pub leaf_index: u64,
    #[serde_as(as = "Vec<Base64>")]
    pub audit_path: Vec<Vec<u8>>,
}

/// Get-sth-consistency response.
#[serde_as]
#[derive(Serialize)]
pub struct GetSthConsistencyResponse {
    #[serde_as(as = "Vec<Base64>")]
    pub consistency: Vec<Vec<u8>>,
}

/// Get-roots response.
#[serde_as]
#[derive(Serialize)]
pub struct GetRootsResponse {
    #[serde_as(as = "Vec<Base64>")]
    pub certificates: Vec<Vec<u8>>,
}
