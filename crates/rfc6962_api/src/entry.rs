// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! The log entry model and its RFC 6962 serializations.
//!
//! References:
//! - [RFC 6962 §3.4](https://datatracker.ietf.org/doc/html/rfc6962#section-3.4) (`MerkleTreeLeaf`)
//! - [RFC 6962 §4.6](https://datatracker.ietf.org/doc/html/rfc6962#section-4.6) (`extra_data`)

use crate::sct::SignedCertificateTimestamp;
use crate::wire::{write_length_prefixed, WireError};
use crate::UnixTimestamp;
use byteorder::{BigEndian, WriteBytesExt};

/// `Version` and `MerkleLeafType` are both pinned to their only defined
/// values (v1, `timestamped_entry`).
const LEAF_VERSION_V1: u8 = 0;
const LEAF_TYPE_TIMESTAMPED_ENTRY: u8 = 0;

/// Wire values of `LogEntryType`. The `signed_data_entry` type is a
/// non-standard extension for logging arbitrary signed blobs.
pub const X509_ENTRY: u16 = 0;
pub const PRECERT_ENTRY: u16 = 1;
pub const SIGNED_DATA_ENTRY: u16 = 2;

/// An entry accepted into the log, with exactly one populated payload.
/// The wire `entry_type` tag is derived from the variant, so a mismatched
/// tag/payload pair cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    X509(X509ChainEntry),
    Precert(PrecertChainEntry),
    SignedData(SignedDataEntry),
}

/// A certificate submission: the DER leaf plus its issuer chain in
/// submission order, excluding the leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct X509ChainEntry {
    pub leaf_certificate: Vec<u8>,
    pub certificate_chain: Vec<Vec<u8>>,
}

/// A precertificate submission. `pre_certificate` is the leaf exactly as
/// submitted (poison extension intact); `pre_cert` holds the canonical form
/// that verifiers recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecertChainEntry {
    pub pre_cert: PreCert,
    pub pre_certificate: Vec<u8>,
    pub precertificate_chain: Vec<Vec<u8>>,
}

/// The signed portion of a precertificate entry.
/// `issuer_key_hash` is SHA-256 over the DER `SubjectPublicKeyInfo` of the
/// immediate issuer; `tbs_certificate` is the leaf's `TBSCertificate` with
/// the embedded-SCT-list extension stripped and nothing else changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreCert {
    pub issuer_key_hash: [u8; 32],
    pub tbs_certificate: Vec<u8>,
}

/// An arbitrary signed blob submission. `keyid` identifies the verification
/// key configured out of band; `signature` covers `data`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedDataEntry {
    pub keyid: Vec<u8>,
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
}

impl LogEntry {
    /// The wire `LogEntryType` value for this entry.
    pub fn entry_type(&self) -> u16 {
        match self {
            LogEntry::X509(_) => X509_ENTRY,
            LogEntry::Precert(_) => PRECERT_ENTRY,
            LogEntry::SignedData(_) => SIGNED_DATA_ENTRY,
        }
    }

    /// Appends the `signed_entry` select arm of `TimestampedEntry`.
    ///
    /// ```text
    /// select (entry_type) {
    ///     case x509_entry: ASN.1Cert;
    ///     case precert_entry: PreCert;
    ///     case signed_data_entry: opaque keyid<0..2^16-1>;
    ///                             opaque data<0..2^24-1>;
    /// } signed_entry;
    /// ```
    fn write_signed_entry(&self, buffer: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            LogEntry::X509(x509) => {
                write_length_prefixed(buffer, &x509.leaf_certificate, 3)?;
            }
            LogEntry::Precert(precert) => {
                buffer.extend_from_slice(&precert.pre_cert.issuer_key_hash);
                write_length_prefixed(buffer, &precert.pre_cert.tbs_certificate, 3)?;
            }
            LogEntry::SignedData(signed) => {
                write_length_prefixed(buffer, &signed.keyid, 2)?;
                write_length_prefixed(buffer, &signed.data, 3)?;
            }
        }
        Ok(())
    }

    /// Returns a marshaled RFC 6962 `TimestampedEntry` with the given
    /// timestamp and SCT extensions.
    fn marshal_timestamped_entry(
        &self,
        timestamp: UnixTimestamp,
        extensions: &[u8],
    ) -> Result<Vec<u8>, WireError> {
        let mut buffer = Vec::new();
        buffer.write_u64::<BigEndian>(timestamp).unwrap();
        buffer.write_u16::<BigEndian>(self.entry_type()).unwrap();
        self.write_signed_entry(&mut buffer)?;
        write_length_prefixed(&mut buffer, extensions, 2)?;
        Ok(buffer)
    }

    /// Returns a marshaled [RFC 6962 `MerkleTreeLeaf`](https://datatracker.ietf.org/doc/html/rfc6962#section-3.4):
    /// the exact bytes hashed into the Merkle tree for this entry.
    ///
    /// # Errors
    ///
    /// Returns an error if any field exceeds its length-prefix width.
    pub fn merkle_tree_leaf(&self, timestamp: UnixTimestamp, extensions: &[u8]) -> Result<Vec<u8>, WireError> {
        let mut buffer = vec![LEAF_VERSION_V1, LEAF_TYPE_TIMESTAMPED_ENTRY];
        buffer.extend(self.marshal_timestamped_entry(timestamp, extensions)?);
        Ok(buffer)
    }

    /// Returns the marshaled out-of-band data served next to the leaf in
    /// `get-entries` responses.
    ///
    /// ```text
    /// case x509_entry:        ASN.1Cert certificate_chain<0..2^24-1>;
    /// case precert_entry:     ASN.1Cert pre_certificate;
    ///                         ASN.1Cert precertificate_chain<0..2^24-1>;
    /// case signed_data_entry: opaque signature<0..2^16-1>;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if any field exceeds its length-prefix width.
    pub fn extra_data(&self) -> Result<Vec<u8>, WireError> {
        let mut buffer = Vec::new();
        match self {
            LogEntry::X509(x509) => {
                write_cert_list(&mut buffer, &x509.certificate_chain)?;
            }
            LogEntry::Precert(precert) => {
                write_length_prefixed(&mut buffer, &precert.pre_certificate, 3)?;
                write_cert_list(&mut buffer, &precert.precertificate_chain)?;
            }
            LogEntry::SignedData(signed) => {
                write_length_prefixed(&mut buffer, &signed.signature, 2)?;
            }
        }
        Ok(buffer)
    }
}

/// Writes `ASN.1Cert chain<0..2^24-1>`: an outer 3-byte list prefix over
/// 3-byte-prefixed certificates.
fn write_cert_list(buffer: &mut Vec<u8>, certs: &[Vec<u8>]) -> Result<(), WireError> {
    let mut list = Vec::new();
    for cert in certs {
        write_length_prefixed(&mut list, cert, 3)?;
    }
    write_length_prefixed(buffer, &list, 3)
}

/// A sequenced record as stored by the log database: the entry, its
/// position, and the SCT issued for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEntry {
    pub sequence_number: u64,
    pub entry: LogEntry,
    pub sct: SignedCertificateTimestamp,
}

impl LoggedEntry {
    /// Renders the `leaf_input` blob for this record: the `MerkleTreeLeaf`
    /// under the timestamp and extensions of the issued SCT.
    ///
    /// # Errors
    ///
    /// Returns an error if any field exceeds its length-prefix width.
    pub fn serialize_for_leaf(&self) -> Result<Vec<u8>, WireError> {
        self.entry
            .merkle_tree_leaf(self.sct.timestamp, &self.sct.extensions)
    }

    /// Renders the `extra_data` blob for this record.
    ///
    /// # Errors
    ///
    /// Returns an error if any field exceeds its length-prefix width.
    pub fn serialize_extra_data(&self) -> Result<Vec<u8>, WireError> {
        self.entry.extra_data()
    }
}
