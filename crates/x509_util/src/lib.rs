// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Utilities for X.509 operations: trust-anchor pools, parsed submission
//! chains, and the TBS canonicalization used for precertificate entries.

use der::{
    asn1::Null,
    oid::{
        db::rfc6962::{CT_PRECERT_POISON, CT_PRECERT_SCTS},
        AssociatedOid, ObjectIdentifier,
    },
    Decode, Encode, Error as DerError,
};
use sha2::{Digest, Sha256};
use std::collections::{hash_map::Entry, HashMap};
use x509_cert::{impl_newtype, Certificate};

#[derive(thiserror::Error, Debug)]
pub enum ChainError {
    #[error(transparent)]
    Der(#[from] DerError),
    #[error("empty submission")]
    EmptyChain,
    #[error("certificate at position {0} is not valid DER")]
    Unparseable(usize),
    #[error("CT poison extension is not critical or invalid")]
    InvalidCTPoison,
    #[error("extension appears more than once")]
    DuplicateExtension,
    #[error("leaf is neither poisoned nor carries embedded SCTs")]
    NotAPrecert,
}

/// Precertificate poison extension that can be decoded with
/// [`x509_cert::certificate::TbsCertificate::get`].
#[derive(Debug)]
struct CTPrecertPoison(Null);

impl AssociatedOid for CTPrecertPoison {
    const OID: ObjectIdentifier = CT_PRECERT_POISON;
}
impl_newtype!(CTPrecertPoison, Null);

/// Returns whether the certificate carries the critical precertificate
/// poison extension. A poison extension that is present but non-critical or
/// non-Null is an error, never a guess.
pub fn has_precert_poison(cert: &Certificate) -> Result<bool, ChainError> {
    match cert.tbs_certificate.get::<CTPrecertPoison>()? {
        Some((true, _)) => Ok(true),
        Some((false, _)) => Err(ChainError::InvalidCTPoison),
        None => Ok(false),
    }
}

/// Returns whether the certificate carries the embedded-SCT-list extension.
/// A certificate carrying it more than once is an error.
pub fn has_embedded_scts(cert: &Certificate) -> Result<bool, ChainError> {
    let count = cert
        .tbs_certificate
        .extensions
        .iter()
        .flatten()
        .filter(|ext| ext.extn_id == CT_PRECERT_SCTS)
        .count();
    match count {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(ChainError::DuplicateExtension),
    }
}

/// SHA-256 over the DER `SubjectPublicKeyInfo` of the certificate: the
/// `issuer_key_hash` input for precertificate entries.
///
/// # Errors
///
/// Returns an error if the SPKI cannot be DER-encoded.
pub fn spki_sha256(cert: &Certificate) -> Result<[u8; 32], DerError> {
    Ok(Sha256::digest(cert.tbs_certificate.subject_public_key_info.to_der()?).into())
}

/// Re-encodes the certificate's `TBSCertificate`, stripping the
/// embedded-SCT-list extension if present and changing nothing else. The
/// output is the canonical signed form an independent verifier recomputes,
/// so every other field must survive bit-for-bit.
///
/// # Errors
///
/// Returns an error on ambiguous extension state or DER re-encode failure.
pub fn serialized_tbs(cert: &Certificate) -> Result<Vec<u8>, ChainError> {
    let mut tbs = cert.tbs_certificate.clone();
    if has_embedded_scts(cert)? {
        if let Some(exts) = tbs.extensions.as_mut() {
            if let Some(idx) = exts.iter().position(|ext| ext.extn_id == CT_PRECERT_SCTS) {
                exts.remove(idx);
            }
        }
    }
    Ok(tbs.to_der()?)
}

/// Converts a slice of certificates into DER, preserving order.
///
/// # Errors
///
/// Returns an error if any certificate cannot be DER-encoded.
pub fn certs_to_der(certs: &[Certificate]) -> Result<Vec<Vec<u8>>, DerError> {
    certs.iter().map(Encode::to_der).collect()
}

/// An ordered, non-empty certificate chain: the leaf at position 0 followed
/// by issuers up to (but not necessarily including) a trusted root.
#[derive(Debug, Clone)]
pub struct CertChain {
    certs: Vec<Certificate>,
}

impl CertChain {
    /// Parses a submitted chain of DER certificates.
    ///
    /// # Errors
    ///
    /// Returns `EmptyChain` for an empty submission and `Unparseable` if
    /// any element fails to parse; a chain is never partially constructed.
    pub fn from_der_chain(raw: &[Vec<u8>]) -> Result<Self, ChainError> {
        if raw.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        let certs = raw
            .iter()
            .enumerate()
            .map(|(i, bytes)| Certificate::from_der(bytes).map_err(|_| ChainError::Unparseable(i)))
            .collect::<Result<_, _>>()?;
        Ok(Self { certs })
    }

    pub fn leaf(&self) -> &Certificate {
        &self.certs[0]
    }

    pub fn cert_at(&self, i: usize) -> Option<&Certificate> {
        self.certs.get(i)
    }

    #[allow(clippy::len_without_is_empty)] // a constructed chain always has a leaf
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Appends an issuer resolved from the trust store. Used by checkers
    /// that complete a submission with its inferred root.
    pub fn push(&mut self, cert: Certificate) {
        self.certs.push(cert);
    }

    /// DER encodings of every certificate in chain order.
    ///
    /// # Errors
    ///
    /// Returns an error if any certificate cannot be DER-encoded.
    pub fn to_der(&self) -> Result<Vec<Vec<u8>>, DerError> {
        certs_to_der(&self.certs)
    }
}

/// A certificate chain whose leaf is a precertificate: it must carry the
/// poison extension or the embedded-SCT-list extension.
#[derive(Debug, Clone)]
pub struct PreCertChain {
    chain: CertChain,
}

impl PreCertChain {
    /// Parses a submitted precertificate chain.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error, or `NotAPrecert` if the leaf
    /// carries neither precertificate marker.
    pub fn from_der_chain(raw: &[Vec<u8>]) -> Result<Self, ChainError> {
        let chain = CertChain::from_der_chain(raw)?;
        if !has_precert_poison(chain.leaf())? && !has_embedded_scts(chain.leaf())? {
            return Err(ChainError::NotAPrecert);
        }
        Ok(Self { chain })
    }

    pub fn push(&mut self, cert: Certificate) {
        self.chain.push(cert);
    }
}

impl std::ops::Deref for PreCertChain {
    type Target = CertChain;

    fn deref(&self) -> &CertChain {
        &self.chain
    }
}

/// A `CertPool` is a set of trust-anchor certificates.
#[derive(Default)]
pub struct CertPool {
    // Map from SHA-256 fingerprint to index in `certs`, for deduplication
    // and membership checks.
    by_fingerprint: HashMap<[u8; 32], usize>,
    certs: Vec<Certificate>,
}

impl CertPool {
    /// Constructs a pool from the given certificates, weeding out
    /// duplicates.
    ///
    /// # Errors
    ///
    /// Returns an error if a certificate cannot be DER-encoded for
    /// fingerprinting.
    pub fn new(certs: Vec<Certificate>) -> Result<Self, DerError> {
        let mut pool = Self::default();
        for cert in certs {
            pool.add_cert(cert)?;
        }
        Ok(pool)
    }

    /// Adds a certificate to the pool if it is not already included.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate cannot be DER-encoded.
    pub fn add_cert(&mut self, cert: Certificate) -> Result<(), DerError> {
        let fingerprint: [u8; 32] = Sha256::digest(cert.to_der()?).into();
        if let Entry::Vacant(e) = self.by_fingerprint.entry(fingerprint) {
            e.insert(self.certs.len());
            self.certs.push(cert);
        }
        Ok(())
    }

    /// Checks membership by fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate cannot be DER-encoded.
    pub fn includes(&self, cert: &Certificate) -> Result<bool, DerError> {
        Ok(self
            .by_fingerprint
            .contains_key::<[u8; 32]>(&Sha256::digest(cert.to_der()?).into()))
    }

    pub fn certs(&self) -> &[Certificate] {
        &self.certs
    }
}
