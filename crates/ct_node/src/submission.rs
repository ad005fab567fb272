// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Turns validated submissions into the canonical log entry records that
//! get queued for sequencing and signing. The canonicalizer owns the exact
//! byte choices; anything a verifier recomputes independently must come
//! out of here bit-identical.

use crate::deps::{CertChecker, CheckerError};
use der::Encode;
use rfc6962_api::{LogEntry, PreCert, PrecertChainEntry, SignedDataEntry, X509ChainEntry};
use x509_util::{
    has_embedded_scts, serialized_tbs, spki_sha256, CertChain, ChainError, PreCertChain,
};

use crate::deps::SignedData;

#[derive(thiserror::Error, Debug)]
pub enum SubmissionError {
    /// The checker refused the submission; surfaced to clients unchanged.
    #[error(transparent)]
    Checker(#[from] CheckerError),
    /// Precertificate entries need the immediate issuer at chain position 1.
    #[error("chain is missing the precertificate issuer")]
    MissingIssuer,
    /// Ambiguous or malformed certificate structure in a trust-free
    /// conversion.
    #[error(transparent)]
    Chain(#[from] ChainError),
    /// DER re-encoding failed after validation already succeeded.
    #[error("could not DER-encode the chain")]
    Encoding,
}

/// Canonicalizes submissions using a checker for trust decisions. The
/// checker may augment chains with the resolved issuer; whatever it hands
/// back is what gets logged.
pub struct SubmissionHandler<C> {
    cert_checker: C,
}

impl<C: CertChecker> SubmissionHandler<C> {
    pub fn new(cert_checker: C) -> Self {
        Self { cert_checker }
    }

    /// Validates a certificate chain and produces the canonical entry:
    /// the DER leaf plus the issuer chain, order preserved, byte-for-byte
    /// as validated.
    ///
    /// # Errors
    ///
    /// Propagates checker refusals unchanged; anything failing after
    /// validation is [`SubmissionError::Encoding`].
    pub fn process_x509_submission(&self, chain: CertChain) -> Result<LogEntry, SubmissionError> {
        let chain = self.cert_checker.check_cert_chain(chain)?;
        // Nothing should fail anymore as we have validated the chain.
        let mut der = chain.to_der().map_err(|_| SubmissionError::Encoding)?;
        let leaf_certificate = der.remove(0);
        Ok(LogEntry::X509(X509ChainEntry {
            leaf_certificate,
            certificate_chain: der,
        }))
    }

    /// Validates a precertificate chain and produces the canonical entry.
    /// The checker computes the issuer key hash and the de-poisoned TBS;
    /// this function records them together with the submission bytes.
    ///
    /// # Errors
    ///
    /// Propagates checker refusals unchanged; anything failing after
    /// validation is [`SubmissionError::Encoding`].
    pub fn process_pre_cert_submission(
        &self,
        chain: PreCertChain,
    ) -> Result<LogEntry, SubmissionError> {
        let checked = self.cert_checker.check_pre_cert_chain(chain)?;
        let mut der = checked
            .chain
            .to_der()
            .map_err(|_| SubmissionError::Encoding)?;
        let pre_certificate = der.remove(0);
        Ok(LogEntry::Precert(PrecertChainEntry {
            pre_cert: PreCert {
                issuer_key_hash: checked.issuer_key_hash,
                tbs_certificate: checked.tbs_certificate,
            },
            pre_certificate,
            precertificate_chain: der,
        }))
    }

    /// Verifies a signed blob against its configured key and copies it
    /// verbatim into an entry.
    ///
    /// # Errors
    ///
    /// Propagates checker refusals unchanged.
    pub fn process_signed_data_submission(
        &self,
        data: SignedData,
    ) -> Result<LogEntry, SubmissionError> {
        self.cert_checker.check_signed_data(&data)?;
        Ok(LogEntry::SignedData(SignedDataEntry {
            keyid: data.keyid,
            data: data.data,
            signature: data.signature,
        }))
    }
}

/// Reconstructs the signed entry from an observed chain, with no trust
/// check. Used by clients recomputing the bytes a log signed over.
///
/// A leaf carrying the embedded-SCT-list extension yields a precert entry
/// (requiring the issuer at position 1); any other leaf yields an x509
/// entry holding only the leaf bytes.
///
/// # Errors
///
/// Fails on ambiguous extension state, a missing issuer, or DER
/// re-encoding issues; it never guesses.
pub fn x509_chain_to_entry(chain: &CertChain) -> Result<LogEntry, SubmissionError> {
    if has_embedded_scts(chain.leaf())? {
        let issuer = chain.cert_at(1).ok_or(SubmissionError::MissingIssuer)?;
        let issuer_key_hash = spki_sha256(issuer).map_err(|_| SubmissionError::Encoding)?;
        let tbs_certificate = serialized_tbs(chain.leaf())?;
        Ok(LogEntry::Precert(PrecertChainEntry {
            pre_cert: PreCert {
                issuer_key_hash,
                tbs_certificate,
            },
            ..Default::default()
        }))
    } else {
        let leaf_certificate = chain
            .leaf()
            .to_der()
            .map_err(|_| SubmissionError::Encoding)?;
        Ok(LogEntry::X509(X509ChainEntry {
            leaf_certificate,
            ..Default::default()
        }))
    }
}
