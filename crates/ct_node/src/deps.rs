// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! The seams between this node's request-handling plane and the rest of
//! the cluster. Every collaborator the handlers call is behind one of
//! these traits; production wiring supplies the real implementations and
//! the test suite supplies in-memory fakes.

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use rfc6962_api::{LoggedEntry, SignedCertificateTimestamp, SignedTreeHead};
use x509_util::{CertChain, CertPool, PreCertChain};

/// A parsed add-signed-data submission, before validation.
#[derive(Debug, Clone, Default)]
pub struct SignedData {
    pub keyid: Vec<u8>,
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Why a checker refused a submission. Checker statuses flow through the
/// canonicalizer unchanged; only the HTTP adapter turns them into status
/// codes.
#[derive(thiserror::Error, Debug)]
pub enum CheckerError {
    #[error("{0}")]
    Rejected(String),
    #[error("checker failure: {0}")]
    Internal(String),
}

/// The result of a successful precertificate check: the (possibly
/// augmented) chain plus the two canonical values only the checker can
/// compute.
pub struct CheckedPreCert {
    pub chain: PreCertChain,
    /// SHA-256 of the DER SPKI of the immediate issuer.
    pub issuer_key_hash: [u8; 32],
    /// DER `TBSCertificate` of the leaf with the poison extension removed.
    pub tbs_certificate: Vec<u8>,
}

/// Validates submissions against the node's trust anchors. May append the
/// resolved issuer to the chain it returns, so callers must not hold on to
/// the submitted chain.
pub trait CertChecker: Send + Sync {
    fn check_cert_chain(&self, chain: CertChain) -> Result<CertChain, CheckerError>;
    fn check_pre_cert_chain(&self, chain: PreCertChain) -> Result<CheckedPreCert, CheckerError>;
    fn check_signed_data(&self, data: &SignedData) -> Result<(), CheckerError>;
    fn trusted_certificates(&self) -> &CertPool;
}

/// An inclusion proof for a leaf hash at a given tree size.
#[derive(Debug, Clone, Default)]
pub struct AuditProof {
    pub leaf_index: u64,
    pub audit_path: Vec<Vec<u8>>,
}

#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("hash not found at this tree size")]
    NotFound,
}

/// Read access to the node's Merkle tree replica. Proof computations may
/// take internal locks, so handlers call them off the I/O path.
pub trait LogLookup: Send + Sync {
    fn get_sth(&self) -> SignedTreeHead;
    fn audit_proof(&self, leaf_hash: &[u8], tree_size: u64) -> Result<AuditProof, LookupError>;
    fn consistency_proof(&self, first: u64, second: u64) -> Vec<Vec<u8>>;
}

/// Read access to sequenced entries. The cursor may block on disk, so
/// handlers scan off the I/O path.
pub trait ReadOnlyDatabase: Send + Sync {
    /// Returns a cursor over entries starting at `start`, in sequence
    /// order. Gaps show up as a skipped `sequence_number`, not as errors.
    fn scan_entries(&self, start: u64) -> Box<dyn Iterator<Item = LoggedEntry> + Send + '_>;
}

/// The cluster-state oracle. `node_is_stale` may block on internal locks.
pub trait ClusterStateController: Send + Sync {
    fn node_is_stale(&self) -> bool;
}

/// Outcome of queueing a submission for sequencing, other than success.
#[derive(thiserror::Error, Debug)]
pub enum QueueError {
    /// The sequencer already holds this entry; carries the SCT issued for
    /// the first submission, which is returned to the client as-is.
    #[error("duplicate submission")]
    AlreadyExists(Box<SignedCertificateTimestamp>),
    #[error("sequencer queue is full")]
    ResourceExhausted,
    /// Validation failure, including everything the checker refused.
    #[error("{0}")]
    Rejected(String),
}

/// The sequencing frontend: canonicalizes and queues accepted submissions,
/// returning the SCT for the new (or previously sequenced) entry. May
/// block on the sequencer queue.
pub trait Frontend: Send + Sync {
    fn queue_x509_entry(&self, chain: CertChain)
        -> Result<SignedCertificateTimestamp, QueueError>;
    fn queue_pre_cert_entry(
        &self,
        chain: PreCertChain,
    ) -> Result<SignedCertificateTimestamp, QueueError>;
    fn queue_signed_data_entry(
        &self,
        data: SignedData,
    ) -> Result<SignedCertificateTimestamp, QueueError>;
}

#[derive(thiserror::Error, Debug)]
#[error("proxy request failed: {0}")]
pub struct ProxyError(pub String);

/// Forwards a request this node cannot authoritatively answer to a peer.
/// Outbound I/O, so never called on a path that cannot await.
#[async_trait]
pub trait Proxy: Send + Sync {
    async fn proxy_request(&self, request: Request) -> Result<Response, ProxyError>;
}
