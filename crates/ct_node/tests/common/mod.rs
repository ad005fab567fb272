// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! In-memory fakes for every collaborator seam, plus programmatic
//! certificate fixtures.

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use ct_node::deps::{
    AuditProof, CertChecker, CheckedPreCert, CheckerError, ClusterStateController, Frontend,
    LogLookup, LookupError, Proxy, ProxyError, QueueError, ReadOnlyDatabase, SignedData,
};
use ct_node::{ct_router, NodeConfig, NodeState, SubmissionHandler};
use der::asn1::{BitString, Null, OctetString};
use der::oid::db::rfc5912::ECDSA_WITH_SHA_256;
use der::oid::db::rfc6962::{CT_PRECERT_POISON, CT_PRECERT_SCTS};
use der::{Decode, Encode};
use p256::pkcs8::EncodePublicKey;
use rfc6962_api::{
    LogEntry, LoggedEntry, SignedCertificateTimestamp, SignedDataEntry, SignedTreeHead,
    X509ChainEntry,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;
use x509_util::{serialized_tbs, spki_sha256, CertChain, CertPool, PreCertChain};

// ---- certificate fixtures ----

pub fn test_cert(subject: &str, issuer: &str) -> Certificate {
    build_cert(subject, issuer, None)
}

pub fn test_cert_with_extensions(
    subject: &str,
    issuer: &str,
    extensions: Vec<Extension>,
) -> Certificate {
    build_cert(subject, issuer, Some(extensions))
}

pub fn poison_extension() -> Extension {
    Extension {
        extn_id: CT_PRECERT_POISON,
        critical: true,
        extn_value: OctetString::new(Null.to_der().unwrap()).unwrap(),
    }
}

#[allow(dead_code)]
pub fn sct_list_extension() -> Extension {
    Extension {
        extn_id: CT_PRECERT_SCTS,
        critical: false,
        extn_value: OctetString::new(vec![0x04, 0x02, 0x00, 0x00]).unwrap(),
    }
}

fn build_cert(subject: &str, issuer: &str, extensions: Option<Vec<Extension>>) -> Certificate {
    let secret = p256::SecretKey::from_slice(&[42u8; 32]).unwrap();
    let spki_der = secret.public_key().to_public_key_der().unwrap();
    let spki = SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes()).unwrap();
    let algorithm = AlgorithmIdentifierOwned {
        oid: ECDSA_WITH_SHA_256,
        parameters: None,
    };
    let tbs = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(&[1]).unwrap(),
        signature: algorithm.clone(),
        issuer: Name::from_str(issuer).unwrap(),
        validity: Validity {
            not_before: Time::UtcTime(
                der::asn1::UtcTime::from_unix_duration(Duration::from_secs(1_500_000_000))
                    .unwrap(),
            ),
            not_after: Time::UtcTime(
                der::asn1::UtcTime::from_unix_duration(Duration::from_secs(1_900_000_000))
                    .unwrap(),
            ),
        },
        subject: Name::from_str(subject).unwrap(),
        subject_public_key_info: spki,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions,
    };
    Certificate {
        tbs_certificate: tbs,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(&[0u8; 64]).unwrap(),
    }
}

/// A minimal x509 record at the given position, for get-entries tests.
pub fn logged_x509(sequence_number: u64) -> LoggedEntry {
    LoggedEntry {
        sequence_number,
        entry: LogEntry::X509(X509ChainEntry {
            leaf_certificate: vec![0xde, 0xad, sequence_number as u8],
            certificate_chain: vec![vec![0xbe, 0xef]],
        }),
        sct: SignedCertificateTimestamp {
            log_id: [0x5c; 32],
            timestamp: 1_700_000_000_000 + sequence_number,
            extensions: Vec::new(),
            signature: vec![4, 3, 0, 1, sequence_number as u8],
        },
    }
}

pub fn logged_oversize(sequence_number: u64) -> LoggedEntry {
    LoggedEntry {
        sequence_number,
        entry: LogEntry::SignedData(SignedDataEntry {
            keyid: vec![0; 1 << 16],
            data: Vec::new(),
            signature: Vec::new(),
        }),
        sct: logged_x509(sequence_number).sct,
    }
}

// ---- fakes ----

pub struct FakeLookup {
    pub sth: SignedTreeHead,
    pub proofs: HashMap<Vec<u8>, AuditProof>,
    pub consistency: Vec<Vec<u8>>,
    pub sth_calls: AtomicUsize,
}

impl Default for FakeLookup {
    fn default() -> Self {
        Self {
            sth: SignedTreeHead {
                tree_size: 10,
                timestamp: 1_700_000_000_000,
                sha256_root_hash: [0x0d; 32],
                signature: vec![4, 3, 0, 2, 0x10, 0x20],
            },
            proofs: HashMap::new(),
            consistency: vec![vec![0xc0; 32], vec![0xc1; 32]],
            sth_calls: AtomicUsize::new(0),
        }
    }
}

impl LogLookup for FakeLookup {
    fn get_sth(&self) -> SignedTreeHead {
        self.sth_calls.fetch_add(1, Ordering::SeqCst);
        self.sth.clone()
    }

    fn audit_proof(&self, leaf_hash: &[u8], _tree_size: u64) -> Result<AuditProof, LookupError> {
        self.proofs.get(leaf_hash).cloned().ok_or(LookupError::NotFound)
    }

    fn consistency_proof(&self, _first: u64, _second: u64) -> Vec<Vec<u8>> {
        self.consistency.clone()
    }
}

#[derive(Default)]
pub struct FakeDb {
    pub entries: Vec<LoggedEntry>,
}

impl ReadOnlyDatabase for FakeDb {
    fn scan_entries(&self, start: u64) -> Box<dyn Iterator<Item = LoggedEntry> + Send + '_> {
        Box::new(
            self.entries
                .clone()
                .into_iter()
                .filter(move |e| e.sequence_number >= start),
        )
    }
}

pub struct FakeController {
    pub stale: AtomicBool,
}

impl FakeController {
    pub fn new(stale: bool) -> Self {
        Self {
            stale: AtomicBool::new(stale),
        }
    }
}

impl ClusterStateController for FakeController {
    fn node_is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }
}

/// Accepts any parseable chain, or rejects everything with a fixed
/// message. Precert checks compute the canonical values the way a real
/// checker would.
pub struct FakeChecker {
    pub pool: CertPool,
    pub reject: Option<String>,
}

impl FakeChecker {
    pub fn accepting(pool: CertPool) -> Self {
        Self { pool, reject: None }
    }

    pub fn rejecting(msg: &str) -> Self {
        Self {
            pool: CertPool::default(),
            reject: Some(msg.to_string()),
        }
    }

    fn refusal(&self) -> Result<(), CheckerError> {
        match &self.reject {
            Some(msg) => Err(CheckerError::Rejected(msg.clone())),
            None => Ok(()),
        }
    }
}

impl CertChecker for FakeChecker {
    fn check_cert_chain(&self, chain: CertChain) -> Result<CertChain, CheckerError> {
        self.refusal()?;
        Ok(chain)
    }

    fn check_pre_cert_chain(&self, chain: PreCertChain) -> Result<CheckedPreCert, CheckerError> {
        self.refusal()?;
        let issuer = chain
            .cert_at(1)
            .ok_or_else(|| CheckerError::Rejected("missing precert issuer".into()))?;
        let issuer_key_hash =
            spki_sha256(issuer).map_err(|e| CheckerError::Internal(e.to_string()))?;
        let tbs_certificate =
            serialized_tbs(chain.leaf()).map_err(|e| CheckerError::Internal(e.to_string()))?;
        Ok(CheckedPreCert {
            chain,
            issuer_key_hash,
            tbs_certificate,
        })
    }

    fn check_signed_data(&self, _data: &SignedData) -> Result<(), CheckerError> {
        self.refusal()
    }

    fn trusted_certificates(&self) -> &CertPool {
        &self.pool
    }
}

/// Canonicalizes via [`SubmissionHandler`] and sequences into a map,
/// deduplicating like the real sequencer: a repeat submission gets the
/// originally issued SCT back as `AlreadyExists`.
pub struct FakeFrontend {
    handler: SubmissionHandler<FakeChecker>,
    issued: Mutex<HashMap<Vec<u8>, SignedCertificateTimestamp>>,
    next_timestamp: AtomicU64,
    pub exhausted: AtomicBool,
}

impl FakeFrontend {
    pub fn new(checker: FakeChecker) -> Self {
        Self {
            handler: SubmissionHandler::new(checker),
            issued: Mutex::new(HashMap::new()),
            next_timestamp: AtomicU64::new(1_700_000_000_001),
            exhausted: AtomicBool::new(false),
        }
    }

    fn sequence(&self, entry: LogEntry) -> Result<SignedCertificateTimestamp, QueueError> {
        let key = entry
            .merkle_tree_leaf(0, &[])
            .map_err(|e| QueueError::Rejected(e.to_string()))?;
        let mut issued = self.issued.lock().unwrap();
        if let Some(sct) = issued.get(&key) {
            return Err(QueueError::AlreadyExists(Box::new(sct.clone())));
        }
        let timestamp = self.next_timestamp.fetch_add(1, Ordering::SeqCst);
        // Non-empty extensions, so reply tests can pin that the add-*
        // responses always serialize the field as the empty string.
        let sct = SignedCertificateTimestamp {
            log_id: [0x5c; 32],
            timestamp,
            extensions: vec![0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, timestamp as u8],
            signature: vec![4, 3, 0, 8, key[0], key[1], key[2], key[3], 0, 0, 0, timestamp as u8],
        };
        issued.insert(key, sct.clone());
        Ok(sct)
    }

    fn check_capacity(&self) -> Result<(), QueueError> {
        if self.exhausted.load(Ordering::SeqCst) {
            return Err(QueueError::ResourceExhausted);
        }
        Ok(())
    }
}

impl Frontend for FakeFrontend {
    fn queue_x509_entry(
        &self,
        chain: CertChain,
    ) -> Result<SignedCertificateTimestamp, QueueError> {
        self.check_capacity()?;
        let entry = self
            .handler
            .process_x509_submission(chain)
            .map_err(|e| QueueError::Rejected(e.to_string()))?;
        self.sequence(entry)
    }

    fn queue_pre_cert_entry(
        &self,
        chain: PreCertChain,
    ) -> Result<SignedCertificateTimestamp, QueueError> {
        self.check_capacity()?;
        let entry = self
            .handler
            .process_pre_cert_submission(chain)
            .map_err(|e| QueueError::Rejected(e.to_string()))?;
        self.sequence(entry)
    }

    fn queue_signed_data_entry(
        &self,
        data: SignedData,
    ) -> Result<SignedCertificateTimestamp, QueueError> {
        self.check_capacity()?;
        let entry = self
            .handler
            .process_signed_data_submission(data)
            .map_err(|e| QueueError::Rejected(e.to_string()))?;
        self.sequence(entry)
    }
}

pub struct FakeProxy {
    pub hits: AtomicUsize,
}

impl Default for FakeProxy {
    fn default() -> Self {
        Self {
            hits: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Proxy for FakeProxy {
    async fn proxy_request(&self, _request: Request) -> Result<Response, ProxyError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok((StatusCode::OK, "proxied").into_response())
    }
}

// ---- fixture wiring ----

pub struct Fixture {
    pub config: NodeConfig,
    pub lookup: Arc<FakeLookup>,
    pub db: Arc<FakeDb>,
    pub controller: Arc<FakeController>,
    pub checker: Option<Arc<FakeChecker>>,
    pub frontend: Option<Arc<FakeFrontend>>,
    pub proxy: Arc<FakeProxy>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            config: NodeConfig::default(),
            lookup: Arc::new(FakeLookup::default()),
            db: Arc::new(FakeDb::default()),
            controller: Arc::new(FakeController::new(false)),
            checker: Some(Arc::new(FakeChecker::accepting(CertPool::default()))),
            frontend: Some(Arc::new(FakeFrontend::new(FakeChecker::accepting(
                CertPool::default(),
            )))),
            proxy: Arc::new(FakeProxy::default()),
        }
    }
}

impl Fixture {
    pub fn state(&self) -> NodeState {
        NodeState::new(
            self.config.clone(),
            self.lookup.clone(),
            self.db.clone(),
            self.controller.clone(),
            self.checker.clone().map(|c| c as _),
            self.frontend.clone().map(|f| f as _),
            self.proxy.clone(),
        )
    }

    pub fn router(&self) -> Router {
        ct_router(self.state())
    }
}
