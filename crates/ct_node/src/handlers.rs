// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Endpoint handlers for the `/ct/v1/` surface, plus the query-parameter
//! rules they share.

use crate::config::NodeConfig;
use crate::deps::{
    CertChecker, ClusterStateController, Frontend, LogLookup, LookupError, Proxy, QueueError,
    ReadOnlyDatabase, SignedData,
};
use crate::metrics::Metrics;
use crate::reply::{send_error, send_json_reply};
use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::Response;
use base64::prelude::*;
use log::{debug, warn};
use parking_lot::Mutex;
use rfc6962_api::{
    AddChainRequest, AddChainResponse, AddSignedDataRequest, EntryResponse, GetEntriesResponse,
    GetProofByHashResponse, GetRootsResponse, GetSthConsistencyResponse, GetSthResponse,
    SignedCertificateTimestamp, WireError,
};
use std::sync::Arc;
use x509_util::{certs_to_der, CertChain, PreCertChain};

/// Everything the handlers need, shared across the router. All
/// collaborators are read-only after construction except the staleness
/// flag, which the monitor refreshes.
#[derive(Clone)]
pub struct NodeState {
    pub config: NodeConfig,
    pub log_lookup: Arc<dyn LogLookup>,
    pub db: Arc<dyn ReadOnlyDatabase>,
    pub controller: Arc<dyn ClusterStateController>,
    /// Absent on nodes without a trust store; `get-roots` is not mounted.
    pub cert_checker: Option<Arc<dyn CertChecker>>,
    /// Absent on mirrors; the add-* endpoints are not mounted.
    pub frontend: Option<Arc<dyn Frontend>>,
    pub proxy: Arc<dyn Proxy>,
    pub(crate) node_is_stale: Arc<Mutex<bool>>,
    pub(crate) metrics: Arc<Metrics>,
}

impl NodeState {
    /// Seeds the staleness flag from the controller; the periodic monitor
    /// keeps it fresh from then on.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: NodeConfig,
        log_lookup: Arc<dyn LogLookup>,
        db: Arc<dyn ReadOnlyDatabase>,
        controller: Arc<dyn ClusterStateController>,
        cert_checker: Option<Arc<dyn CertChecker>>,
        frontend: Option<Arc<dyn Frontend>>,
        proxy: Arc<dyn Proxy>,
    ) -> Self {
        let node_is_stale = Arc::new(Mutex::new(controller.node_is_stale()));
        Self {
            config,
            log_lookup,
            db,
            controller,
            cert_checker,
            frontend,
            proxy,
            node_is_stale,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn is_node_stale(&self) -> bool {
        *self.node_is_stale.lock()
    }

    pub(crate) fn staleness_flag(&self) -> Arc<Mutex<bool>> {
        self.node_is_stale.clone()
    }
}

// Query parameters are parsed into an ordered multi-map; a parse failure
// yields an empty map rather than an error.
fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Returns the value for `param`. Duplicate occurrences of the key
/// invalidate the parameter, as if it were absent.
fn get_param<'a>(query: &'a [(String, String)], param: &str) -> Option<&'a str> {
    let mut matches = query.iter().filter(|(k, _)| k == param);
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(&first.1)
}

/// Base-10 integer parameter; rejects anything that does not fit `i64`.
fn get_int_param(query: &[(String, String)], param: &str) -> Option<i64> {
    get_param(query, param).and_then(|v| v.parse().ok())
}

/// Boolean parameter; only the literal `"true"` is true.
fn get_bool_param(query: &[(String, String)], param: &str) -> bool {
    get_param(query, param) == Some("true")
}

pub(crate) async fn method_not_allowed() -> Response {
    send_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.")
}

pub(crate) async fn get_sth(State(state): State<NodeState>) -> Response {
    let sth = state.log_lookup.get_sth();
    send_json_reply(
        StatusCode::OK,
        &GetSthResponse {
            tree_size: sth.tree_size,
            timestamp: sth.timestamp,
            sha256_root_hash: sth.sha256_root_hash.to_vec(),
            tree_head_signature: sth.signature,
        },
    )
}

pub(crate) async fn get_entries(
    State(state): State<NodeState>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = parse_query(query.as_deref());

    let start = get_int_param(&query, "start").unwrap_or(-1);
    if start < 0 {
        return send_error(
            StatusCode::BAD_REQUEST,
            "Missing or invalid \"start\" parameter.",
        );
    }

    let mut end = get_int_param(&query, "end").unwrap_or(-1);
    if end < start {
        return send_error(
            StatusCode::BAD_REQUEST,
            "Missing or invalid \"end\" parameter.",
        );
    }

    // Limit the number of entries returned in a single request.
    end = end.min(start.saturating_add(state.config.max_leaf_entries_per_response - 1));

    // Sekrit parameter to indicate that SCTs should be included too.
    // Non-standard; only used by other log nodes when "following" nodes
    // with more data.
    let include_scts = get_bool_param(&query, "include_scts");

    let db = state.db.clone();
    match tokio::task::spawn_blocking(move || scan_entries(&*db, start, end, include_scts)).await
    {
        Ok(Ok(entries)) if entries.is_empty() => {
            send_error(StatusCode::BAD_REQUEST, "Entry not found.")
        }
        Ok(Ok(entries)) => send_json_reply(StatusCode::OK, &GetEntriesResponse { entries }),
        Ok(Err(_)) => send_error(StatusCode::INTERNAL_SERVER_ERROR, "Serialization failed."),
        Err(_) => send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error."),
    }
}

// Reads entries start..=end off the I/O path, stopping cleanly at the
// first gap in sequence numbers.
fn scan_entries(
    db: &dyn ReadOnlyDatabase,
    start: i64,
    end: i64,
    include_scts: bool,
) -> Result<Vec<EntryResponse>, WireError> {
    let mut cursor = db.scan_entries(start as u64);
    let mut entries = Vec::new();
    for i in start..=end {
        let Some(logged) = cursor.next() else { break };
        if logged.sequence_number != i as u64 {
            break;
        }

        let leaf_input = logged.serialize_for_leaf().inspect_err(|e| {
            warn!("failed to serialize entry @ {i}: {e}");
        })?;
        let extra_data = logged.serialize_extra_data().inspect_err(|e| {
            warn!("failed to serialize entry @ {i}: {e}");
        })?;
        let sct = if include_scts {
            Some(logged.sct.to_bytes().inspect_err(|e| {
                warn!("failed to serialize SCT @ {i}: {e}");
            })?)
        } else {
            None
        };

        entries.push(EntryResponse {
            leaf_input,
            extra_data,
            sct,
        });
    }
    Ok(entries)
}

pub(crate) async fn get_roots(State(state): State<NodeState>) -> Response {
    let Some(checker) = &state.cert_checker else {
        return send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.");
    };
    match certs_to_der(checker.trusted_certificates().certs()) {
        Ok(certificates) => {
            send_json_reply(StatusCode::OK, &GetRootsResponse { certificates })
        }
        Err(e) => {
            warn!("cert encoding failed: {e}");
            send_error(StatusCode::INTERNAL_SERVER_ERROR, "Serialization failed.")
        }
    }
}

pub(crate) async fn get_proof_by_hash(
    State(state): State<NodeState>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = parse_query(query.as_deref());

    let Some(b64_hash) = get_param(&query, "hash") else {
        return send_error(
            StatusCode::BAD_REQUEST,
            "Missing or invalid \"hash\" parameter.",
        );
    };
    let hash = BASE64_STANDARD.decode(b64_hash).unwrap_or_default();
    if hash.is_empty() {
        return send_error(StatusCode::BAD_REQUEST, "Invalid \"hash\" parameter.");
    }

    let tree_size = get_int_param(&query, "tree_size").unwrap_or(-1);
    if tree_size < 0 || tree_size as u64 > state.log_lookup.get_sth().tree_size {
        return send_error(
            StatusCode::BAD_REQUEST,
            "Missing or invalid \"tree_size\" parameter.",
        );
    }

    let lookup = state.log_lookup.clone();
    match tokio::task::spawn_blocking(move || lookup.audit_proof(&hash, tree_size as u64)).await
    {
        Ok(Ok(proof)) => send_json_reply(
            StatusCode::OK,
            &GetProofByHashResponse {
                leaf_index: proof.leaf_index,
                audit_path: proof.audit_path,
            },
        ),
        Ok(Err(LookupError::NotFound)) => {
            send_error(StatusCode::BAD_REQUEST, "Couldn't find hash.")
        }
        Err(_) => send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error."),
    }
}

pub(crate) async fn get_sth_consistency(
    State(state): State<NodeState>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = parse_query(query.as_deref());

    let first = get_int_param(&query, "first").unwrap_or(-1);
    if first < 0 {
        return send_error(
            StatusCode::BAD_REQUEST,
            "Missing or invalid \"first\" parameter.",
        );
    }

    let second = get_int_param(&query, "second").unwrap_or(-1);
    if second < first {
        return send_error(
            StatusCode::BAD_REQUEST,
            "Missing or invalid \"second\" parameter.",
        );
    }

    let lookup = state.log_lookup.clone();
    match tokio::task::spawn_blocking(move || {
        lookup.consistency_proof(first as u64, second as u64)
    })
    .await
    {
        Ok(consistency) => {
            send_json_reply(StatusCode::OK, &GetSthConsistencyResponse { consistency })
        }
        Err(_) => send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error."),
    }
}

pub(crate) async fn add_chain(State(state): State<NodeState>, body: Bytes) -> Response {
    let Some(frontend) = state.frontend.clone() else {
        return send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.");
    };
    let Ok(request) = serde_json::from_slice::<AddChainRequest>(&body) else {
        return send_error(StatusCode::BAD_REQUEST, "Unable to parse provided JSON.");
    };
    let chain = match CertChain::from_der_chain(&request.chain) {
        Ok(chain) => chain,
        Err(_) => {
            return send_error(StatusCode::BAD_REQUEST, "Unable to parse provided chain.")
        }
    };

    match tokio::task::spawn_blocking(move || frontend.queue_x509_entry(chain)).await {
        Ok(status) => add_chain_reply(status),
        Err(_) => send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error."),
    }
}

pub(crate) async fn add_pre_chain(State(state): State<NodeState>, body: Bytes) -> Response {
    let Some(frontend) = state.frontend.clone() else {
        return send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.");
    };
    let Ok(request) = serde_json::from_slice::<AddChainRequest>(&body) else {
        return send_error(StatusCode::BAD_REQUEST, "Unable to parse provided JSON.");
    };
    let chain = match PreCertChain::from_der_chain(&request.chain) {
        Ok(chain) => chain,
        Err(_) => {
            return send_error(StatusCode::BAD_REQUEST, "Unable to parse provided chain.")
        }
    };

    match tokio::task::spawn_blocking(move || frontend.queue_pre_cert_entry(chain)).await {
        Ok(status) => add_chain_reply(status),
        Err(_) => send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error."),
    }
}

pub(crate) async fn add_signed_data(State(state): State<NodeState>, body: Bytes) -> Response {
    let Some(frontend) = state.frontend.clone() else {
        return send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.");
    };
    let Ok(request) = serde_json::from_slice::<AddSignedDataRequest>(&body) else {
        return send_error(StatusCode::BAD_REQUEST, "Unable to parse provided JSON.");
    };
    let data = SignedData {
        keyid: request.keyid,
        data: request.data,
        signature: request.signature,
    };

    match tokio::task::spawn_blocking(move || frontend.queue_signed_data_entry(data)).await {
        Ok(status) => add_chain_reply(status),
        Err(_) => send_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error."),
    }
}

// Translates the sequencer status into the add-* reply. A duplicate
// submission is a success carrying the originally issued SCT.
fn add_chain_reply(status: Result<SignedCertificateTimestamp, QueueError>) -> Response {
    let sct = match status {
        Ok(sct) => sct,
        Err(QueueError::AlreadyExists(sct)) => *sct,
        Err(e @ QueueError::ResourceExhausted) => {
            debug!("error adding chain: {e}");
            return send_error(StatusCode::SERVICE_UNAVAILABLE, &e.to_string());
        }
        Err(e) => {
            debug!("error adding chain: {e}");
            return send_error(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    send_json_reply(
        StatusCode::OK,
        &AddChainResponse {
            sct_version: 0,
            id: sct.log_id.to_vec(),
            timestamp: sct.timestamp,
            // The extensions field is always the empty string, whatever
            // the stored SCT carries.
            extensions: Vec::new(),
            signature: sct.signature,
        },
    )
}

pub(crate) async fn metrics(State(state): State<NodeState>) -> String {
    state.metrics.encode()
}
