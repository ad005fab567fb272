// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Router assembly: which endpoints a node mounts, and how they are
//! wrapped.

use crate::dispatch::{proxy_interceptor, stats_interceptor};
use crate::handlers::{
    add_chain, add_pre_chain, add_signed_data, get_entries, get_proof_by_hash, get_roots,
    get_sth, get_sth_consistency, method_not_allowed, metrics, NodeState,
};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, MethodRouter};
use axum::Router;

fn get_only(handler: MethodRouter<NodeState>) -> MethodRouter<NodeState> {
    handler.fallback(method_not_allowed)
}

/// Builds the node's router. Read endpoints are always mounted;
/// `get-roots` requires a trust store, and the add-* endpoints require a
/// full (non-mirror) frontend plus the matching accept flag. Every
/// `/ct/v1/` path is wrapped by the stats interceptor and, inside it, the
/// proxy interceptor, so a stale node forwards rather than answers.
pub fn ct_router(state: NodeState) -> Router {
    let mut router = Router::new()
        .route("/ct/v1/get-entries", get_only(get(get_entries)))
        .route("/ct/v1/get-proof-by-hash", get_only(get(get_proof_by_hash)))
        .route("/ct/v1/get-sth", get_only(get(get_sth)))
        .route("/ct/v1/get-sth-consistency", get_only(get(get_sth_consistency)));

    if state.cert_checker.is_some() {
        // Doesn't strictly need proxying, but wrapped like the rest to
        // keep the surface uniform.
        router = router.route("/ct/v1/get-roots", get_only(get(get_roots)));
    }

    if state.frontend.is_some() {
        // Proxy the add-* calls too: a more up-to-date node has a better
        // chance of handling dupes correctly instead of bloating the tree.
        if state.config.accept_certificates {
            router = router
                .route("/ct/v1/add-chain", post(add_chain).fallback(method_not_allowed))
                .route(
                    "/ct/v1/add-pre-chain",
                    post(add_pre_chain).fallback(method_not_allowed),
                );
        }
        if state.config.accept_signed_data {
            router = router.route(
                "/ct/v1/add-signed-data",
                post(add_signed_data).fallback(method_not_allowed),
            );
        }
    }

    // Interceptors compose outermost-first: stats, then proxy, then the
    // local handler. route_layer wraps what is already mounted, so the
    // metrics endpoint added afterwards stays unwrapped.
    let router = router
        .route_layer(from_fn_with_state(state.clone(), proxy_interceptor))
        .route_layer(from_fn_with_state(state.clone(), stats_interceptor));

    router
        .route("/metrics", get_only(get(metrics)))
        .with_state(state)
}
