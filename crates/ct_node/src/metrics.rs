// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Metrics for the node's HTTP plane.

use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry, CounterVec,
    HistogramVec, Registry, TextEncoder,
};

#[derive(Debug)]
pub(crate) struct Metrics {
    pub(crate) registry: Registry,

    /// Total request latency broken down by path, local and proxied alike.
    pub(crate) request_duration: HistogramVec,
    /// Requests handed to the peer proxy because this node was stale.
    pub(crate) proxied_requests: CounterVec,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        let r = Registry::new();
        let request_duration = register_histogram_vec_with_registry!(
            "http_server_request_duration_seconds",
            "Total request latency in seconds broken down by path.",
            &["path"],
            vec![0.005, 0.025, 0.1, 0.5, 1.0, 5.0],
            r
        )
        .unwrap();
        let proxied_requests = register_counter_vec_with_registry!(
            "http_server_proxied_requests_total",
            "Requests dispatched to a peer because the node was stale, by path.",
            &["path"],
            r
        )
        .unwrap();
        Self {
            registry: r,
            request_duration,
            proxied_requests,
        }
    }

    pub(crate) fn encode(&self) -> String {
        let mut buffer = String::new();
        let encoder = TextEncoder::new();
        encoder
            .encode_utf8(&self.registry.gather(), &mut buffer)
            .unwrap();
        buffer
    }
}
