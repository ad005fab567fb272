// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! The request-handling plane of a CT log node: parses and validates
//! submissions, serves the RFC 6962 read endpoints from a local replica,
//! and forwards requests to a peer when the node lags the cluster.
//!
//! The Merkle tree storage, sequencing, cluster-state tracking, peer
//! proxying, and chain validation proper live behind the traits in
//! [`deps`]; this crate implements everything between the HTTP socket and
//! those seams.

pub mod config;
pub mod deps;
pub mod dispatch;
mod handlers;
mod metrics;
mod reply;
pub mod server;
pub mod submission;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::NodeConfig;
pub use dispatch::StalenessMonitor;
pub use handlers::NodeState;
pub use server::ct_router;
pub use submission::{x509_chain_to_entry, SubmissionError, SubmissionHandler};
