// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! Node configuration, injected immutably at startup.

use serde::Deserialize;

/// Tunables of the request-handling plane. All fields have defaults so an
/// empty JSON object is a valid configuration.
#[derive(Deserialize, Debug, Clone)]
pub struct NodeConfig {
    /// Maximum number of entries in a single get-entries response.
    #[serde(default = "default_max_leaf_entries_per_response")]
    pub max_leaf_entries_per_response: i64,
    /// Seconds between node staleness checks.
    #[serde(default = "default_staleness_check_delay_secs")]
    pub staleness_check_delay_secs: u64,
    /// Accept certificates/pre-certificates as input.
    #[serde(default = "default_accept_certificates")]
    pub accept_certificates: bool,
    /// Accept arbitrary signed data as input.
    #[serde(default)]
    pub accept_signed_data: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty config must deserialize")
    }
}

fn default_max_leaf_entries_per_response() -> i64 {
    1000
}

fn default_staleness_check_delay_secs() -> u64 {
    5
}

fn default_accept_certificates() -> bool {
    true
}
