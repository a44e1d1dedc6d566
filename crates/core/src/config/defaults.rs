//! Default values and functions for configuration

// Default constants
pub(crate) const DEFAULT_ADDRESS: &str = "http://localhost:9200";

pub(crate) fn default_addresses() -> Vec<String> {
    vec![DEFAULT_ADDRESS.to_string()]
}

pub(crate) fn default_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_connect_timeout_secs() -> u64 {
    10 // reqwest has no connect timeout by default
}

pub(crate) fn default_pool_idle_timeout_secs() -> u64 {
    90
}

pub(crate) fn default_pool_max_idle_per_host() -> usize {
    100
}

pub(crate) fn default_v7_compatible() -> bool {
    false
}

pub(crate) fn default_register_on_startup() -> bool {
    false
}
