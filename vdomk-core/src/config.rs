//! Runtime Configuration
//!
//! A small set of knobs shared by every layer rendered through one
//! [`Scheduler`](crate::scheduler::Scheduler). The defaults reproduce the
//! behavior of the reconciler without any configuration.
//!
//! Configuration can be built in code or loaded from JSON:
//!
//! ```rust
//! use vdomk_core::config::{DuplicateKeyPolicy, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_json(r#"{ "duplicate_keys": "reject" }"#).unwrap();
//! assert_eq!(config.duplicate_keys, DuplicateKeyPolicy::Reject);
//! ```

use serde::Deserialize;

use crate::error::Result;

/// What to do when two keyed siblings in one list share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// The later sibling captures the earlier one's node, silently.
    Allow,
    /// Same as `Allow`, but the collision is logged.
    #[default]
    Warn,
    /// The collision aborts the update with [`Error::DuplicateKey`](crate::Error::DuplicateKey).
    Reject,
}

/// Runtime-wide rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Handling of duplicate sibling keys during keyed reconciliation.
    pub duplicate_keys: DuplicateKeyPolicy,

    /// Upper bound on effect drain passes within one flush.
    /// `None` keeps draining until no effects remain.
    pub max_effect_passes: Option<usize>,
}

impl RuntimeConfig {
    /// Parse a configuration from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
