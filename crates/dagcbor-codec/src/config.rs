use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Order in which map entries are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrder {
    /// Keys appear in the order they were inserted into the map.
    #[default]
    Insertion,
    /// RFC 8949 length-first ordering: shorter keys first, then bytewise.
    Canonical,
}

/// Configuration for block serialization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Maximum container nesting depth. `None` means unlimited.
    pub max_depth: Option<usize>,
    /// Map key order in the encoded output.
    pub key_order: KeyOrder,
}

impl SerializerConfig {
    /// Canonical key ordering, for blocks that must hash identically
    /// regardless of how their maps were built.
    pub fn strict() -> Self {
        Self {
            key_order: KeyOrder::Canonical,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> CodecResult<Self> {
        toml::from_str(s).map_err(|e| CodecError::Config(e.to_string()))
    }
}
