//! Camera identity tagging every outbound message.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque camera identifier, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraIdentity(String);

impl CameraIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identity (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Use the configured identity, or generate one when none is configured.
    pub fn from_config(id: Option<&str>) -> Self {
        match id {
            Some(id) if !id.trim().is_empty() => Self::new(id.trim()),
            _ => Self::generate(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
