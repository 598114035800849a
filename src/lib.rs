//! camnode - remote-controlled video capture agent
//!
//! Records video on `start`, stops on `stop`, remuxes the raw stream into a
//! fragmented MP4 and streams it back to the coordinator in chunks.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod agent;
pub mod cleanup;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod controller;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod logging;
pub mod media;
pub mod process;
pub mod stream;
pub mod transport;

// Core seams (process launch, chunk delivery)
pub use process::{ProcessSupervisor, SystemProcessSupervisor};
pub use stream::{ChunkEmitter, TransportEmitter};

// State machine
pub use controller::{ControllerSettings, RecordingController, RecordingState};

// Error handling
pub use error::{CamnodeError, Result};

// Config
pub use config::Config;
pub use identity::CameraIdentity;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
