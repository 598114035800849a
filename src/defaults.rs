//! Default configuration constants for camnode.
//!
//! Shared by the configuration types and the agent wiring.

/// Default coordinator host.
pub const SERVER_HOST: &str = "127.0.0.1";

/// Default coordinator port.
pub const SERVER_PORT: u16 = 5000;

/// Delay between reconnection attempts after the coordinator connection drops.
pub const RECONNECT_DELAY_MS: u64 = 2000;

/// Capture binary shipped with Raspberry Pi OS.
pub const CAPTURE_PROGRAM: &str = "raspivid";

/// Capture frame width in pixels.
pub const CAPTURE_WIDTH: u32 = 800;

/// Capture frame height in pixels.
pub const CAPTURE_HEIGHT: u32 = 600;

/// Capture duration passed to the capture binary.
///
/// Large enough that the capture only ever ends because we stop it.
pub const CAPTURE_DURATION_MS: u64 = 99_999_999;

/// Grace period between SIGTERM and SIGKILL when stopping the capture.
///
/// The capture binary needs SIGTERM to flush the last frames to disk.
pub const STOP_GRACE_MS: u64 = 5000;

/// Transcode binary.
pub const TRANSCODE_PROGRAM: &str = "avconv";

/// Output frame rate for the delivery container.
pub const TRANSCODE_FRAMERATE: u32 = 30;

/// Raw capture output file name.
pub const RAW_FILE: &str = "output.h264";

/// Transcoded output file name.
pub const TRANSCODED_FILE: &str = "output.mp4";

/// Bytes per streamed chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Depth of the inbound command queue feeding the controller.
pub const EVENT_QUEUE_DEPTH: usize = 64;

/// Depth of the outbound message queue feeding the transport writer.
pub const OUTBOUND_QUEUE_DEPTH: usize = 16;
