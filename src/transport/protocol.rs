//! Newline-delimited JSON messages exchanged with the coordinating server.

use crate::identity::CameraIdentity;
use serde::{Deserialize, Serialize};

/// Commands sent by the coordinator to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// Start recording
    Start,
    /// Stop recording, transcode and upload
    Stop,
}

impl Inbound {
    /// Deserialize a command from one JSON line.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize command to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages sent by the camera to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Announce the camera identity, once per connection
    Init { id: CameraIdentity },
    /// One piece of the transcoded file, in file order
    Chunk { id: CameraIdentity, chunk: Vec<u8> },
    /// All chunks of the current cycle have been sent
    End { id: CameraIdentity },
}

impl Outbound {
    /// Serialize message to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize message from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Init { .. } => "init",
            Outbound::Chunk { .. } => "chunk",
            Outbound::End { .. } => "end",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_wire_format() {
        assert_eq!(Inbound::from_json(r#"{"type":"start"}"#).unwrap(), Inbound::Start);
        assert_eq!(Inbound::from_json(r#"{"type":"stop"}"#).unwrap(), Inbound::Stop);
        assert_eq!(Inbound::Start.to_json().unwrap(), r#"{"type":"start"}"#);
    }

    #[test]
    fn test_unknown_inbound_is_error() {
        assert!(Inbound::from_json(r#"{"type":"pause"}"#).is_err());
        assert!(Inbound::from_json("start").is_err());
    }

    #[test]
    fn test_init_wire_format() {
        let msg = Outbound::Init {
            id: CameraIdentity::new("cam-1"),
        };
        assert_eq!(msg.to_json().unwrap(), r#"{"type":"init","id":"cam-1"}"#);
    }

    #[test]
    fn test_chunk_wire_format() {
        let msg = Outbound::Chunk {
            id: CameraIdentity::new("cam-1"),
            chunk: vec![0, 1, 255],
        };
        let json = msg.to_json().unwrap();
        assert_eq!(json, r#"{"type":"chunk","id":"cam-1","chunk":[0,1,255]}"#);
        assert_eq!(Outbound::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_end_wire_format() {
        let msg = Outbound::End {
            id: CameraIdentity::new("cam-1"),
        };
        assert_eq!(msg.to_json().unwrap(), r#"{"type":"end","id":"cam-1"}"#);
        assert_eq!(msg.kind(), "end");
    }
}
