//! Recording state machine types.

use crate::process::{ProcessExit, ProcessHandle};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Current phase of the recording cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    /// Waiting for `start`
    #[default]
    Idle,
    /// Capture process running, waiting for `stop`
    Recording,
    /// Termination requested, waiting for the capture process to exit
    Stopping,
    /// Transcode process running
    Transcoding,
    /// Uploading the transcoded file
    Streaming,
    /// Removing intermediate files
    CleaningUp,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Stopping => "stopping",
            RecordingState::Transcoding => "transcoding",
            RecordingState::Streaming => "streaming",
            RecordingState::CleaningUp => "cleaning_up",
        };
        f.write_str(name)
    }
}

/// One recording cycle from `start` until the capture process has exited.
#[derive(Debug)]
pub struct CaptureSession {
    cycle: u64,
    capture: ProcessHandle,
    early_exit: Option<ProcessExit>,
    raw_path: PathBuf,
    transcoded_path: PathBuf,
}

impl CaptureSession {
    pub(crate) fn new(
        cycle: u64,
        capture: ProcessHandle,
        raw_path: PathBuf,
        transcoded_path: PathBuf,
    ) -> Self {
        Self {
            cycle,
            capture,
            early_exit: None,
            raw_path,
            transcoded_path,
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn capture_program(&self) -> &str {
        self.capture.program()
    }

    pub fn capture_pid(&self) -> Option<u32> {
        self.capture.pid()
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub fn transcoded_path(&self) -> &Path {
        &self.transcoded_path
    }

    /// Exit observed while still recording, before any `stop`.
    pub fn early_exit(&self) -> Option<ProcessExit> {
        self.early_exit
    }

    pub(crate) fn record_early_exit(&mut self, exit: ProcessExit) {
        self.early_exit.get_or_insert(exit);
    }

    pub(crate) fn request_stop(&mut self) {
        self.capture.terminate();
    }
}

/// Phase plus the data only that phase owns.
#[derive(Debug, Default)]
pub(crate) enum Phase {
    #[default]
    Idle,
    Recording(CaptureSession),
    Stopping(CaptureSession),
    Transcoding {
        cycle: u64,
        // Held so that dropping the controller stops a running transcode.
        _transcode: ProcessHandle,
    },
    Streaming {
        cycle: u64,
    },
    CleaningUp {
        cycle: u64,
    },
}

impl Phase {
    pub(crate) fn state(&self) -> RecordingState {
        match self {
            Phase::Idle => RecordingState::Idle,
            Phase::Recording(_) => RecordingState::Recording,
            Phase::Stopping(_) => RecordingState::Stopping,
            Phase::Transcoding { .. } => RecordingState::Transcoding,
            Phase::Streaming { .. } => RecordingState::Streaming,
            Phase::CleaningUp { .. } => RecordingState::CleaningUp,
        }
    }

    pub(crate) fn session(&self) -> Option<&CaptureSession> {
        match self {
            Phase::Recording(session) | Phase::Stopping(session) => Some(session),
            _ => None,
        }
    }

    /// Cycle the current phase belongs to; `None` when idle.
    pub(crate) fn cycle(&self) -> Option<u64> {
        match self {
            Phase::Idle => None,
            Phase::Recording(session) | Phase::Stopping(session) => Some(session.cycle),
            Phase::Transcoding { cycle, .. }
            | Phase::Streaming { cycle }
            | Phase::CleaningUp { cycle } => Some(*cycle),
        }
    }
}
