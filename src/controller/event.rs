use crate::cleanup::CleanupReport;
use crate::error::Result;
use crate::process::ProcessExit;
use crate::transport::Inbound;

/// Everything the controller reacts to.
///
/// Completions carry the cycle they belong to so late arrivals can be discarded.
#[derive(Debug)]
pub enum ControllerEvent {
    /// Command from the coordinator
    Command(Inbound),
    /// The capture process exited
    CaptureExited { cycle: u64, exit: ProcessExit },
    /// The transcode process exited
    TranscodeExited { cycle: u64, exit: ProcessExit },
    /// Chunked upload finished; `Ok` carries the number of chunks sent
    StreamFinished { cycle: u64, result: Result<u64> },
    /// Intermediate files removed; `announce_end` is set when the upload completed
    CleanupFinished {
        cycle: u64,
        report: CleanupReport,
        announce_end: bool,
    },
}

impl From<Inbound> for ControllerEvent {
    fn from(command: Inbound) -> Self {
        ControllerEvent::Command(command)
    }
}
