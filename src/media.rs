//! Argument lists for the capture and transcode binaries.

use crate::config::{CaptureConfig, TranscodeConfig};
use crate::process::ProcessSpec;
use std::path::Path;

/// Build the capture invocation writing raw H.264 to `raw_path`.
pub fn capture_command(config: &CaptureConfig, raw_path: &Path) -> ProcessSpec {
    ProcessSpec::new(
        config.program.clone(),
        [
            "-t".to_string(),
            config.duration_ms.to_string(),
            "-w".to_string(),
            config.width.to_string(),
            "-h".to_string(),
            config.height.to_string(),
            "-o".to_string(),
            raw_path.to_string_lossy().into_owned(),
        ],
    )
}

/// Build the transcode invocation remuxing `raw_path` into a fragmented MP4.
///
/// The stream is copied, not re-encoded; `-y` overwrites a stale output.
pub fn transcode_command(config: &TranscodeConfig, raw_path: &Path, output_path: &Path) -> ProcessSpec {
    ProcessSpec::new(
        config.program.clone(),
        [
            "-y".to_string(),
            "-i".to_string(),
            raw_path.to_string_lossy().into_owned(),
            "-c".to_string(),
            "copy".to_string(),
            "-r".to_string(),
            config.framerate.to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            "-movflags".to_string(),
            "frag_keyframe".to_string(),
            output_path.to_string_lossy().into_owned(),
        ],
    )
}
