//! Chunked upload of the transcoded file.

pub mod emitter;
pub mod reader;

pub use emitter::{ChunkEmitter, Emitted, RecordingEmitter, TransportEmitter};
pub use reader::FileStreamReader;

use crate::error::Result;
use crate::identity::CameraIdentity;

/// Forward every chunk of `reader` through `emitter`, one at a time, in file order.
///
/// Returns the number of chunks sent. Stops at the first read or send error;
/// the end-of-cycle marker is not sent here.
pub async fn pump<E>(mut reader: FileStreamReader, emitter: &E, id: &CameraIdentity) -> Result<u64>
where
    E: ChunkEmitter + ?Sized,
{
    tracing::debug!(path = %reader.path().display(), "streaming");
    let mut sent = 0u64;
    while let Some(chunk) = reader.next_chunk().await? {
        let len = chunk.len();
        emitter.send(id, chunk).await?;
        sent += 1;
        tracing::debug!(chunk = sent, bytes = len, "chunk sent");
    }
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CamnodeError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pump_forwards_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.mp4");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 200) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let emitter = RecordingEmitter::new();
        let reader = FileStreamReader::open(&path, 4096).await.unwrap();
        let sent = pump(reader, &emitter, &CameraIdentity::new("cam-1"))
            .await
            .unwrap();

        assert_eq!(sent, 3);
        assert_eq!(emitter.chunk_sizes(), vec![4096, 4096, 1808]);
        assert_eq!(emitter.end_count(), 0, "pump never sends the end marker");

        let replayed: Vec<u8> = emitter
            .emitted()
            .into_iter()
            .filter_map(|e| match e {
                Emitted::Chunk { chunk, .. } => Some(chunk),
                Emitted::End { .. } => None,
            })
            .flatten()
            .collect();
        assert_eq!(replayed, data);
    }

    #[tokio::test]
    async fn test_pump_stops_on_disconnect() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.mp4");
        std::fs::write(&path, vec![0u8; 300]).unwrap();

        let emitter = RecordingEmitter::new().with_disconnect_after(1);
        let reader = FileStreamReader::open(&path, 100).await.unwrap();
        let result = pump(reader, &emitter, &CameraIdentity::new("cam-1")).await;

        assert!(matches!(result, Err(CamnodeError::TransportUnavailable { .. })));
        assert_eq!(emitter.chunk_sizes(), vec![100]);
    }
}
