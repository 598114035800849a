use crate::error::{CamnodeError, Result};
use crate::identity::CameraIdentity;
use crate::transport::{Outbound, OutboundHandle};
use std::sync::{Arc, Mutex};

/// Trait for forwarding chunks and the end-of-cycle marker to the coordinator.
///
/// Calls complete in the order they are made. Both fail with
/// `CamnodeError::TransportUnavailable` when the connection is down.
#[async_trait::async_trait]
pub trait ChunkEmitter: Send + Sync {
    /// Forward one chunk of the transcoded file.
    async fn send(&self, id: &CameraIdentity, chunk: Vec<u8>) -> Result<()>;

    /// Mark the end of the current cycle's chunks.
    async fn notify_end(&self, id: &CameraIdentity) -> Result<()>;
}

#[async_trait::async_trait]
impl<T: ChunkEmitter + ?Sized> ChunkEmitter for Arc<T> {
    async fn send(&self, id: &CameraIdentity, chunk: Vec<u8>) -> Result<()> {
        (**self).send(id, chunk).await
    }

    async fn notify_end(&self, id: &CameraIdentity) -> Result<()> {
        (**self).notify_end(id).await
    }
}

/// Emitter writing through the live coordinator connection.
#[derive(Debug, Clone)]
pub struct TransportEmitter {
    outbound: OutboundHandle,
}

impl TransportEmitter {
    pub fn new(outbound: OutboundHandle) -> Self {
        Self { outbound }
    }
}

#[async_trait::async_trait]
impl ChunkEmitter for TransportEmitter {
    async fn send(&self, id: &CameraIdentity, chunk: Vec<u8>) -> Result<()> {
        self.outbound
            .deliver(Outbound::Chunk {
                id: id.clone(),
                chunk,
            })
            .await
    }

    async fn notify_end(&self, id: &CameraIdentity) -> Result<()> {
        self.outbound.deliver(Outbound::End { id: id.clone() }).await
    }
}

/// What a [`RecordingEmitter`] has seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    Chunk { id: CameraIdentity, chunk: Vec<u8> },
    End { id: CameraIdentity },
}

/// Emitter for tests: records everything and can simulate a dropped connection.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    emitted: Arc<Mutex<Vec<Emitted>>>,
    fail_after: Option<usize>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `sends` calls, then fail every following call as disconnected.
    pub fn with_disconnect_after(mut self, sends: usize) -> Self {
        self.fail_after = Some(sends);
        self
    }

    pub fn emitted(&self) -> Vec<Emitted> {
        self.emitted
            .lock()
            .map(|emitted| emitted.clone())
            .unwrap_or_default()
    }

    /// Sizes of the recorded chunks, in order.
    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.emitted()
            .iter()
            .filter_map(|e| match e {
                Emitted::Chunk { chunk, .. } => Some(chunk.len()),
                Emitted::End { .. } => None,
            })
            .collect()
    }

    pub fn end_count(&self) -> usize {
        self.emitted()
            .iter()
            .filter(|e| matches!(e, Emitted::End { .. }))
            .count()
    }

    fn record(&self, item: Emitted) -> Result<()> {
        let mut emitted = self
            .emitted
            .lock()
            .map_err(|_| CamnodeError::Other("emitter lock poisoned".to_string()))?;
        if self.fail_after.is_some_and(|limit| emitted.len() >= limit) {
            return Err(CamnodeError::transport_unavailable("simulated disconnect"));
        }
        emitted.push(item);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChunkEmitter for RecordingEmitter {
    async fn send(&self, id: &CameraIdentity, chunk: Vec<u8>) -> Result<()> {
        self.record(Emitted::Chunk {
            id: id.clone(),
            chunk,
        })
    }

    async fn notify_end(&self, id: &CameraIdentity) -> Result<()> {
        self.record(Emitted::End { id: id.clone() })
    }
}
