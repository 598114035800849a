//! Persistent TCP connection to the coordinator with automatic reconnect.

use crate::config::ServerConfig;
use crate::error::{CamnodeError, Result};
use crate::identity::CameraIdentity;
use crate::transport::protocol::{Inbound, Outbound};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};

/// One outbound message plus the channel reporting whether it was written.
#[derive(Debug)]
struct Envelope {
    message: Outbound,
    ack: oneshot::Sender<Result<()>>,
}

impl Envelope {
    fn reject(self, reason: &str) {
        self.ack
            .send(Err(CamnodeError::transport_unavailable(reason)))
            .ok();
    }
}

/// Cloneable sender side of the transport.
#[derive(Debug, Clone)]
pub struct OutboundHandle {
    tx: mpsc::Sender<Envelope>,
    connected: watch::Receiver<bool>,
}

impl OutboundHandle {
    /// Whether the coordinator connection is currently up.
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Send a message and wait until it has been written to the socket.
    ///
    /// # Errors
    /// Returns `CamnodeError::TransportUnavailable` if the connection is down,
    /// drops before the write, or the transport has stopped.
    pub async fn deliver(&self, message: Outbound) -> Result<()> {
        if !self.is_connected() {
            return Err(CamnodeError::transport_unavailable("not connected"));
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                message,
                ack: ack_tx,
            })
            .await
            .map_err(|_| CamnodeError::transport_unavailable("transport stopped"))?;

        ack_rx
            .await
            .map_err(|_| CamnodeError::transport_unavailable("message dropped"))?
    }
}

/// Connection manager: sends `init` on every connect, forwards inbound
/// commands, writes outbound messages, reconnects after failures.
pub struct TransportClient {
    config: ServerConfig,
    identity: CameraIdentity,
    commands: mpsc::Sender<Inbound>,
    outbound: mpsc::Receiver<Envelope>,
    connected: watch::Sender<bool>,
}

impl TransportClient {
    /// Create the client and the handle used to send through it.
    pub fn new(
        config: ServerConfig,
        identity: CameraIdentity,
        commands: mpsc::Sender<Inbound>,
        queue_depth: usize,
    ) -> (Self, OutboundHandle) {
        let (tx, outbound) = mpsc::channel(queue_depth.max(1));
        let (connected, connected_rx) = watch::channel(false);

        let client = Self {
            config,
            identity,
            commands,
            outbound,
            connected,
        };
        let handle = OutboundHandle {
            tx,
            connected: connected_rx,
        };
        (client, handle)
    }

    fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run until the command receiver is dropped.
    pub async fn run(mut self) {
        let address = self.address();
        loop {
            match TcpStream::connect(&address).await {
                Ok(stream) => {
                    tracing::info!(%address, "connected to coordinator");
                    self.connected.send_replace(true);
                    match self.serve(stream).await {
                        Ok(()) => tracing::warn!(%address, "coordinator closed the connection"),
                        Err(e) => tracing::warn!(%address, "connection lost: {}", e),
                    }
                    self.connected.send_replace(false);
                }
                Err(e) => tracing::warn!(%address, "failed to connect: {}", e),
            }

            if self.commands.is_closed() {
                tracing::debug!("command receiver dropped, transport stopping");
                return;
            }
            self.wait_before_reconnect().await;
        }
    }

    /// Sleep for the reconnect delay, failing anything queued meanwhile.
    async fn wait_before_reconnect(&mut self) {
        let delay = tokio::time::sleep(Duration::from_millis(self.config.reconnect_delay_ms));
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => return,
                Some(envelope) = self.outbound.recv() => envelope.reject("not connected"),
            }
        }
    }

    async fn serve(&mut self, stream: TcpStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        write_message(
            &mut writer,
            &Outbound::Init {
                id: self.identity.clone(),
            },
        )
        .await?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = line.map_err(|e| {
                        CamnodeError::transport_unavailable(format!("read failed: {}", e))
                    })?;
                    match line {
                        Some(line) => self.dispatch(&line).await,
                        None => return Ok(()),
                    }
                }
                Some(envelope) = self.outbound.recv() => {
                    let kind = envelope.message.kind();
                    match write_message(&mut writer, &envelope.message).await {
                        Ok(()) => {
                            envelope.ack.send(Ok(())).ok();
                        }
                        Err(e) => {
                            let message = e.to_string();
                            tracing::debug!(kind, "write failed: {}", message);
                            envelope.reject(&message);
                            return Err(CamnodeError::transport_unavailable(message));
                        }
                    }
                }
            }
        }
    }

    async fn dispatch(&self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match Inbound::from_json(line) {
            Ok(command) => {
                tracing::debug!(?command, "command received");
                if self.commands.send(command).await.is_err() {
                    tracing::warn!(?command, "controller gone, command dropped");
                }
            }
            Err(e) => tracing::warn!(line, "ignoring unparseable message: {}", e),
        }
    }
}

async fn write_message<W>(writer: &mut W, message: &Outbound) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut json = message.to_json().map_err(|e| CamnodeError::Protocol {
        message: format!("Failed to serialize {}: {}", message.kind(), e),
    })?;
    json.push('\n');

    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| CamnodeError::transport_unavailable(format!("write failed: {}", e)))?;

    writer
        .flush()
        .await
        .map_err(|e| CamnodeError::transport_unavailable(format!("flush failed: {}", e)))?;

    Ok(())
}
