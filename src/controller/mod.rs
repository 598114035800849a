//! Recording controller: the state machine driving one capture cycle at a time.
//!
//! All transitions happen in [`RecordingController::handle`], which never
//! blocks. Process waits and file work run in spawned tasks that report back
//! through the controller's event queue, so a command arriving mid-cycle is
//! judged against the current state immediately.

pub mod event;
pub mod state;

pub use event::ControllerEvent;
pub use state::{CaptureSession, RecordingState};

use crate::cleanup;
use crate::config::{CaptureConfig, Config, StorageConfig, TranscodeConfig};
use crate::error::Result;
use crate::identity::CameraIdentity;
use crate::media;
use crate::process::{ExitWatch, ProcessExit, ProcessSupervisor};
use crate::stream::{self, ChunkEmitter, FileStreamReader};
use crate::transport::Inbound;
use state::Phase;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The parts of the configuration the controller needs.
#[derive(Debug, Clone, Default)]
pub struct ControllerSettings {
    pub capture: CaptureConfig,
    pub transcode: TranscodeConfig,
    pub storage: StorageConfig,
}

impl From<&Config> for ControllerSettings {
    fn from(config: &Config) -> Self {
        Self {
            capture: config.capture.clone(),
            transcode: config.transcode.clone(),
            storage: config.storage.clone(),
        }
    }
}

/// Owns the single capture session and sequences capture, transcode,
/// upload and cleanup.
pub struct RecordingController {
    identity: CameraIdentity,
    settings: ControllerSettings,
    supervisor: Arc<dyn ProcessSupervisor>,
    emitter: Arc<dyn ChunkEmitter>,
    phase: Phase,
    last_cycle: u64,
    end_delivery: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl RecordingController {
    pub fn new(
        identity: CameraIdentity,
        settings: ControllerSettings,
        supervisor: Arc<dyn ProcessSupervisor>,
        emitter: Arc<dyn ChunkEmitter>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            identity,
            settings,
            supervisor,
            emitter,
            phase: Phase::Idle,
            last_cycle: 0,
            end_delivery: None,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.phase.state()
    }

    /// The live capture session, present only while recording or stopping.
    pub fn session(&self) -> Option<&CaptureSession> {
        self.phase.session()
    }

    /// Number of cycles started so far.
    pub fn cycles_started(&self) -> u64 {
        self.last_cycle
    }

    /// Process commands and completions until the command sender is dropped.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Inbound>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(ControllerEvent::Command(command)),
                    None => break,
                },
                Some(event) = self.events_rx.recv() => self.handle(event),
            }
        }

        if self.state() != RecordingState::Idle {
            tracing::warn!(state = %self.state(), "shutting down mid-cycle");
        }
    }

    /// Wait for the next internal completion and apply it.
    pub async fn step(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.handle(event);
        }
    }

    /// Apply completions until the cycle is back to `Idle` or waiting in
    /// `Recording` for a `stop`. A pending `end` notification is awaited too.
    pub async fn settle(&mut self) {
        while !matches!(
            self.state(),
            RecordingState::Idle | RecordingState::Recording
        ) {
            self.step().await;
        }
        if let Some(end_delivery) = self.end_delivery.take() {
            end_delivery.await.ok();
        }
    }

    /// Apply one event. Events that do not fit the current state are ignored.
    pub fn handle(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Command(Inbound::Start) => self.on_start(),
            ControllerEvent::Command(Inbound::Stop) => self.on_stop(),
            ControllerEvent::CaptureExited { cycle, exit } => self.on_capture_exited(cycle, exit),
            ControllerEvent::TranscodeExited { cycle, exit } => {
                self.on_transcode_exited(cycle, exit)
            }
            ControllerEvent::StreamFinished { cycle, result } => {
                self.on_stream_finished(cycle, result)
            }
            ControllerEvent::CleanupFinished {
                cycle,
                report,
                announce_end,
            } => self.on_cleanup_finished(cycle, report, announce_end),
        }
    }

    fn on_start(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            tracing::warn!(state = %self.state(), "start ignored, cycle already in progress");
            return;
        }

        self.last_cycle += 1;
        let cycle = self.last_cycle;
        let raw_path = self.settings.storage.raw_path();
        let transcoded_path = self.settings.storage.transcoded_path();
        let spec = media::capture_command(&self.settings.capture, &raw_path);

        match self.supervisor.launch(&spec) {
            Ok(mut capture) => {
                if let Some(watch) = capture.take_exit() {
                    self.forward_exit(watch, move |exit| ControllerEvent::CaptureExited {
                        cycle,
                        exit,
                    });
                }
                tracing::info!(cycle, pid = ?capture.pid(), output = %raw_path.display(), "recording");
                self.phase = Phase::Recording(CaptureSession::new(
                    cycle,
                    capture,
                    raw_path,
                    transcoded_path,
                ));
            }
            Err(e) => {
                tracing::error!(cycle, "capture failed to start: {}", e);
            }
        }
    }

    fn on_stop(&mut self) {
        match std::mem::take(&mut self.phase) {
            Phase::Recording(mut session) => {
                let cycle = session.cycle();
                if let Some(exit) = session.early_exit() {
                    tracing::info!(cycle, code = ?exit.code, "capture already exited");
                    self.start_transcode(session);
                } else {
                    tracing::info!(cycle, pid = ?session.capture_pid(), "stopping capture");
                    session.request_stop();
                    self.phase = Phase::Stopping(session);
                }
            }
            other => {
                self.phase = other;
                tracing::warn!(state = %self.state(), "stop ignored, not recording");
            }
        }
    }

    fn on_capture_exited(&mut self, cycle: u64, exit: ProcessExit) {
        match std::mem::take(&mut self.phase) {
            Phase::Recording(mut session) if session.cycle() == cycle => {
                tracing::warn!(cycle, code = ?exit.code, "capture exited before stop");
                session.record_early_exit(exit);
                self.phase = Phase::Recording(session);
            }
            Phase::Stopping(session) if session.cycle() == cycle => {
                tracing::info!(cycle, code = ?exit.code, "capture stopped");
                self.start_transcode(session);
            }
            other => {
                self.phase = other;
                self.ignore_stale("capture exit", cycle);
            }
        }
    }

    /// Consumes the session: the capture has exited, so its raw file is final.
    fn start_transcode(&mut self, session: CaptureSession) {
        let cycle = session.cycle();
        let spec = media::transcode_command(
            &self.settings.transcode,
            session.raw_path(),
            session.transcoded_path(),
        );
        drop(session);

        match self.supervisor.launch(&spec) {
            Ok(mut transcode) => {
                if let Some(watch) = transcode.take_exit() {
                    self.forward_exit(watch, move |exit| ControllerEvent::TranscodeExited {
                        cycle,
                        exit,
                    });
                }
                tracing::info!(cycle, "transcoding");
                self.phase = Phase::Transcoding {
                    cycle,
                    _transcode: transcode,
                };
            }
            Err(e) => {
                tracing::error!(cycle, "transcode failed to start: {}", e);
                self.start_cleanup(cycle, false);
            }
        }
    }

    fn on_transcode_exited(&mut self, cycle: u64, exit: ProcessExit) {
        if !matches!(self.phase, Phase::Transcoding { cycle: current, .. } if current == cycle) {
            self.ignore_stale("transcode exit", cycle);
            return;
        }

        if exit.success {
            self.start_streaming(cycle);
        } else {
            tracing::error!(cycle, code = ?exit.code, "transcode failed, nothing to upload");
            self.start_cleanup(cycle, false);
        }
    }

    fn start_streaming(&mut self, cycle: u64) {
        tracing::info!(cycle, "uploading");
        self.phase = Phase::Streaming { cycle };

        let path = self.settings.storage.transcoded_path();
        let chunk_size = self.settings.storage.chunk_size;
        let emitter = Arc::clone(&self.emitter);
        let identity = self.identity.clone();
        let events = self.events_tx.clone();
        let previous_end = self.end_delivery.take();

        tokio::spawn(async move {
            // The previous cycle's `end` must be on the wire before this cycle's chunks.
            if let Some(previous_end) = previous_end {
                previous_end.await.ok();
            }
            let result = match FileStreamReader::open(&path, chunk_size).await {
                Ok(reader) => stream::pump(reader, emitter.as_ref(), &identity).await,
                Err(e) => Err(e),
            };
            events
                .send(ControllerEvent::StreamFinished { cycle, result })
                .ok();
        });
    }

    fn on_stream_finished(&mut self, cycle: u64, result: Result<u64>) {
        if !matches!(self.phase, Phase::Streaming { cycle: current } if current == cycle) {
            self.ignore_stale("stream outcome", cycle);
            return;
        }

        match result {
            Ok(chunks) => {
                tracing::info!(cycle, chunks, "upload complete");
                self.start_cleanup(cycle, true);
            }
            Err(e) => {
                tracing::error!(cycle, "upload aborted: {}", e);
                self.start_cleanup(cycle, false);
            }
        }
    }

    /// Remove both intermediate files. `announce_end` is set when the upload completed.
    fn start_cleanup(&mut self, cycle: u64, announce_end: bool) {
        self.phase = Phase::CleaningUp { cycle };

        let paths = vec![
            self.settings.storage.raw_path(),
            self.settings.storage.transcoded_path(),
        ];
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let report = cleanup::remove_all(&paths).await;
            events
                .send(ControllerEvent::CleanupFinished {
                    cycle,
                    report,
                    announce_end,
                })
                .ok();
        });
    }

    fn on_cleanup_finished(
        &mut self,
        cycle: u64,
        report: cleanup::CleanupReport,
        announce_end: bool,
    ) {
        if !matches!(self.phase, Phase::CleaningUp { cycle: current } if current == cycle) {
            self.ignore_stale("cleanup outcome", cycle);
            return;
        }

        if !report.is_clean() {
            tracing::warn!(
                cycle,
                failures = report.failures.len(),
                "intermediate files left behind"
            );
        }

        // Idle before `end` goes out, so a `start` sent in reply is accepted.
        self.phase = Phase::Idle;

        if announce_end {
            let emitter = Arc::clone(&self.emitter);
            let identity = self.identity.clone();
            self.end_delivery = Some(tokio::spawn(async move {
                match emitter.notify_end(&identity).await {
                    Ok(()) => tracing::info!(cycle, "cycle complete"),
                    Err(e) => tracing::error!(cycle, "end notification failed: {}", e),
                }
            }));
        } else {
            tracing::info!(cycle, "cycle finished without upload");
        }
    }

    fn forward_exit<F>(&self, watch: ExitWatch, to_event: F)
    where
        F: FnOnce(ProcessExit) -> ControllerEvent + Send + 'static,
    {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            tracing::trace!(program = watch.program(), "waiting for exit");
            let exit = watch.wait().await;
            events.send(to_event(exit)).ok();
        });
    }

    fn ignore_stale(&self, what: &str, cycle: u64) {
        tracing::debug!(
            what,
            cycle,
            current_cycle = ?self.phase.cycle(),
            state = %self.state(),
            "ignoring event for a phase already left"
        );
    }
}
