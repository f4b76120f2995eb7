use crate::config::Config;
use moodlock_capture::FrameSource;
use moodlock_core::{
    FaceDetectionResult, FaceQuality, Frame, MoodDetectionResult, MoodError, MoodSession,
    NativeFaceDetector, Rect,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("mood inference failed: {0}")]
    Mood(#[from] MoodError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Snapshot of the current face lock, for display.
#[derive(Debug, Clone, Serialize)]
pub struct LockStatus {
    pub id: String,
    pub quality: FaceQuality,
    pub confidence: f32,
    pub bounding_box: Rect,
    pub remaining: Duration,
    pub snapshot_bytes: usize,
}

/// Messages sent from async callers to the engine thread.
enum EngineRequest {
    Detect {
        reply: oneshot::Sender<FaceDetectionResult>,
    },
    Lock {
        reply: oneshot::Sender<bool>,
    },
    LockStatus {
        reply: oneshot::Sender<Option<LockStatus>>,
    },
    ClearLock {
        reply: oneshot::Sender<()>,
    },
    MoodFromLock {
        reply: oneshot::Sender<Result<MoodDetectionResult, MoodError>>,
    },
    MoodFromVideo {
        reply: oneshot::Sender<Result<MoodDetectionResult, MoodError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Capture a frame and run one detection cycle on it.
    pub async fn detect(&self) -> Result<FaceDetectionResult, EngineError> {
        self.request(|reply| EngineRequest::Detect { reply }).await
    }

    /// Lock onto the face from the most recent detection cycle.
    pub async fn lock(&self) -> Result<bool, EngineError> {
        self.request(|reply| EngineRequest::Lock { reply }).await
    }

    pub async fn lock_status(&self) -> Result<Option<LockStatus>, EngineError> {
        self.request(|reply| EngineRequest::LockStatus { reply }).await
    }

    pub async fn clear_lock(&self) -> Result<(), EngineError> {
        self.request(|reply| EngineRequest::ClearLock { reply }).await
    }

    /// Infer a mood from the current lock.
    pub async fn mood_from_lock(&self) -> Result<MoodDetectionResult, EngineError> {
        Ok(self.request(|reply| EngineRequest::MoodFromLock { reply }).await??)
    }

    /// Infer a mood from the most recent detection cycle (or the lock, if valid).
    pub async fn mood_from_video(&self) -> Result<MoodDetectionResult, EngineError> {
        Ok(self.request(|reply| EngineRequest::MoodFromVideo { reply }).await??)
    }
}

/// Spawn the engine with a session built from `config`.
pub fn spawn_engine(
    config: &Config,
    source: Box<dyn FrameSource>,
    native: Option<Box<dyn NativeFaceDetector>>,
) -> Result<EngineHandle, EngineError> {
    tracing::info!(
        lock_ttl_ms = config.lock_ttl_ms,
        native = native.is_some(),
        simulate_latency = config.simulate_latency,
        "starting engine"
    );
    spawn_session(config.build_session(native), source)
}

/// Spawn the engine on a dedicated OS thread around an existing session.
///
/// Requests are handled one at a time, in arrival order.
pub fn spawn_session(
    session: MoodSession,
    source: Box<dyn FrameSource>,
) -> Result<EngineHandle, EngineError> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    let mut worker = Worker {
        session,
        source,
        last: None,
    };

    std::thread::Builder::new()
        .name("moodlock-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                worker.handle(req);
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

/// Engine-thread state: the session plus the latest frame and its result.
struct Worker {
    session: MoodSession,
    source: Box<dyn FrameSource>,
    last: Option<(Frame, FaceDetectionResult)>,
}

impl Worker {
    fn handle(&mut self, req: EngineRequest) {
        match req {
            EngineRequest::Detect { reply } => {
                let _ = reply.send(self.detect());
            }
            EngineRequest::Lock { reply } => {
                let locked = match &self.last {
                    Some((frame, result)) => self.session.lock_face(frame, result),
                    None => false,
                };
                let _ = reply.send(locked);
            }
            EngineRequest::LockStatus { reply } => {
                let _ = reply.send(self.lock_status());
            }
            EngineRequest::ClearLock { reply } => {
                self.session.clear_lock();
                let _ = reply.send(());
            }
            EngineRequest::MoodFromLock { reply } => {
                let _ = reply.send(self.session.detect_mood_from_locked_face());
            }
            EngineRequest::MoodFromVideo { reply } => {
                let result = match &self.last {
                    Some((frame, detection)) => {
                        self.session.detect_mood_from_video(Some(frame), detection)
                    }
                    None => {
                        let unavailable = self.session.detect_face(None);
                        self.session.detect_mood_from_video(None, &unavailable)
                    }
                };
                let _ = reply.send(result);
            }
        }
    }

    /// One detection cycle. The previous frame is dropped before capture.
    fn detect(&mut self) -> FaceDetectionResult {
        self.last = None;
        match self.source.capture() {
            Ok(frame) => {
                let result = self.session.detect_face(Some(&frame));
                self.last = Some((frame, result.clone()));
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "frame capture failed");
                self.session.detect_face(None)
            }
        }
    }

    fn lock_status(&mut self) -> Option<LockStatus> {
        let remaining = self.session.lock_remaining()?;
        let locked = self.session.locked_face()?;
        Some(LockStatus {
            id: locked.id.to_string(),
            quality: locked.quality,
            confidence: locked.confidence,
            bounding_box: locked.bounding_box,
            remaining,
            snapshot_bytes: locked.image_data.len(),
        })
    }
}
