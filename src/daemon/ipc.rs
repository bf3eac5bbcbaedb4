//! IPC Server for the focus daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer and sound commands
//! - Integration with TimerEngine, AudioCoordinator and SessionRecorder
//!
//! One JSON request is read per connection (until the client shuts down
//! its write side), answered with one JSON response, and the connection is
//! closed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::session::{SessionRecorder, SessionStore};
use crate::sound::SoundError;
use crate::types::{ConfigParams, IpcRequest, IpcResponse, ResponseData, TimerMode};

use super::driver::{with_audio, SharedAudio};
use super::timer::TimerEngine;

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
pub const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// Client closed the connection without sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Accepts connections forever, answering each on its own task.
    pub async fn serve<S: SessionStore>(&self, handler: Arc<RequestHandler<S>>) -> Result<()> {
        loop {
            let mut stream = match self.accept().await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("{:#}", e);
                    continue;
                }
            };

            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(&mut stream, &handler).await {
                    warn!("IPC connection failed: {:#}", e);
                }
            });
        }
    }

    /// Answers a single request on `stream`.
    pub async fn handle_connection<S: SessionStore>(
        stream: &mut UnixStream,
        handler: &RequestHandler<S>,
    ) -> Result<()> {
        let response = match Self::receive_request(stream).await {
            Ok(request) => {
                debug!("IPC request: {:?}", request);
                handler.handle(request).await
            }
            Err(e) => IpcResponse::error(format!("Invalid request: {:#}", e)),
        };
        Self::send_response(stream, &response).await
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Reads until the client shuts down its write side, with a read timeout
    /// and a size limit.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(MAX_REQUEST_SIZE);
        let limit = MAX_REQUEST_SIZE as u64 + 1;

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            (&mut *stream).take(limit).read_to_end(&mut buffer),
        )
        .await;

        match read_result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        }

        if buffer.is_empty() {
            return Err(IpcError::ConnectionClosed.into());
        }
        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest =
            serde_json::from_slice(&buffer).context("Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the timer, audio and session
/// subsystems.
pub struct RequestHandler<S: SessionStore> {
    engine: Arc<Mutex<TimerEngine>>,
    audio: SharedAudio,
    recorder: Arc<SessionRecorder<S>>,
}

impl<S: SessionStore> RequestHandler<S> {
    pub fn new(
        engine: Arc<Mutex<TimerEngine>>,
        audio: SharedAudio,
        recorder: Arc<SessionRecorder<S>>,
    ) -> Self {
        Self {
            engine,
            audio,
            recorder,
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start { label } => self.handle_start(label).await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Reset { mode } => self.handle_reset(mode).await,
            IpcRequest::Switch { mode } => self.handle_switch(mode).await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::Configure { params } => self.handle_configure(params).await,
            IpcRequest::SoundToggle => self.handle_sound_toggle().await,
            IpcRequest::SoundTrack { index } => self.handle_sound_track(index).await,
            IpcRequest::SoundVolume { volume } => self.handle_sound_volume(volume).await,
            IpcRequest::SoundList => self.handle_sound_list().await,
            IpcRequest::History => self.handle_history().await,
        }
    }

    /// Builds response data from the current timer and audio state.
    async fn snapshot(&self) -> Result<ResponseData> {
        let data = ResponseData::from_timer_state(self.engine.lock().await.get_state());
        let audio = with_audio(&self.audio, |audio| audio.state()).await?;
        Ok(data.with_audio(audio))
    }

    async fn respond(&self, message: impl Into<String>) -> IpcResponse {
        self.respond_with(message, |_| {}).await
    }

    async fn respond_with(
        &self,
        message: impl Into<String>,
        extend: impl FnOnce(&mut ResponseData),
    ) -> IpcResponse {
        match self.snapshot().await {
            Ok(mut data) => {
                extend(&mut data);
                IpcResponse::success(message, Some(data))
            }
            Err(e) => IpcResponse::error(format!("{:#}", e)),
        }
    }

    async fn handle_start(&self, label: Option<String>) -> IpcResponse {
        let message = {
            let mut engine = self.engine.lock().await;
            if let Some(label) = label {
                engine.set_label(label);
            }

            let state = engine.get_state();
            if !state.is_idle() {
                "Timer is already running".to_string()
            } else {
                let resuming = state.remaining_seconds < state.duration_seconds;
                let mode = state.mode.display_name();
                if let Err(e) = engine.start() {
                    return IpcResponse::error(format!("{:#}", e));
                }
                if resuming {
                    format!("{} resumed", mode)
                } else {
                    format!("{} started", mode)
                }
            }
        };
        self.respond(message).await
    }

    async fn handle_pause(&self) -> IpcResponse {
        let message = {
            let mut engine = self.engine.lock().await;
            let was_running = engine.get_state().is_running();
            if let Err(e) = engine.pause() {
                return IpcResponse::error(format!("{:#}", e));
            }
            if was_running {
                "Timer paused"
            } else {
                "Timer is not running"
            }
        };
        self.respond(message).await
    }

    async fn handle_reset(&self, mode: Option<TimerMode>) -> IpcResponse {
        let message = {
            let mut engine = self.engine.lock().await;
            if let Err(e) = engine.reset(mode) {
                return IpcResponse::error(format!("{:#}", e));
            }
            format!("{} reset", engine.get_state().mode.display_name())
        };
        self.respond(message).await
    }

    async fn handle_switch(&self, mode: TimerMode) -> IpcResponse {
        if let Err(e) = self.engine.lock().await.switch_mode(mode) {
            return IpcResponse::error(format!("{:#}", e));
        }
        self.respond(format!("Switched to {}", mode.display_name()))
            .await
    }

    async fn handle_status(&self) -> IpcResponse {
        self.respond("").await
    }

    async fn handle_configure(&self, params: ConfigParams) -> IpcResponse {
        if params.is_empty() {
            return IpcResponse::error("No configuration changes given");
        }

        {
            let mut engine = self.engine.lock().await;
            let config = params.apply_to(&engine.get_state().config);
            if let Err(e) = config.validate() {
                return IpcResponse::error(e.to_string());
            }
            if let Err(e) = engine.update_config(config) {
                return IpcResponse::error(format!("{:#}", e));
            }
        }
        self.respond("Configuration updated").await
    }

    async fn handle_sound_toggle(&self) -> IpcResponse {
        let state = match with_audio(&self.audio, |audio| audio.toggle()).await {
            Ok(state) => state,
            Err(e) => return IpcResponse::error(format!("{:#}", e)),
        };
        let message = if state.is_playing {
            format!("Playing {}", state.track_name)
        } else {
            "Ambient sound paused".to_string()
        };
        self.respond(message).await
    }

    async fn handle_sound_track(&self, index: usize) -> IpcResponse {
        let result = with_audio(&self.audio, move |audio| match audio.change_track(index) {
            Ok(state) => Ok((state, unavailable_reason(audio.last_error()))),
            Err(e) => Err(e),
        })
        .await;
        match result {
            Ok(Ok((state, _))) if state.is_playing => {
                self.respond(format!("Playing {}", state.track_name)).await
            }
            Ok(Ok((state, reason))) => {
                self.respond(format!("Selected {} ({})", state.track_name, reason))
                    .await
            }
            Ok(Err(e)) => IpcResponse::error(format!("{} ({})", e, e.suggestion())),
            Err(e) => IpcResponse::error(format!("{:#}", e)),
        }
    }

    async fn handle_sound_volume(&self, volume: f32) -> IpcResponse {
        match with_audio(&self.audio, move |audio| audio.set_volume(volume)).await {
            Ok(state) => {
                self.respond(format!("Volume set to {:.0}%", state.volume * 100.0))
                    .await
            }
            Err(e) => IpcResponse::error(format!("{:#}", e)),
        }
    }

    async fn handle_sound_list(&self) -> IpcResponse {
        match with_audio(&self.audio, |audio| audio.tracks()).await {
            Ok(tracks) => self.respond_with("", |data| data.tracks = Some(tracks)).await,
            Err(e) => IpcResponse::error(format!("{:#}", e)),
        }
    }

    async fn handle_history(&self) -> IpcResponse {
        let sessions = self.recorder.refresh_recent().await;
        self.respond_with("", |data| data.sessions = Some(sessions))
            .await
    }
}

/// Short reason shown when a selected track could not start.
fn unavailable_reason(error: Option<&SoundError>) -> &'static str {
    match error {
        Some(e) if e.is_device_error() => "no audio device",
        Some(e) if e.is_file_error() => "track file unavailable",
        _ => "playback unavailable",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::daemon::timer::TimerEvent;
    use crate::session::{MemorySessionStore, StaticIdentity};
    use crate::sound::{AudioCoordinator, MockAudioOutput, ALARM_VOLUME, TRACK_CATALOG};
    use crate::types::{CountdownStatus, TimerConfig};

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        (dir, path)
    }

    struct Fixture {
        handler: RequestHandler<MemorySessionStore>,
        engine: Arc<Mutex<TimerEngine>>,
        audio_output: Arc<MockAudioOutput>,
        _rx: mpsc::UnboundedReceiver<TimerEvent>,
    }

    fn create_fixture(identity: StaticIdentity) -> Fixture {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Mutex::new(TimerEngine::new(TimerConfig::default(), tx)));
        let audio_output = Arc::new(MockAudioOutput::new());
        let coordinator =
            AudioCoordinator::new(Box::new(Arc::clone(&audio_output)), "/sounds", 0, 0.5);
        let recorder = Arc::new(SessionRecorder::new(
            MemorySessionStore::new(),
            Arc::new(identity),
        ));
        let handler = RequestHandler::new(
            Arc::clone(&engine),
            Arc::new(std::sync::Mutex::new(coordinator)),
            recorder,
        );
        Fixture {
            handler,
            engine,
            audio_output,
            _rx: rx,
        }
    }

    fn create_handler() -> Fixture {
        create_fixture(StaticIdentity::user("user-1"))
    }

    async fn send_raw(path: PathBuf, payload: Vec<u8>) -> IpcResponse {
        let mut stream = UnixStream::connect(&path).await.unwrap();
        stream.write_all(&payload).await.unwrap();
        stream.shutdown().await.unwrap();
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await.unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    // ------------------------------------------------------------------------
    // IpcServer Tests
    // ------------------------------------------------------------------------

    mod ipc_server_tests {
        use super::*;

        #[tokio::test]
        async fn test_server_creation() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path);

            assert!(server.is_ok());
            assert!(socket_path.exists());
        }

        #[tokio::test]
        async fn test_server_removes_existing_socket() {
            let (_dir, socket_path) = create_temp_socket_path();
            std::fs::write(&socket_path, "stale").unwrap();

            assert!(IpcServer::new(&socket_path).is_ok());
        }

        #[tokio::test]
        async fn test_server_creates_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let socket_path = dir.path().join("subdir").join("test.sock");

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
            assert!(socket_path.parent().unwrap().exists());
        }

        #[tokio::test]
        async fn test_receive_request_status() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(br#"{"command":"status"}"#).await.unwrap();
                stream.shutdown().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();

            assert!(matches!(request, IpcRequest::Status));
            client.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_start_with_label() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream
                    .write_all(br#"{"command":"start","label":"Write report"}"#)
                    .await
                    .unwrap();
                stream.shutdown().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();

            match request {
                IpcRequest::Start { label } => assert_eq!(label.as_deref(), Some("Write report")),
                other => panic!("Expected Start request, got {:?}", other),
            }
            client.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_invalid_json() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(b"not valid json").await.unwrap();
                stream.shutdown().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            assert!(IpcServer::receive_request(&mut stream).await.is_err());
        }

        #[tokio::test]
        async fn test_receive_request_too_large() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let label = "x".repeat(MAX_REQUEST_SIZE);
                let payload = format!(r#"{{"command":"start","label":"{}"}}"#, label);
                let _ = stream.write_all(payload.as_bytes()).await;
                let _ = stream.shutdown().await;
            });

            let mut stream = server.accept().await.unwrap();
            let err = IpcServer::receive_request(&mut stream).await.unwrap_err();

            assert!(matches!(
                err.downcast_ref::<IpcError>(),
                Some(IpcError::RequestTooLarge)
            ));
        }

        #[tokio::test]
        async fn test_connection_closed() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client = tokio::spawn(async move {
                let stream = UnixStream::connect(&client_path).await.unwrap();
                drop(stream);
            });

            let mut stream = server.accept().await.unwrap();
            let err = IpcServer::receive_request(&mut stream).await.unwrap_err();

            assert!(matches!(
                err.downcast_ref::<IpcError>(),
                Some(IpcError::ConnectionClosed)
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_receive_request_timeout() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            // Client connects and never writes.
            let _client = UnixStream::connect(&socket_path).await.unwrap();

            let mut stream = server.accept().await.unwrap();
            let err = IpcServer::receive_request(&mut stream).await.unwrap_err();

            assert!(matches!(
                err.downcast_ref::<IpcError>(),
                Some(IpcError::Timeout)
            ));
        }

        #[tokio::test]
        async fn test_send_response() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let mut buffer = Vec::new();
                stream.read_to_end(&mut buffer).await.unwrap();
                serde_json::from_slice::<IpcResponse>(&buffer).unwrap()
            });

            let mut stream = server.accept().await.unwrap();
            let response = IpcResponse::success("Test message", None);
            IpcServer::send_response(&mut stream, &response)
                .await
                .unwrap();
            drop(stream);

            let received = client.await.unwrap();
            assert_eq!(received.status, "success");
            assert_eq!(received.message, "Test message");
        }

        #[tokio::test]
        async fn test_socket_path_getter() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            assert_eq!(server.socket_path(), socket_path);
        }

        #[tokio::test]
        async fn test_server_drop_cleanup() {
            let (_dir, socket_path) = create_temp_socket_path();

            {
                let _server = IpcServer::new(&socket_path).unwrap();
                assert!(socket_path.exists());
            }

            assert!(!socket_path.exists());
        }
    }

    // ------------------------------------------------------------------------
    // RequestHandler Tests
    // ------------------------------------------------------------------------

    mod request_handler_tests {
        use super::*;

        #[tokio::test]
        async fn test_handle_status() {
            let f = create_handler();

            let response = f.handler.handle(IpcRequest::Status).await;

            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.mode, Some(TimerMode::Focus));
            assert_eq!(data.status, Some(CountdownStatus::Idle));
            assert_eq!(data.remaining_seconds, Some(25 * 60));
            assert_eq!(data.cycle_count, Some(0));
            assert_eq!(data.audio.unwrap().track_index, 0);
        }

        #[tokio::test]
        async fn test_handle_start() {
            let f = create_handler();

            let response = f
                .handler
                .handle(IpcRequest::Start {
                    label: Some("Write report".to_string()),
                })
                .await;

            assert!(response.is_success());
            assert_eq!(response.message, "Focus started");
            let data = response.data.unwrap();
            assert_eq!(data.status, Some(CountdownStatus::Running));
            assert_eq!(data.label, Some("Write report".to_string()));
        }

        #[tokio::test]
        async fn test_handle_start_already_running() {
            let f = create_handler();
            f.handler.handle(IpcRequest::Start { label: None }).await;

            let response = f.handler.handle(IpcRequest::Start { label: None }).await;

            assert!(response.is_success());
            assert_eq!(response.message, "Timer is already running");
        }

        #[tokio::test]
        async fn test_handle_start_after_pause_resumes() {
            let f = create_handler();
            f.handler.handle(IpcRequest::Start { label: None }).await;
            f.engine.lock().await.tick().unwrap();
            f.handler.handle(IpcRequest::Pause).await;

            let response = f.handler.handle(IpcRequest::Start { label: None }).await;

            assert_eq!(response.message, "Focus resumed");
            assert_eq!(response.data.unwrap().remaining_seconds, Some(25 * 60 - 1));
        }

        #[tokio::test]
        async fn test_handle_pause() {
            let f = create_handler();
            f.handler.handle(IpcRequest::Start { label: None }).await;

            let response = f.handler.handle(IpcRequest::Pause).await;

            assert_eq!(response.message, "Timer paused");
            assert_eq!(response.data.unwrap().status, Some(CountdownStatus::Idle));
        }

        #[tokio::test]
        async fn test_handle_pause_not_running() {
            let f = create_handler();

            let response = f.handler.handle(IpcRequest::Pause).await;

            assert!(response.is_success());
            assert_eq!(response.message, "Timer is not running");
        }

        #[tokio::test]
        async fn test_handle_reset_to_mode() {
            let f = create_handler();
            f.handler.handle(IpcRequest::Start { label: None }).await;

            let response = f
                .handler
                .handle(IpcRequest::Reset {
                    mode: Some(TimerMode::LongBreak),
                })
                .await;

            assert_eq!(response.message, "Long break reset");
            let data = response.data.unwrap();
            assert_eq!(data.mode, Some(TimerMode::LongBreak));
            assert_eq!(data.status, Some(CountdownStatus::Idle));
            assert_eq!(data.remaining_seconds, Some(15 * 60));
        }

        #[tokio::test]
        async fn test_handle_switch() {
            let f = create_handler();

            let response = f
                .handler
                .handle(IpcRequest::Switch {
                    mode: TimerMode::ShortBreak,
                })
                .await;

            assert_eq!(response.message, "Switched to Short break");
            assert_eq!(response.data.unwrap().remaining_seconds, Some(5 * 60));
        }

        #[tokio::test]
        async fn test_handle_configure() {
            let f = create_handler();

            let response = f
                .handler
                .handle(IpcRequest::Configure {
                    params: ConfigParams {
                        focus_minutes: Some(50),
                        auto_start: Some(true),
                        ..Default::default()
                    },
                })
                .await;

            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.remaining_seconds, Some(50 * 60));
            let config = data.config.unwrap();
            assert_eq!(config.focus_minutes, 50);
            assert_eq!(config.short_break_minutes, 5);
            assert!(config.auto_start);
        }

        #[tokio::test]
        async fn test_handle_configure_invalid() {
            let f = create_handler();

            let response = f
                .handler
                .handle(IpcRequest::Configure {
                    params: ConfigParams {
                        long_break_interval: Some(0),
                        ..Default::default()
                    },
                })
                .await;

            assert!(!response.is_success());
            assert!(response.message.contains("long break interval"));
            assert_eq!(
                f.engine.lock().await.get_state().config,
                TimerConfig::default()
            );
        }

        #[tokio::test]
        async fn test_handle_configure_empty() {
            let f = create_handler();

            let response = f
                .handler
                .handle(IpcRequest::Configure {
                    params: ConfigParams::default(),
                })
                .await;

            assert!(!response.is_success());
        }

        #[tokio::test]
        async fn test_handle_sound_toggle() {
            let f = create_handler();

            let response = f.handler.handle(IpcRequest::SoundToggle).await;
            assert_eq!(response.message, "Playing Rain");
            assert!(response.data.unwrap().audio.unwrap().is_playing);

            let response = f.handler.handle(IpcRequest::SoundToggle).await;
            assert_eq!(response.message, "Ambient sound paused");
        }

        #[tokio::test]
        async fn test_handle_sound_toggle_failure_reports_paused() {
            let f = create_handler();
            f.audio_output.set_fail_play(true);

            let response = f.handler.handle(IpcRequest::SoundToggle).await;

            assert!(response.is_success());
            assert!(!response.data.unwrap().audio.unwrap().is_playing);
        }

        #[tokio::test]
        async fn test_handle_sound_track() {
            let f = create_handler();

            let response = f.handler.handle(IpcRequest::SoundTrack { index: 1 }).await;

            assert_eq!(response.message, "Playing Forest");
            assert_eq!(response.data.unwrap().audio.unwrap().track_index, 1);
        }

        #[tokio::test]
        async fn test_handle_sound_track_unknown() {
            let f = create_handler();

            let response = f
                .handler
                .handle(IpcRequest::SoundTrack {
                    index: TRACK_CATALOG.len(),
                })
                .await;

            assert!(!response.is_success());
            assert!(response.message.contains("no ambient track"));
        }

        #[tokio::test]
        async fn test_handle_sound_track_missing_file() {
            let f = create_handler();
            f.audio_output.set_fail_load(true);

            let response = f.handler.handle(IpcRequest::SoundTrack { index: 1 }).await;

            assert!(response.is_success());
            assert_eq!(response.message, "Selected Forest (track file unavailable)");
            assert!(!response.data.unwrap().audio.unwrap().is_playing);
        }

        #[tokio::test]
        async fn test_handle_sound_track_playback_failure() {
            let f = create_handler();
            f.audio_output.set_fail_play(true);

            let response = f.handler.handle(IpcRequest::SoundTrack { index: 2 }).await;

            assert_eq!(response.message, "Selected Ocean Waves (playback unavailable)");
        }

        #[tokio::test]
        async fn test_handle_sound_track_without_device() {
            let f = create_handler();
            let coordinator =
                AudioCoordinator::new(Box::new(crate::sound::NullAudioOutput), "/sounds", 0, 0.5);
            let handler = RequestHandler::new(
                Arc::clone(&f.engine),
                Arc::new(std::sync::Mutex::new(coordinator)),
                Arc::clone(&f.handler.recorder),
            );

            let response = handler.handle(IpcRequest::SoundTrack { index: 1 }).await;

            assert!(response.is_success());
            assert_eq!(response.message, "Selected Forest (no audio device)");
        }

        #[tokio::test]
        async fn test_slow_audio_does_not_block_timer() {
            let f = create_handler();
            f.audio_output.set_delay(Duration::from_millis(300));
            let handler = Arc::new(f.handler);

            let toggle = tokio::spawn({
                let handler = Arc::clone(&handler);
                async move { handler.handle(IpcRequest::SoundToggle).await }
            });
            tokio::time::sleep(Duration::from_millis(50)).await;

            assert!(!toggle.is_finished());
            f.engine.lock().await.start().unwrap();
            assert!(f.engine.lock().await.get_state().is_running());

            let response = toggle.await.unwrap();
            assert_eq!(response.message, "Playing Rain");
        }

        #[tokio::test]
        async fn test_handle_sound_volume_clamps() {
            let f = create_handler();

            let response = f
                .handler
                .handle(IpcRequest::SoundVolume { volume: 3.0 })
                .await;

            assert_eq!(response.message, "Volume set to 100%");
            assert_eq!(response.data.unwrap().audio.unwrap().volume, 1.0);
        }

        #[tokio::test]
        async fn test_handle_sound_list() {
            let f = create_handler();

            let response = f.handler.handle(IpcRequest::SoundList).await;

            assert_eq!(response.data.unwrap().tracks.unwrap().len(), TRACK_CATALOG.len());
        }

        #[tokio::test]
        async fn test_handle_history() {
            let f = create_handler();
            f.handler
                .recorder
                .record_completion(25, "Deep work")
                .await
                .unwrap();

            let response = f.handler.handle(IpcRequest::History).await;

            let sessions = response.data.unwrap().sessions.unwrap();
            assert_eq!(sessions.len(), 1);
            assert_eq!(sessions[0].label, "Deep work");
        }

        #[tokio::test]
        async fn test_handle_history_guest() {
            let f = create_fixture(StaticIdentity::guest());

            let response = f.handler.handle(IpcRequest::History).await;

            assert!(response.is_success());
            assert!(response.data.unwrap().sessions.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_alarm_volume_not_affected_by_volume_command() {
            let f = create_handler();
            f.handler
                .handle(IpcRequest::SoundVolume { volume: 0.9 })
                .await;

            with_audio(&f.handler.audio, |audio| audio.play_alarm())
                .await
                .unwrap();

            assert!(f.audio_output.calls().iter().any(|call| matches!(
                call,
                crate::sound::AudioCall::Alarm { volume, .. } if *volume == ALARM_VOLUME
            )));
        }
    }

    // ------------------------------------------------------------------------
    // Serve loop Tests
    // ------------------------------------------------------------------------

    mod serve_tests {
        use super::*;

        #[tokio::test]
        async fn test_full_ipc_flow() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let f = create_handler();
            let handler = Arc::new(f.handler);

            let serve = tokio::spawn(async move { server.serve(handler).await });

            let response = send_raw(
                socket_path.clone(),
                br#"{"command":"start","label":"Integration Test"}"#.to_vec(),
            )
            .await;
            assert_eq!(response.message, "Focus started");

            let response = send_raw(socket_path.clone(), br#"{"command":"status"}"#.to_vec()).await;
            let data = response.data.unwrap();
            assert_eq!(data.status, Some(CountdownStatus::Running));
            assert_eq!(data.label, Some("Integration Test".to_string()));

            serve.abort();
        }

        #[tokio::test]
        async fn test_invalid_request_gets_error_response() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let handler = Arc::new(create_handler().handler);

            let serve = tokio::spawn(async move { server.serve(handler).await });

            let response = send_raw(socket_path.clone(), br#"{"command":"explode"}"#.to_vec()).await;
            assert_eq!(response.status, "error");
            assert!(response.message.starts_with("Invalid request"));

            serve.abort();
        }
    }
}
