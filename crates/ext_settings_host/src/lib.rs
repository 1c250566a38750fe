//! Message contract of the settings window host.
//!
//! The host window embeds the settings UI and relays messages between it and the parent
//! process that launched it. Only the routing is modelled here; windowing and the transport
//! behind the channels belong to the embedding application.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// ============================================================================
// Error Types (8200+ range - ext_system_menu uses 8100)
// ============================================================================

/// Error codes for settings host operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SettingsHostErrorCode {
    /// Launch arguments are malformed
    InvalidArguments = 8200,
    /// Parent process id is not a number
    InvalidParentPid = 8201,
    /// Sending to the parent process or the UI failed
    ChannelSend = 8202,
    /// The host window stopped listening for events
    ChannelClosed = 8203,
}

/// Custom error type for settings host operations
#[derive(Debug, thiserror::Error)]
pub enum SettingsHostError {
    #[error("[{code}] Invalid arguments: {message}")]
    InvalidArguments { code: u32, message: String },

    #[error("[{code}] Invalid parent pid: {value}")]
    InvalidParentPid { code: u32, value: String },

    #[error("[{code}] Channel send error: {message}")]
    ChannelSend { code: u32, message: String },

    #[error("[{code}] Channel closed: {message}")]
    ChannelClosed { code: u32, message: String },
}

impl SettingsHostError {
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            code: SettingsHostErrorCode::InvalidArguments as u32,
            message: message.into(),
        }
    }

    pub fn invalid_parent_pid(value: impl Into<String>) -> Self {
        Self::InvalidParentPid {
            code: SettingsHostErrorCode::InvalidParentPid as u32,
            value: value.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            code: SettingsHostErrorCode::ChannelSend as u32,
            message: message.into(),
        }
    }

    pub fn channel_closed(message: impl Into<String>) -> Self {
        Self::ChannelClosed {
            code: SettingsHostErrorCode::ChannelClosed as u32,
            message: message.into(),
        }
    }
}

// ============================================================================
// Launch Arguments
// ============================================================================

/// Argument count (executable included) at which the host runs integrated
pub const INTEGRATED_ARG_COUNT: usize = 4;

/// Channels and parent handed over by the launching process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchArgs {
    pub executable: String,
    /// Outbound channel name: UI messages for the parent go here
    pub runner_pipe: String,
    /// Inbound channel name: the parent writes messages for the UI here
    pub settings_pipe: String,
    pub parent_pid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    /// Started by a parent process with both channels
    Integrated(LaunchArgs),
    /// Started on its own; messages for the parent are dropped
    Standalone,
}

impl LaunchMode {
    /// Decide the launch mode from the full argument list, executable first.
    ///
    /// Fewer than [`INTEGRATED_ARG_COUNT`] arguments means standalone. Extra arguments are
    /// ignored.
    pub fn from_args<I, S>(args: I) -> Result<Self, SettingsHostError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.len() < INTEGRATED_ARG_COUNT {
            return Ok(Self::Standalone);
        }

        let mut args = args.into_iter();
        let executable = args.next().unwrap_or_default();
        let runner_pipe = args.next().unwrap_or_default();
        let settings_pipe = args.next().unwrap_or_default();
        let pid = args.next().unwrap_or_default();

        if runner_pipe.is_empty() || settings_pipe.is_empty() {
            return Err(SettingsHostError::invalid_arguments(
                "channel names must not be empty",
            ));
        }
        let parent_pid = pid
            .trim()
            .parse::<u32>()
            .map_err(|_| SettingsHostError::invalid_parent_pid(pid.clone()))?;

        Ok(Self::Integrated(LaunchArgs {
            executable,
            runner_pipe,
            settings_pipe,
            parent_pid,
        }))
    }

    pub fn is_integrated(&self) -> bool {
        matches!(self, Self::Integrated(_))
    }

    pub fn launch_args(&self) -> Option<&LaunchArgs> {
        match self {
            Self::Integrated(args) => Some(args),
            Self::Standalone => None,
        }
    }
}

// ============================================================================
// UI Messages
// ============================================================================

/// A message posted by the settings UI, classified by content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    /// Starts with `{`: a JSON payload for the parent, kept verbatim
    Json(String),
    /// `exit`: the UI agreed to close
    Exit,
    /// `cancel-exit`: the UI vetoed a close request
    CancelExit,
    Unrecognized(String),
}

impl UiMessage {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with('{') {
            Self::Json(raw.to_string())
        } else if raw == "exit" {
            Self::Exit
        } else if raw == "cancel-exit" {
            Self::CancelExit
        } else {
            Self::Unrecognized(raw.to_string())
        }
    }

    /// Parse the payload of a [`UiMessage::Json`]
    pub fn json_value(&self) -> Option<serde_json::Value> {
        match self {
            Self::Json(raw) => serde_json::from_str(raw).ok(),
            _ => None,
        }
    }
}

// ============================================================================
// Close Confirmation
// ============================================================================

/// What the host window does with a close request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Ask the UI to confirm; it answers with `exit` or `cancel-exit`
    AskUi,
    Destroy,
}

/// Tracks whether a close request is waiting on the UI.
///
/// A second close while waiting destroys the window, so an unresponsive UI can always be
/// closed.
#[derive(Debug, Default, Clone)]
pub struct CloseGuard {
    waiting: bool,
}

impl CloseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_close(&mut self, ui_attached: bool) -> CloseDecision {
        if self.waiting || !ui_attached {
            return CloseDecision::Destroy;
        }
        self.waiting = true;
        CloseDecision::AskUi
    }

    pub fn cancel(&mut self) {
        self.waiting = false;
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }
}

// ============================================================================
// Relay
// ============================================================================

/// Event for the host window loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Run the UI's close confirmation
    ConfirmClose,
    DestroyWindow,
}

/// What happened to a message from the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    ForwardedToParent,
    /// JSON while standalone: there is no parent to receive it
    Dropped,
    DestroyRequested,
    CloseCancelled,
    Ignored,
}

/// Routes messages between the settings UI, the host window and the parent process
pub struct SettingsRelay {
    mode: LaunchMode,
    to_parent_tx: Option<mpsc::Sender<String>>,
    to_ui_tx: mpsc::Sender<String>,
    host_tx: mpsc::Sender<HostEvent>,
    close_guard: CloseGuard,
}

impl SettingsRelay {
    /// Relay for an integrated launch, forwarding JSON to `to_parent_tx`
    pub fn integrated(
        args: LaunchArgs,
        to_parent_tx: mpsc::Sender<String>,
        to_ui_tx: mpsc::Sender<String>,
        host_tx: mpsc::Sender<HostEvent>,
    ) -> Self {
        Self {
            mode: LaunchMode::Integrated(args),
            to_parent_tx: Some(to_parent_tx),
            to_ui_tx,
            host_tx,
            close_guard: CloseGuard::new(),
        }
    }

    pub fn standalone(to_ui_tx: mpsc::Sender<String>, host_tx: mpsc::Sender<HostEvent>) -> Self {
        Self {
            mode: LaunchMode::Standalone,
            to_parent_tx: None,
            to_ui_tx,
            host_tx,
            close_guard: CloseGuard::new(),
        }
    }

    pub fn mode(&self) -> &LaunchMode {
        &self.mode
    }

    pub fn close_guard(&self) -> &CloseGuard {
        &self.close_guard
    }

    /// Handle a message posted by the UI
    pub async fn handle_ui_message(&mut self, raw: &str) -> Result<RelayOutcome, SettingsHostError> {
        match UiMessage::parse(raw) {
            UiMessage::Json(payload) => match &self.to_parent_tx {
                Some(tx) => {
                    tracing::debug!(len = payload.len(), "Forwarding UI message to parent");
                    tx.send(payload)
                        .await
                        .map_err(|e| SettingsHostError::channel_send(e.to_string()))?;
                    Ok(RelayOutcome::ForwardedToParent)
                }
                None => {
                    tracing::debug!("Standalone mode, dropping UI message for parent");
                    Ok(RelayOutcome::Dropped)
                }
            },
            UiMessage::Exit => {
                self.emit(HostEvent::DestroyWindow).await?;
                Ok(RelayOutcome::DestroyRequested)
            }
            UiMessage::CancelExit => {
                self.close_guard.cancel();
                Ok(RelayOutcome::CloseCancelled)
            }
            UiMessage::Unrecognized(other) => {
                tracing::debug!(message = %other, "Ignoring unrecognized UI message");
                Ok(RelayOutcome::Ignored)
            }
        }
    }

    /// Pass a message from the parent through to the UI unchanged
    pub async fn deliver_from_parent(&self, message: String) -> Result<(), SettingsHostError> {
        tracing::debug!(len = message.len(), "Delivering parent message to UI");
        self.to_ui_tx
            .send(message)
            .await
            .map_err(|e| SettingsHostError::channel_send(e.to_string()))
    }

    /// Handle a close request on the host window
    pub async fn request_close(
        &mut self,
        ui_attached: bool,
    ) -> Result<CloseDecision, SettingsHostError> {
        let decision = self.close_guard.request_close(ui_attached);
        match decision {
            CloseDecision::AskUi => self.emit(HostEvent::ConfirmClose).await?,
            CloseDecision::Destroy => self.emit(HostEvent::DestroyWindow).await?,
        }
        Ok(decision)
    }

    /// The parent process exited; the host goes with it
    pub async fn parent_terminated(&self) -> Result<(), SettingsHostError> {
        if let Some(args) = self.mode.launch_args() {
            tracing::debug!(pid = args.parent_pid, "Parent process terminated");
        }
        self.emit(HostEvent::DestroyWindow).await
    }

    async fn emit(&self, event: HostEvent) -> Result<(), SettingsHostError> {
        self.host_tx
            .send(event)
            .await
            .map_err(|e| SettingsHostError::channel_closed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launch_args() -> LaunchArgs {
        LaunchArgs {
            executable: "settings.exe".to_string(),
            runner_pipe: r"\\.\pipe\runner".to_string(),
            settings_pipe: r"\\.\pipe\settings".to_string(),
            parent_pid: 4242,
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(SettingsHostErrorCode::InvalidArguments as u32, 8200);
        assert_eq!(SettingsHostErrorCode::ChannelClosed as u32, 8203);
        let err = SettingsHostError::invalid_parent_pid("abc");
        assert_eq!(err.to_string(), "[8201] Invalid parent pid: abc");
    }

    #[test]
    fn test_launch_mode_integrated() {
        let mode = LaunchMode::from_args([
            "settings.exe",
            r"\\.\pipe\runner",
            r"\\.\pipe\settings",
            "4242",
        ])
        .unwrap();
        assert_eq!(mode, LaunchMode::Integrated(launch_args()));
        assert!(mode.is_integrated());
    }

    #[test]
    fn test_launch_mode_standalone() {
        assert_eq!(
            LaunchMode::from_args(["settings.exe"]).unwrap(),
            LaunchMode::Standalone
        );
        assert_eq!(
            LaunchMode::from_args(["settings.exe", "a", "b"]).unwrap(),
            LaunchMode::Standalone
        );
        assert_eq!(
            LaunchMode::from_args(Vec::<String>::new()).unwrap(),
            LaunchMode::Standalone
        );
    }

    #[test]
    fn test_launch_mode_bad_input() {
        let err = LaunchMode::from_args(["settings.exe", "a", "b", "pid"]).unwrap_err();
        assert!(matches!(err, SettingsHostError::InvalidParentPid { .. }));

        let err = LaunchMode::from_args(["settings.exe", "", "b", "1"]).unwrap_err();
        assert!(matches!(err, SettingsHostError::InvalidArguments { .. }));
    }

    #[test]
    fn test_ui_message_parse() {
        assert_eq!(
            UiMessage::parse(r#"{"general":{}}"#),
            UiMessage::Json(r#"{"general":{}}"#.to_string())
        );
        assert_eq!(UiMessage::parse("exit"), UiMessage::Exit);
        assert_eq!(UiMessage::parse("cancel-exit"), UiMessage::CancelExit);
        assert_eq!(
            UiMessage::parse(" exit"),
            UiMessage::Unrecognized(" exit".to_string())
        );
        assert_eq!(UiMessage::parse(""), UiMessage::Unrecognized(String::new()));
    }

    #[test]
    fn test_ui_message_json_value() {
        let message = UiMessage::parse(r#"{"action":"save"}"#);
        assert_eq!(
            message.json_value(),
            Some(serde_json::json!({ "action": "save" }))
        );
        assert_eq!(UiMessage::parse("{broken").json_value(), None);
        assert_eq!(UiMessage::Exit.json_value(), None);
    }

    #[test]
    fn test_close_guard() {
        let mut guard = CloseGuard::new();
        assert_eq!(guard.request_close(true), CloseDecision::AskUi);
        assert!(guard.is_waiting());
        // second close while waiting
        assert_eq!(guard.request_close(true), CloseDecision::Destroy);

        let mut guard = CloseGuard::new();
        guard.request_close(true);
        guard.cancel();
        assert!(!guard.is_waiting());
        assert_eq!(guard.request_close(true), CloseDecision::AskUi);

        let mut guard = CloseGuard::new();
        assert_eq!(guard.request_close(false), CloseDecision::Destroy);
    }

    #[tokio::test]
    async fn test_relay_forwards_json_to_parent() {
        let (parent_tx, mut parent_rx) = mpsc::channel(4);
        let (ui_tx, _ui_rx) = mpsc::channel(4);
        let (host_tx, _host_rx) = mpsc::channel(4);
        let mut relay = SettingsRelay::integrated(launch_args(), parent_tx, ui_tx, host_tx);

        let outcome = relay.handle_ui_message(r#"{"a":1}"#).await.unwrap();
        assert_eq!(outcome, RelayOutcome::ForwardedToParent);
        assert_eq!(parent_rx.recv().await.unwrap(), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_relay_standalone_drops_json() {
        let (ui_tx, _ui_rx) = mpsc::channel(4);
        let (host_tx, mut host_rx) = mpsc::channel(4);
        let mut relay = SettingsRelay::standalone(ui_tx, host_tx);

        let outcome = relay.handle_ui_message(r#"{"a":1}"#).await.unwrap();
        assert_eq!(outcome, RelayOutcome::Dropped);
        assert!(host_rx.try_recv().is_err());
        assert!(!relay.mode().is_integrated());
    }

    #[tokio::test]
    async fn test_relay_close_flow() {
        let (ui_tx, _ui_rx) = mpsc::channel(4);
        let (host_tx, mut host_rx) = mpsc::channel(4);
        let mut relay = SettingsRelay::standalone(ui_tx, host_tx);

        assert_eq!(relay.request_close(true).await.unwrap(), CloseDecision::AskUi);
        assert_eq!(host_rx.recv().await.unwrap(), HostEvent::ConfirmClose);

        assert_eq!(
            relay.handle_ui_message("cancel-exit").await.unwrap(),
            RelayOutcome::CloseCancelled
        );
        assert!(!relay.close_guard().is_waiting());

        assert_eq!(relay.request_close(true).await.unwrap(), CloseDecision::AskUi);
        assert_eq!(host_rx.recv().await.unwrap(), HostEvent::ConfirmClose);
        assert_eq!(
            relay.handle_ui_message("exit").await.unwrap(),
            RelayOutcome::DestroyRequested
        );
        assert_eq!(host_rx.recv().await.unwrap(), HostEvent::DestroyWindow);
    }

    #[tokio::test]
    async fn test_relay_unresponsive_ui_is_destroyed() {
        let (ui_tx, _ui_rx) = mpsc::channel(4);
        let (host_tx, mut host_rx) = mpsc::channel(4);
        let mut relay = SettingsRelay::standalone(ui_tx, host_tx);

        relay.request_close(true).await.unwrap();
        assert_eq!(host_rx.recv().await.unwrap(), HostEvent::ConfirmClose);
        assert_eq!(relay.request_close(true).await.unwrap(), CloseDecision::Destroy);
        assert_eq!(host_rx.recv().await.unwrap(), HostEvent::DestroyWindow);
    }

    #[tokio::test]
    async fn test_relay_parent_messages_and_termination() {
        let (parent_tx, _parent_rx) = mpsc::channel(4);
        let (ui_tx, mut ui_rx) = mpsc::channel(4);
        let (host_tx, mut host_rx) = mpsc::channel(4);
        let relay = SettingsRelay::integrated(launch_args(), parent_tx, ui_tx, host_tx);

        relay
            .deliver_from_parent(r#"{"refresh":true}"#.to_string())
            .await
            .unwrap();
        assert_eq!(ui_rx.recv().await.unwrap(), r#"{"refresh":true}"#);

        relay.parent_terminated().await.unwrap();
        assert_eq!(host_rx.recv().await.unwrap(), HostEvent::DestroyWindow);
    }

    #[tokio::test]
    async fn test_relay_unrecognized_and_closed_channels() {
        let (parent_tx, parent_rx) = mpsc::channel(4);
        let (ui_tx, _ui_rx) = mpsc::channel(4);
        let (host_tx, host_rx) = mpsc::channel(4);
        let mut relay = SettingsRelay::integrated(launch_args(), parent_tx, ui_tx, host_tx);

        assert_eq!(
            relay.handle_ui_message("hello").await.unwrap(),
            RelayOutcome::Ignored
        );

        drop(parent_rx);
        let err = relay.handle_ui_message("{}").await.unwrap_err();
        assert!(matches!(err, SettingsHostError::ChannelSend { .. }));

        drop(host_rx);
        let err = relay.handle_ui_message("exit").await.unwrap_err();
        assert!(matches!(err, SettingsHostError::ChannelClosed { .. }));
    }
}
