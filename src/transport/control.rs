//! Duplex control channel to the remote coordinator.
//!
//! The channel dials out, bridges inbound command envelopes into the
//! orchestrator's command channel, and forwards orchestrator events
//! back over the socket. It reconnects forever on a fixed delay — no
//! backoff, no retry cap — and a bad inbound frame never tears the
//! connection down.
//!
//! # Connection Flow
//!
//! 1. Dial the coordinator WebSocket URL
//! 2. On open, inject a `STATUS` command so the resulting
//!    `STATUS_UPDATE` announces presence
//! 3. Pump frames both ways until the socket drops
//! 4. Sleep the reconnect delay, go to 1
//!
//! The loop ends only when the orchestrator side hangs up (command
//! receiver or event sender gone) — a lost coordinator is routine, a
//! gone orchestrator means shutdown.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use crate::protocol::{Command, Inbound, OutboundEvent, decode_inbound};

// ============================================================================
// Constants
// ============================================================================

/// Fixed delay between reconnection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why one connection's pump loop ended.
enum PumpEnd {
    /// Socket closed or errored; reconnect.
    Disconnected,
    /// Orchestrator endpoints gone; shut the channel down.
    AgentGone,
}

// ============================================================================
// ControlChannel
// ============================================================================

/// Persistent duplex client for the coordinator socket.
pub struct ControlChannel {
    url: String,
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<OutboundEvent>,
    reconnect_delay: Duration,
}

impl ControlChannel {
    /// Creates a channel that will dial `url`.
    ///
    /// `commands` feeds the orchestrator; `events` drains it.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        commands: mpsc::UnboundedSender<Command>,
        events: mpsc::UnboundedReceiver<OutboundEvent>,
    ) -> Self {
        Self {
            url: url.into(),
            commands,
            events,
            reconnect_delay: RECONNECT_DELAY,
        }
    }

    /// Overrides the reconnect delay (tests use milliseconds).
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Coordinator URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Runs the connect/pump/reconnect loop.
    ///
    /// Returns only when the orchestrator side is gone.
    pub async fn run(mut self) {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((socket, _response)) => {
                    info!(url = %self.url, "control channel connected");

                    if let PumpEnd::AgentGone = self.pump(socket).await {
                        debug!("orchestrator gone; control channel shutting down");
                        return;
                    }

                    info!(
                        delay_ms = self.reconnect_delay.as_millis() as u64,
                        "control channel disconnected; will reconnect"
                    );
                }
                Err(err) => {
                    warn!(url = %self.url, error = %err, "control channel connect failed");
                }
            }

            sleep(self.reconnect_delay).await;
        }
    }

    /// Pumps one live connection until it drops.
    async fn pump(&mut self, socket: WsStream) -> PumpEnd {
        let (mut ws_write, mut ws_read) = socket.split();

        // Presence announcement: ask the orchestrator for a snapshot so
        // the coordinator sees a STATUS_UPDATE the moment we attach.
        if self.commands.send(Command::Status).is_err() {
            return PumpEnd::AgentGone;
        }

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            if !self.handle_frame(&text) {
                                return PumpEnd::AgentGone;
                            }
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("socket closed by coordinator");
                            return PumpEnd::Disconnected;
                        }

                        Some(Err(err)) => {
                            warn!(error = %err, "socket error");
                            return PumpEnd::Disconnected;
                        }

                        None => {
                            debug!("socket stream ended");
                            return PumpEnd::Disconnected;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                event = self.events.recv() => {
                    let Some(event) = event else {
                        return PumpEnd::AgentGone;
                    };

                    let frame = match event.encode() {
                        Ok(frame) => frame,
                        Err(err) => {
                            warn!(error = %err, "event serialization failed; dropped");
                            continue;
                        }
                    };

                    trace!(event = event.name(), "event forwarded");
                    if let Err(err) = ws_write.send(Message::Text(frame.into())).await {
                        warn!(error = %err, "event send failed");
                        return PumpEnd::Disconnected;
                    }
                }
            }
        }
    }

    /// Decodes and routes one inbound frame.
    ///
    /// Returns `false` when the orchestrator's command channel is gone.
    fn handle_frame(&self, text: &str) -> bool {
        match decode_inbound(text) {
            Inbound::Command(command) => {
                trace!(command = command.name(), "command routed");
                self.commands.send(command).is_ok()
            }
            Inbound::Unrecognized(kind) => {
                // Silent per protocol; trace only for diagnostics.
                trace!(kind = %kind, "unrecognized envelope ignored");
                true
            }
            Inbound::Malformed(detail) => {
                // Logged and swallowed: a bad frame never closes the
                // connection, and fire-and-forget has no error reply.
                warn!(detail = %detail, "malformed inbound frame ignored");
                true
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(RECONNECT_DELAY.as_millis(), 3000);
    }

    #[test]
    fn test_channel_config() {
        let (command_tx, _command_rx) = mpsc::unbounded_channel();
        let (_event_tx, event_rx) = mpsc::unbounded_channel();

        let channel = ControlChannel::new("ws://127.0.0.1:9000", command_tx, event_rx)
            .with_reconnect_delay(Duration::from_millis(50));

        assert_eq!(channel.url(), "ws://127.0.0.1:9000");
        assert_eq!(channel.reconnect_delay.as_millis(), 50);
    }

    #[test]
    fn test_handle_frame_routes_commands() {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let (_event_tx, event_rx) = mpsc::unbounded_channel();
        let channel = ControlChannel::new("ws://unused", command_tx, event_rx);

        assert!(channel.handle_frame(r#"{"type":"START"}"#));
        assert_eq!(command_rx.try_recv().ok(), Some(Command::Start));
    }

    #[test]
    fn test_handle_frame_swallows_garbage() {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let (_event_tx, event_rx) = mpsc::unbounded_channel();
        let channel = ControlChannel::new("ws://unused", command_tx, event_rx);

        // Malformed and unrecognized frames are survivable and route
        // nothing.
        assert!(channel.handle_frame("{broken"));
        assert!(channel.handle_frame(r#"{"type":"SELF_DESTRUCT"}"#));
        assert!(command_rx.try_recv().is_err());
    }

    #[test]
    fn test_handle_frame_reports_agent_gone() {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (_event_tx, event_rx) = mpsc::unbounded_channel();
        let channel = ControlChannel::new("ws://unused", command_tx, event_rx);

        drop(command_rx);
        assert!(!channel.handle_frame(r#"{"type":"STOP"}"#));
    }
}
