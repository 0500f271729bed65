//! Channels between the UI thread and the agent thread.
//!
//! `inbound` carries [`ControlSignal`]s from the UI to the session and
//! `outbound` carries [`OutboundEvent`]s back. Both are unbounded FIFO
//! channels: nothing is reordered, coalesced or dropped. The UI never
//! blocks on the agent; it drains `outbound` on a timer with [`UiEndpoint::drain`].

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Instruction from the UI to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSignal {
    /// Run a turn for this user text.
    Continue(String),
    /// Start a fresh conversation.
    Reset,
    /// End the session.
    Exit,
}

/// Who a displayed message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    System,
    User,
    Assistant,
}

impl Sender {
    /// Tag shown next to the message in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Sender::System => "System",
            Sender::User => "You",
            Sender::Assistant => "AI",
        }
    }
}

/// Event from the session to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    Message { sender: Sender, text: String },
    /// The session has terminated and the UI should close.
    Exit,
}

/// Receiving half of `inbound`, owned by the session.
pub type InboundReceiver = UnboundedReceiver<ControlSignal>;

/// Sending half of `outbound`, owned by the session.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    tx: UnboundedSender<OutboundEvent>,
}

impl OutboundSender {
    pub fn emit(&self, event: OutboundEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("ui endpoint dropped; outbound event discarded");
        }
    }

    pub fn message(&self, sender: Sender, text: impl Into<String>) {
        self.emit(OutboundEvent::Message {
            sender,
            text: text.into(),
        });
    }
}

/// Result of one non-blocking drain of `outbound`.
#[derive(Debug, Default)]
pub struct Drained {
    pub events: Vec<OutboundEvent>,
    /// The agent side has gone away and no more events will arrive.
    pub agent_gone: bool,
}

/// The UI thread's ends of both channels.
pub struct UiEndpoint {
    inbound: UnboundedSender<ControlSignal>,
    outbound: UnboundedReceiver<OutboundEvent>,
}

impl UiEndpoint {
    /// Queues a signal for the session. Returns `false` when the session
    /// is no longer listening.
    pub fn send(&self, signal: ControlSignal) -> bool {
        self.inbound.send(signal).is_ok()
    }

    /// Takes every event currently queued, without waiting.
    pub fn drain(&mut self) -> Drained {
        let mut drained = Drained::default();
        loop {
            match self.outbound.try_recv() {
                Ok(event) => drained.events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    drained.agent_gone = true;
                    break;
                }
            }
        }
        drained
    }
}

/// The agent thread's ends of both channels.
pub struct AgentEndpoint {
    inbound: InboundReceiver,
    outbound: OutboundSender,
}

impl AgentEndpoint {
    pub fn into_parts(self) -> (InboundReceiver, OutboundSender) {
        (self.inbound, self.outbound)
    }
}

/// Creates the channel pair.
pub fn channels() -> (UiEndpoint, AgentEndpoint) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    (
        UiEndpoint {
            inbound: in_tx,
            outbound: out_rx,
        },
        AgentEndpoint {
            inbound: in_rx,
            outbound: OutboundSender { tx: out_tx },
        },
    )
}
