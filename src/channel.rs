//! Out-of-band event channel for orchestration observers
//!
//! Per-agent failures never fail a round; they surface here instead,
//! alongside round lifecycle notifications. Dropping the observer end
//! must never disturb an orchestration in flight.

use tokio::sync::mpsc;

use crate::error::ErrorRecord;
use crate::protocol::ConversationMode;

/// Events emitted by the orchestrator during a round
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// A round began
    RoundStarted {
        mode: ConversationMode,
        participants: usize,
    },
    /// An agent answered
    AgentResponded { agent: String, confidence: f32 },
    /// An agent invocation failed and was substituted with a
    /// zero-confidence placeholder
    AgentFailed { record: ErrorRecord },
    /// A round finished with this many recorded responses
    RoundCompleted { responses: usize },
    /// The call was cancelled between agent invocations; the partial
    /// result holds this many responses
    Cancelled { completed: usize },
}

/// Sender half handed to the orchestrator
pub type EventSender = mpsc::UnboundedSender<OrchestratorEvent>;

/// Observer-side receiver for orchestration events
///
/// Owns the receiving half outright; a single observer drains it
/// through `&mut self`, so `recv` stays `Send` and never parks other
/// threads behind a lock.
pub struct EventChannel {
    rx: mpsc::UnboundedReceiver<OrchestratorEvent>,
}

impl EventChannel {
    /// Create a channel pair
    ///
    /// The sender goes to the orchestrator, the returned channel to the
    /// observer.
    pub fn new() -> (Self, EventSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Option<OrchestratorEvent> {
        self.rx.try_recv().ok()
    }

    /// Receive the next event, waiting for one to arrive
    pub async fn recv(&mut self) -> Option<OrchestratorEvent> {
        self.rx.recv().await
    }

    /// Drain everything currently queued
    pub fn drain(&mut self) -> Vec<OrchestratorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
