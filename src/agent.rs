//! Agent capability abstraction - the uniform request-response seam

use std::collections::HashMap;

use async_trait::async_trait;

use crate::protocol::{AgentCategory, Request, Response};

/// A unit offering a uniform request-response capability
///
/// Two families implement this trait: fixed service-backed agents that
/// wrap one backing AI service and live for the orchestrator's
/// configuration lifetime, and ad-hoc agents supplied by the caller for
/// a single orchestration call. Fixed agents are shared by `Arc` across
/// concurrent calls and must therefore be safe for concurrent
/// invocation.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    /// Stable identity; the join key for responses across rounds
    fn name(&self) -> &str;

    /// Optional service classification
    fn category(&self) -> Option<AgentCategory> {
        None
    }

    /// Answer a single request
    ///
    /// Timeout enforcement belongs to the implementation; the
    /// orchestrator treats a timed-out call like any other failure.
    async fn respond(&self, request: &Request) -> anyhow::Result<Response>;

    /// Accept a broadcast context update
    ///
    /// Default is a no-op; agents that keep their own context state
    /// override this to receive shared context pushed by the
    /// orchestrator.
    fn share_context(&self, _context: &HashMap<String, String>) {}
}
