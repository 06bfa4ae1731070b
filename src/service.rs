//! Backing AI service adapters
//!
//! A fixed service agent wraps exactly one backing service and adapts
//! its native request/response shape to the uniform
//! [`Request`](crate::protocol::Request) -> [`Response`] contract.

use async_trait::async_trait;
use tracing::debug;

use crate::agent::AgentCapability;
use crate::protocol::{AgentCategory, Request, Response};

/// Confidence assigned when a backing service reports no quality signal
///
/// Substituting a fixed default instead of omitting the field keeps the
/// aggregator's ranking well-defined for every response.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Native reply shape of a backing AI service
#[derive(Debug, Clone)]
pub struct ServiceReply {
    pub text: String,
    /// Native quality signal in `[0, 1]`; `None` when the backend has
    /// no such notion.
    pub quality: Option<f32>,
}

impl ServiceReply {
    pub fn new(text: impl Into<String>, quality: Option<f32>) -> Self {
        Self {
            text: text.into(),
            quality,
        }
    }
}

/// A backing AI service, opaque to the orchestrator
///
/// Implementations hold the model connection and are shared by
/// reference across concurrent orchestration calls, so they must not
/// mutate unsynchronized state inside `generate`.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Service name, used as the wrapping agent's identity
    fn name(&self) -> &str;

    /// Service classification
    fn category(&self) -> AgentCategory;

    /// Produce a completion for the given prompt and context
    async fn generate(&self, prompt: &str, context: &str) -> anyhow::Result<ServiceReply>;
}

/// Fixed agent wrapping exactly one backing service
pub struct ServiceAgent<S: AiService> {
    service: S,
}

impl<S: AiService> ServiceAgent<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

#[async_trait]
impl<S: AiService> AgentCapability for ServiceAgent<S> {
    fn name(&self) -> &str {
        self.service.name()
    }

    fn category(&self) -> Option<AgentCategory> {
        Some(self.service.category())
    }

    async fn respond(&self, request: &Request) -> anyhow::Result<Response> {
        let reply = self
            .service
            .generate(&request.query, &request.context)
            .await?;
        let confidence = reply.quality.unwrap_or(DEFAULT_CONFIDENCE);

        debug!(
            service = %self.service.name(),
            confidence = confidence,
            "Service reply adapted"
        );

        Ok(Response::new(reply.text, confidence))
    }
}
