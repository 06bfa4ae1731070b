//! # Conclave
//!
//! Multi-agent consensus orchestration - the deliberating assembly.
//!
//! This crate coordinates independent AI-backed agents that each answer
//! the same prompt, then reconciles their answers into one outcome per
//! agent identity.
//!
//! ## Architecture
//!
//! ```text
//!                         ┌──────────────────────────────┐
//!   caller ── prompt ───▶ │         ORCHESTRATOR         │
//!                         │  fixed service agents +      │
//!                         │  caller-supplied agents      │
//!                         └──────┬───────────┬───────────┘
//!                                │ round 1   │ round N
//!                                ▼           ▼
//!                         ┌───────────┐ ┌───────────┐
//!                         │ResponseSet│…│ResponseSet│
//!                         └─────┬─────┘ └─────┬─────┘
//!                               └──────┬──────┘
//!                                      ▼
//!                            ┌──────────────────┐
//!                            │    AGGREGATOR    │  max confidence,
//!                            │ ConsensusResult  │  later round wins ties
//!                            └──────────────────┘
//! ```
//!
//! ## Key Concepts
//!
//! - **Agent**: a uniform request-response capability, backed by either
//!   a fixed external service or a caller-supplied implementation
//! - **Round**: one complete invocation of all agents in an
//!   orchestration call, yielding one [`ResponseSet`]
//! - **Consensus**: the confidence-ranked merge of multiple rounds into
//!   one [`ConsensusResult`]
//! - **Turn order**: the protocol invoking agents strictly in sequence,
//!   each potentially informed by the prior agents' answers
//!
//! Failures of individual agents never abort a round: the failing
//! agent's entry is substituted with a zero-confidence placeholder and
//! an [`ErrorRecord`] is emitted on the out-of-band event channel.

pub mod agent;
pub mod aggregator;
pub mod channel;
pub mod context;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod protocol;
pub mod registry;
pub mod service;

pub use agent::AgentCapability;
pub use aggregator::aggregate;
pub use channel::{EventChannel, EventSender, OrchestratorEvent};
pub use error::{
    ConclaveError, ErrorKind, ErrorRecord, RecoveryAction, RecoveryActionType, RecoveryResult,
    RecoveryStatus,
};
pub use orchestrator::Orchestrator;
pub use protocol::{
    AgentCategory, AgentMessage, ConsensusResult, ConversationMode, Request, Response, ResponseSet,
};
pub use registry::{AgentConfig, AgentPriority, AgentRegistry};
pub use service::{AiService, ServiceAgent, ServiceReply, DEFAULT_CONFIDENCE};

// Re-export boundary record types used at the context/memory seam
pub use context::{ContextChain, ContextChainResult, ContextNode, ContextQuery};
pub use memory::{MemoryItem, MemoryQuery, MemoryRetrievalResult, MemoryStore};
