//! Context chain boundary records
//!
//! A context chain is the conversational history the orchestrator seeds
//! requests from. The orchestrator reads `current_context` and
//! `per_agent_context`, and may append one node per round; chain
//! persistence belongs to an external collaborator.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::memory::MemoryItem;
use crate::protocol::ResponseSet;

/// Seed-map key the orchestrator reads the shared context from
pub const CONTEXT_KEY: &str = "context";
/// Seed-map key carrying the most recent agent output
pub const LATEST_INPUT_KEY: &str = "latestInput";

/// One step in a context chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextNode {
    pub id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Identity of the agent that produced this step
    pub agent: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub relevance: f32,
    pub confidence: f32,
}

impl ContextNode {
    pub fn new(agent: impl Into<String>, content: impl Into<String>, confidence: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            timestamp: Utc::now(),
            agent: agent.into(),
            metadata: HashMap::new(),
            relevance: 0.0,
            confidence,
        }
    }
}

/// Ordered history of context evolution for one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChain {
    pub id: Uuid,
    pub root_context: String,
    pub current_context: String,
    #[serde(default)]
    pub history: Vec<ContextNode>,
    #[serde(default)]
    pub related_memories: Vec<MemoryItem>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub priority: f32,
    pub relevance_score: f32,
    pub last_updated: DateTime<Utc>,
    /// Context overrides per agent identity
    #[serde(default)]
    pub per_agent_context: HashMap<String, String>,
}

impl ContextChain {
    pub fn new(root_context: impl Into<String>) -> Self {
        let root = root_context.into();
        Self {
            id: Uuid::new_v4(),
            current_context: root.clone(),
            root_context: root,
            history: Vec::new(),
            related_memories: Vec::new(),
            metadata: HashMap::new(),
            priority: 0.5,
            relevance_score: 0.0,
            last_updated: Utc::now(),
            per_agent_context: HashMap::new(),
        }
    }

    /// Context an individual agent should be seeded with
    ///
    /// Falls back to the shared current context when the agent has no
    /// dedicated entry.
    pub fn context_for(&self, agent: &str) -> &str {
        self.per_agent_context
            .get(agent)
            .map(String::as_str)
            .unwrap_or(&self.current_context)
    }

    /// Append a step and advance the current context to its content
    pub fn advance(&mut self, agent: &str, content: &str, confidence: f32) {
        self.history
            .push(ContextNode::new(agent, content, confidence));
        self.current_context = content.to_string();
        self.last_updated = Utc::now();
    }

    /// Append one node summarizing a completed orchestration round
    ///
    /// The node carries the last response of the round, matching the
    /// turn-order convention that the latest speaker defines the
    /// current context.
    pub fn record_round(&mut self, round: &ResponseSet) {
        if let Some((name, response)) = round.iter().last() {
            let name = name.to_string();
            self.advance(&name, response.content(), response.confidence());
        }
    }

    /// Build the orchestrator seed map from this chain
    ///
    /// Chain metadata is carried through untouched; the shared context
    /// rides under [`CONTEXT_KEY`].
    pub fn to_seed(&self) -> HashMap<String, String> {
        let mut seed = self.metadata.clone();
        seed.insert(CONTEXT_KEY.to_string(), self.current_context.clone());
        seed
    }
}

/// Retrieval parameters for external chain lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextQuery {
    pub query: String,
    pub context: Option<String>,
    pub max_chain_length: usize,
    pub min_relevance: f32,
    #[serde(default)]
    pub agent_filter: Vec<String>,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub include_memories: bool,
}

impl ContextQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: None,
            max_chain_length: 10,
            min_relevance: 0.6,
            agent_filter: Vec::new(),
            time_range: None,
            include_memories: true,
        }
    }
}

/// Chain lookup result produced by the external collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChainResult {
    pub chain: ContextChain,
    pub related_chains: Vec<ContextChain>,
    pub query: ContextQuery,
}
