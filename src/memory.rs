//! Memory boundary records and the external store seam
//!
//! The orchestrator consumes memory items read-only for context
//! enrichment; storage format and retrieval ranking live behind
//! [`MemoryStore`] and are owned elsewhere.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One remembered fact attributed to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Identity of the agent this memory belongs to
    pub agent: String,
    pub context: Option<String>,
    pub priority: f32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl MemoryItem {
    pub fn new(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            timestamp: Utc::now(),
            agent: agent.into(),
            context: None,
            priority: 0.5,
            tags: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: f32) -> Self {
        self.priority = priority;
        self
    }
}

/// Retrieval parameters for the external memory store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryQuery {
    pub query: String,
    pub context: Option<String>,
    pub max_results: usize,
    pub min_similarity: f32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    #[serde(default)]
    pub agent_filter: Vec<String>,
}

impl MemoryQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: None,
            max_results: 5,
            min_similarity: 0.7,
            tags: Vec::new(),
            time_range: None,
            agent_filter: Vec::new(),
        }
    }
}

/// Result page returned by the external memory store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRetrievalResult {
    pub items: Vec<MemoryItem>,
    /// Total matches, which may exceed `items.len()`
    pub total: usize,
    pub query: MemoryQuery,
}

/// External memory store seam
///
/// The core only queries and inserts; persistence, indexing and
/// similarity ranking are the store's business.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn query(&self, query: &MemoryQuery) -> anyhow::Result<MemoryRetrievalResult>;

    async fn insert(&self, item: MemoryItem) -> anyhow::Result<()>;
}
