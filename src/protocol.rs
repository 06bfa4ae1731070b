//! Core protocol types shared by the orchestration and consensus layers

use std::collections::{HashMap, HashSet};
use std::ops::{Deref, Index};

use chrono::{DateTime, Utc};
use serde::de;
use serde::{Deserialize, Serialize};

/// Classification of a fixed service agent
///
/// The set of classes is owned by the surrounding system; ad-hoc agents
/// usually carry no category at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentCategory {
    /// Coordinates the other agents and synthesizes final answers
    Coordinator,
    /// Security analysis
    Security,
    /// Creative generation
    Creative,
    /// State management and context chaining
    StateManager,
    /// Everything registered at runtime
    Auxiliary,
}

/// Interaction protocol for one orchestration round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConversationMode {
    /// Agents answer strictly in sequence; each later agent sees the
    /// accumulated output of earlier agents in the same round.
    #[default]
    TurnOrder,
    /// All agents answer the same seeded request concurrently with no
    /// cross-agent visibility.
    FreeForm,
}

/// A single request put to an agent
///
/// Built per call by the orchestrator from the prompt and the seed
/// context; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub query: String,
    pub context: String,
}

impl Request {
    pub fn new(query: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: context.into(),
        }
    }
}

/// An agent's answer to a single request
///
/// Immutable once produced. Confidence is always within `[0, 1]`; the
/// constructor clamps out-of-range values so downstream ranking never
/// sees an invalid score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    content: String,
    confidence: f32,
}

impl Response {
    pub fn new(content: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            content: content.into(),
            confidence,
        }
    }

    /// Zero-confidence placeholder substituted when an agent invocation
    /// fails mid-round.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            confidence: 0.0,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Identity-keyed responses from one orchestration round
///
/// Lookup is by agent identity; iteration preserves first-invocation
/// order. Inserting an identity that is already present overwrites the
/// stored response in place without changing its position, so duplicate
/// invocations resolve last-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseSet {
    order: Vec<String>,
    entries: HashMap<String, Response>,
}

/// Deserialization re-establishes the order/entries pairing: `order`
/// must name each entry exactly once, otherwise the document is
/// rejected.
impl<'de> Deserialize<'de> for ResponseSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            order: Vec<String>,
            entries: HashMap<String, Response>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut seen = HashSet::with_capacity(raw.order.len());
        for name in &raw.order {
            if !raw.entries.contains_key(name) {
                return Err(de::Error::custom(format!(
                    "order names missing entry `{name}`"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(de::Error::custom(format!("duplicate order entry `{name}`")));
            }
        }
        if raw.order.len() != raw.entries.len() {
            return Err(de::Error::custom("entries not covered by order"));
        }

        Ok(Self {
            order: raw.order,
            entries: raw.entries,
        })
    }
}

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a response, returning the previous one for the same
    /// identity if any.
    pub fn insert(&mut self, name: impl Into<String>, response: Response) -> Option<Response> {
        let name = name.into();
        let previous = self.entries.insert(name.clone(), response);
        if previous.is_none() {
            self.order.push(name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Response> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Agent identities in invocation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Entries in invocation order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Response)> {
        self.order.iter().map(move |name| {
            let response = &self.entries[name];
            (name.as_str(), response)
        })
    }
}

impl Index<&str> for ResponseSet {
    type Output = Response;

    fn index(&self, name: &str) -> &Response {
        &self.entries[name]
    }
}

/// The best response observed per agent identity across rounds
///
/// Same shape as [`ResponseSet`] but only ever derived by the
/// aggregator; it cannot be built directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    inner: ResponseSet,
}

impl ConsensusResult {
    pub(crate) fn new(inner: ResponseSet) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> ResponseSet {
        self.inner
    }
}

impl Deref for ConsensusResult {
    type Target = ResponseSet;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl PartialEq<ResponseSet> for ConsensusResult {
    fn eq(&self, other: &ResponseSet) -> bool {
        self.inner == *other
    }
}

/// One agent utterance as surfaced to callers of `process_query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub content: String,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: f32,
}

impl AgentMessage {
    pub fn new(sender: impl Into<String>, content: impl Into<String>, confidence: f32) -> Self {
        Self {
            content: content.into(),
            sender: sender.into(),
            timestamp: Utc::now(),
            confidence,
        }
    }
}
