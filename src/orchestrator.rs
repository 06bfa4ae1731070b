//! Conversation orchestrator - drives agents through interaction rounds
//!
//! One orchestration call runs every participating agent once under the
//! selected [`ConversationMode`] and yields an identity-keyed
//! [`ResponseSet`]. A failing agent never aborts the round: its entry is
//! substituted with a zero-confidence placeholder and the failure is
//! reported out-of-band on the event channel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::agent::AgentCapability;
use crate::aggregator::aggregate;
use crate::channel::{EventChannel, EventSender, OrchestratorEvent};
use crate::context::LATEST_INPUT_KEY;
use crate::error::{ConclaveError, ErrorKind, ErrorRecord};
use crate::memory::{MemoryQuery, MemoryStore};
use crate::protocol::{
    AgentMessage, ConsensusResult, ConversationMode, Request, Response, ResponseSet,
};
use crate::registry::{AgentConfig, AgentRegistry};

/// Sender identity of the synthesized final message in `process_query`
pub const COORDINATOR_NAME: &str = "conclave";

/// Seed-map key under which recalled memories are threaded into requests
pub const MEMORIES_KEY: &str = "memories";

/// The conclave orchestrator
///
/// Holds the long-lived fixed service agents injected at construction;
/// everything per-call (seed context, ad-hoc agents, prompt) arrives as
/// arguments, so concurrent calls against the same orchestrator are
/// safe.
pub struct Orchestrator {
    /// Fixed service agents, shared across calls
    fixed: Vec<Arc<dyn AgentCapability>>,
    /// Names of fixed agents currently participating in `process_query`
    active: RwLock<HashSet<String>>,
    /// Dynamically registered agents by name
    registered: RwLock<HashMap<String, Arc<dyn AgentCapability>>>,
    /// Configuration registry
    registry: AgentRegistry,
    /// Optional external memory store for context enrichment
    memory: Option<Arc<dyn MemoryStore>>,
    /// Completed consensus rounds
    history: RwLock<Vec<ResponseSet>>,
    /// Out-of-band event sender
    event_tx: Option<EventSender>,
}

impl Orchestrator {
    /// Create an orchestrator over the given fixed service agents
    pub fn new(fixed: Vec<Arc<dyn AgentCapability>>) -> Self {
        let masters = fixed
            .iter()
            .map(|agent| {
                AgentConfig::new(
                    agent.name(),
                    agent
                        .category()
                        .unwrap_or(crate::protocol::AgentCategory::Auxiliary),
                )
            })
            .collect();
        let active = fixed.iter().map(|agent| agent.name().to_string()).collect();

        info!(fixed = fixed.len(), "Creating orchestrator");

        Self {
            fixed,
            active: RwLock::new(active),
            registered: RwLock::new(HashMap::new()),
            registry: AgentRegistry::new(masters),
            memory: None,
            history: RwLock::new(Vec::new()),
            event_tx: None,
        }
    }

    /// Create an orchestrator and an observer channel for its events
    pub fn with_channel(fixed: Vec<Arc<dyn AgentCapability>>) -> (Self, EventChannel) {
        let (channel, tx) = EventChannel::new();
        let mut orchestrator = Self::new(fixed);
        orchestrator.event_tx = Some(tx);
        (orchestrator, channel)
    }

    /// Attach an external memory store used to enrich query context
    pub fn with_memory_store(mut self, store: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(store);
        self
    }

    /// Run one interaction round over the given agents
    ///
    /// Every agent receives the same seed; under
    /// [`ConversationMode::TurnOrder`] each later agent additionally
    /// sees the previous agent's output under the `latestInput` seed
    /// key. Duplicate identities resolve last-write-wins in the result.
    /// An empty agent list yields an empty set.
    pub async fn participate(
        &self,
        seed: &HashMap<String, String>,
        agents: &[Arc<dyn AgentCapability>],
        prompt: &str,
        mode: ConversationMode,
    ) -> Result<ResponseSet, ConclaveError> {
        self.participate_with_cancellation(seed, agents, prompt, mode, &CancellationToken::new())
            .await
    }

    /// [`participate`](Self::participate) with cooperative cancellation
    ///
    /// Cancellation is honored between agent invocations: the responses
    /// collected so far come back as a partial set and no further
    /// agents run.
    #[instrument(skip_all, fields(mode = ?mode, participants = agents.len()))]
    pub async fn participate_with_cancellation(
        &self,
        seed: &HashMap<String, String>,
        agents: &[Arc<dyn AgentCapability>],
        prompt: &str,
        mode: ConversationMode,
        cancel: &CancellationToken,
    ) -> Result<ResponseSet, ConclaveError> {
        self.emit(OrchestratorEvent::RoundStarted {
            mode,
            participants: agents.len(),
        });

        let query = resolve_query(prompt, seed);
        let responses = match mode {
            ConversationMode::TurnOrder => {
                self.run_turn_order(seed, agents, &query, cancel).await
            }
            ConversationMode::FreeForm => self.run_free_form(seed, agents, &query, cancel).await,
        };

        debug!(responses = responses.len(), "Round finished");
        Ok(responses)
    }

    /// Strictly sequential turn-taking: invocation i+1 does not start
    /// until invocation i has completed.
    async fn run_turn_order(
        &self,
        seed: &HashMap<String, String>,
        agents: &[Arc<dyn AgentCapability>],
        query: &str,
        cancel: &CancellationToken,
    ) -> ResponseSet {
        let mut responses = ResponseSet::new();
        let mut working = seed.clone();

        for agent in agents {
            if cancel.is_cancelled() {
                warn!(completed = responses.len(), "Round cancelled between invocations");
                self.emit(OrchestratorEvent::Cancelled {
                    completed: responses.len(),
                });
                return responses;
            }

            let request = Request::new(query, render_seed(&working));
            match agent.respond(&request).await {
                Ok(response) => {
                    debug!(
                        agent = %agent.name(),
                        confidence = response.confidence(),
                        "Agent responded"
                    );
                    self.emit(OrchestratorEvent::AgentResponded {
                        agent: agent.name().to_string(),
                        confidence: response.confidence(),
                    });
                    working.insert(LATEST_INPUT_KEY.to_string(), response.content().to_string());
                    responses.insert(agent.name(), response);
                }
                Err(error) => {
                    let placeholder = self.substitute_failure(agent.name(), &request, &error);
                    responses.insert(agent.name(), placeholder);
                }
            }
        }

        self.emit(OrchestratorEvent::RoundCompleted {
            responses: responses.len(),
        });
        responses
    }

    /// Concurrent fan-out: every agent answers the identical seeded
    /// request with no cross-agent visibility. Result entries follow
    /// the caller-supplied agent order. Cancellation is checked once,
    /// before the fan-out; a launched round runs to completion.
    async fn run_free_form(
        &self,
        seed: &HashMap<String, String>,
        agents: &[Arc<dyn AgentCapability>],
        query: &str,
        cancel: &CancellationToken,
    ) -> ResponseSet {
        let mut responses = ResponseSet::new();

        if cancel.is_cancelled() {
            self.emit(OrchestratorEvent::Cancelled { completed: 0 });
            return responses;
        }

        let request = Request::new(query, render_seed(seed));
        let invocations = agents.iter().map(|agent| {
            let agent = Arc::clone(agent);
            let request = request.clone();
            async move {
                let outcome = agent.respond(&request).await;
                (agent, outcome)
            }
        });

        for (agent, outcome) in join_all(invocations).await {
            match outcome {
                Ok(response) => {
                    self.emit(OrchestratorEvent::AgentResponded {
                        agent: agent.name().to_string(),
                        confidence: response.confidence(),
                    });
                    responses.insert(agent.name(), response);
                }
                Err(error) => {
                    let placeholder = self.substitute_failure(agent.name(), &request, &error);
                    responses.insert(agent.name(), placeholder);
                }
            }
        }

        self.emit(OrchestratorEvent::RoundCompleted {
            responses: responses.len(),
        });
        responses
    }

    /// Record a failure out-of-band and produce the placeholder that
    /// keeps the failing agent's identity in the result.
    fn substitute_failure(
        &self,
        agent: &str,
        request: &Request,
        error: &anyhow::Error,
    ) -> Response {
        warn!(agent = %agent, error = %error, "Agent invocation failed, substituting placeholder");
        self.emit(OrchestratorEvent::AgentFailed {
            record: ErrorRecord::new(
                agent,
                ErrorKind::Processing,
                error.to_string(),
                request.context.clone(),
            ),
        });
        Response::error(format!("Error: {error}"))
    }

    /// Broadcast-then-vote consensus: run `rounds` turn-order rounds
    /// over the same agents and merge them by confidence
    ///
    /// Each completed round is appended to the history.
    #[instrument(skip_all, fields(rounds = rounds, participants = agents.len()))]
    pub async fn converse(
        &self,
        seed: &HashMap<String, String>,
        agents: &[Arc<dyn AgentCapability>],
        prompt: &str,
        rounds: usize,
    ) -> Result<ConsensusResult, ConclaveError> {
        if rounds == 0 {
            return Err(ConclaveError::InvalidArgument(
                "consensus requires at least one round".to_string(),
            ));
        }

        let mut collected = Vec::with_capacity(rounds);
        for round in 0..rounds {
            debug!(round, "Starting consensus round");
            let set = self
                .participate(seed, agents, prompt, ConversationMode::TurnOrder)
                .await?;
            self.history.write().push(set.clone());
            collected.push(set);
        }

        Ok(aggregate(&collected))
    }

    /// Put one query to the active fixed agents in turn order and
    /// append a synthesized coordinator message
    ///
    /// The final message joins every agent's content and carries the
    /// mean of their confidences. When a memory store is attached, the
    /// query is enriched with recalled memories first; recall failures
    /// are logged and ignored.
    #[instrument(skip(self))]
    pub async fn process_query(&self, prompt: &str) -> Result<Vec<AgentMessage>, ConclaveError> {
        if prompt.trim().is_empty() {
            return Err(ConclaveError::InvalidArgument(
                "prompt must not be empty".to_string(),
            ));
        }

        let agents = self.active_fixed_agents();
        if agents.is_empty() {
            return Err(ConclaveError::NoActiveAgents);
        }

        let mut seed = HashMap::new();
        if let Some(memories) = self.recall(prompt).await {
            seed.insert(MEMORIES_KEY.to_string(), memories);
        }

        let round = self
            .participate(&seed, &agents, prompt, ConversationMode::TurnOrder)
            .await?;

        let mut messages: Vec<AgentMessage> = round
            .iter()
            .map(|(name, response)| {
                AgentMessage::new(name, response.content(), response.confidence())
            })
            .collect();

        let joined = messages
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let mean = messages
            .iter()
            .map(|message| message.confidence)
            .sum::<f32>()
            / messages.len() as f32;
        messages.push(AgentMessage::new(
            COORDINATOR_NAME,
            format!("[{COORDINATOR_NAME}] {joined}"),
            mean.clamp(0.0, 1.0),
        ));

        Ok(messages)
    }

    async fn recall(&self, prompt: &str) -> Option<String> {
        let store = self.memory.as_ref()?;
        match store.query(&MemoryQuery::new(prompt)).await {
            Ok(result) if !result.items.is_empty() => {
                debug!(items = result.items.len(), "Recalled memories");
                Some(
                    result
                        .items
                        .iter()
                        .map(|item| item.content.as_str())
                        .collect::<Vec<_>>()
                        .join("; "),
                )
            }
            Ok(_) => None,
            Err(error) => {
                warn!(error = %error, "Memory recall failed, continuing without enrichment");
                None
            }
        }
    }

    /// Fixed service agents in configuration order
    pub fn fixed_agents(&self) -> &[Arc<dyn AgentCapability>] {
        &self.fixed
    }

    /// Active fixed agents followed by the given ad-hoc agents, ready
    /// to pass to [`participate`](Self::participate)
    pub fn participants_with(
        &self,
        extra: &[Arc<dyn AgentCapability>],
    ) -> Vec<Arc<dyn AgentCapability>> {
        let mut participants = self.active_fixed_agents();
        participants.extend(extra.iter().cloned());
        participants
    }

    fn active_fixed_agents(&self) -> Vec<Arc<dyn AgentCapability>> {
        let active = self.active.read();
        self.fixed
            .iter()
            .filter(|agent| active.contains(agent.name()))
            .cloned()
            .collect()
    }

    /// Names of currently active fixed agents, in configuration order
    pub fn active_agents(&self) -> Vec<String> {
        let active = self.active.read();
        self.fixed
            .iter()
            .filter(|agent| active.contains(agent.name()))
            .map(|agent| agent.name().to_string())
            .collect()
    }

    /// Flip a fixed agent's participation, returning its new state
    pub fn toggle_agent(&self, name: &str) -> Result<bool, ConclaveError> {
        if !self.fixed.iter().any(|agent| agent.name() == name) {
            return Err(ConclaveError::AgentNotFound(name.to_string()));
        }

        let mut active = self.active.write();
        if active.remove(name) {
            info!(agent = %name, "Agent deactivated");
            Ok(false)
        } else {
            active.insert(name.to_string());
            info!(agent = %name, "Agent activated");
            Ok(true)
        }
    }

    /// Register an agent at runtime; an existing agent with the same
    /// name is replaced
    pub fn register_agent(&self, agent: Arc<dyn AgentCapability>) -> AgentConfig {
        let name = agent.name().to_string();
        self.registered.write().insert(name.clone(), agent);
        let config = self
            .registry
            .register_auxiliary(name.clone(), Vec::<String>::new());
        info!(agent = %name, "Registered dynamic agent");
        config
    }

    /// Deregister a dynamic agent by name
    pub fn deregister_agent(&self, name: &str) -> Option<Arc<dyn AgentCapability>> {
        self.registry.deregister_auxiliary(name);
        let removed = self.registered.write().remove(name);
        if removed.is_some() {
            info!(agent = %name, "Deregistered dynamic agent");
        }
        removed
    }

    /// Look up a dynamically registered agent
    pub fn registered_agent(&self, name: &str) -> Option<Arc<dyn AgentCapability>> {
        self.registered.read().get(name).cloned()
    }

    /// Configuration registry for all known agents
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Push shared context to every fixed and registered agent that
    /// accepts it
    pub fn broadcast_context(&self, context: &HashMap<String, String>) {
        for agent in &self.fixed {
            agent.share_context(context);
        }
        for agent in self.registered.read().values() {
            agent.share_context(context);
        }
    }

    /// Snapshot of recorded rounds
    pub fn history(&self) -> Vec<ResponseSet> {
        self.history.read().clone()
    }

    /// Append a round to the history
    pub fn record_round(&self, round: ResponseSet) {
        self.history.write().push(round);
    }

    /// Drop all recorded rounds
    pub fn clear_history(&self) {
        self.history.write().clear();
        info!("Cleared round history");
    }

    fn emit(&self, event: OrchestratorEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }
}

/// Prompt wins; an absent prompt falls back to the seed's latest input
fn resolve_query(prompt: &str, seed: &HashMap<String, String>) -> String {
    if !prompt.is_empty() {
        return prompt.to_string();
    }
    seed.get(LATEST_INPUT_KEY).cloned().unwrap_or_default()
}

/// Deterministic rendering of a seed map into a request context string
fn render_seed(seed: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> = seed.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{CannedAgent, FailingAgent};
    use crate::memory::testing::VecStore;
    use crate::memory::MemoryItem;
    use crate::protocol::AgentCategory;
    use crate::service::testing::CannedService;
    use crate::service::ServiceAgent;
    use async_trait::async_trait;

    fn service(name: &str, category: AgentCategory) -> Arc<dyn AgentCapability> {
        Arc::new(ServiceAgent::new(CannedService::new(
            name,
            category,
            "ok",
            Some(1.0),
        )))
    }

    fn fixed_services() -> Vec<Arc<dyn AgentCapability>> {
        vec![
            service("muse", AgentCategory::Creative),
            service("warden", AgentCategory::Security),
            service("relay", AgentCategory::StateManager),
        ]
    }

    #[tokio::test]
    async fn test_turn_order_with_services_and_adhoc_agent() {
        let orchestrator = Orchestrator::new(fixed_services());
        let dummy: Arc<dyn AgentCapability> = Arc::new(CannedAgent::new("Dummy", "ok", 1.0));
        let agents = orchestrator.participants_with(std::slice::from_ref(&dummy));

        let result = orchestrator
            .participate(&HashMap::new(), &agents, "test", ConversationMode::TurnOrder)
            .await
            .unwrap();

        assert_eq!(result.len(), 4);
        assert_eq!(result["Dummy"].content(), "ok");
        let names: Vec<&str> = result.names().collect();
        assert_eq!(names, vec!["muse", "warden", "relay", "Dummy"]);
    }

    #[tokio::test]
    async fn test_turn_order_threads_latest_input() {
        let first = Arc::new(CannedAgent::new("first", "alpha", 0.9));
        let second = Arc::new(CannedAgent::new("second", "beta", 0.8));
        let agents: Vec<Arc<dyn AgentCapability>> = vec![first.clone(), second.clone()];

        let orchestrator = Orchestrator::new(Vec::new());
        orchestrator
            .participate(&HashMap::new(), &agents, "go", ConversationMode::TurnOrder)
            .await
            .unwrap();

        let first_ctx = first.seen_context.read();
        let second_ctx = second.seen_context.read();
        assert!(!first_ctx[0].contains("latestInput"));
        assert!(second_ctx[0].contains("latestInput=alpha"));
    }

    #[tokio::test]
    async fn test_same_seed_reaches_every_agent() {
        let first = Arc::new(CannedAgent::new("first", "alpha", 0.9));
        let second = Arc::new(CannedAgent::new("second", "beta", 0.8));
        let agents: Vec<Arc<dyn AgentCapability>> = vec![first.clone(), second.clone()];

        let seed = HashMap::from([("topic".to_string(), "foxes".to_string())]);
        let orchestrator = Orchestrator::new(Vec::new());
        orchestrator
            .participate(&seed, &agents, "go", ConversationMode::TurnOrder)
            .await
            .unwrap();

        assert!(first.seen_context.read()[0].contains("topic=foxes"));
        assert!(second.seen_context.read()[0].contains("topic=foxes"));
    }

    #[tokio::test]
    async fn test_duplicate_identities_last_write_wins() {
        let agents: Vec<Arc<dyn AgentCapability>> = vec![
            Arc::new(CannedAgent::new("twin", "first", 0.3)),
            Arc::new(CannedAgent::new("twin", "second", 0.6)),
        ];

        let orchestrator = Orchestrator::new(Vec::new());
        let result = orchestrator
            .participate(&HashMap::new(), &agents, "go", ConversationMode::TurnOrder)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result["twin"].content(), "second");
    }

    #[tokio::test]
    async fn test_empty_agents_yield_empty_set() {
        let orchestrator = Orchestrator::new(Vec::new());
        let result = orchestrator
            .participate(&HashMap::new(), &[], "go", ConversationMode::TurnOrder)
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_round() {
        let (orchestrator, mut channel) = Orchestrator::with_channel(Vec::new());
        let agents: Vec<Arc<dyn AgentCapability>> = vec![
            Arc::new(CannedAgent::new("before", "fine", 0.9)),
            Arc::new(FailingAgent::new("broken")),
            Arc::new(CannedAgent::new("after", "also fine", 0.8)),
        ];

        let result = orchestrator
            .participate(&HashMap::new(), &agents, "go", ConversationMode::TurnOrder)
            .await
            .unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result["broken"].confidence(), 0.0);
        assert!(result["broken"].content().starts_with("Error:"));
        assert_eq!(result["after"].content(), "also fine");

        let failed: Vec<ErrorRecord> = channel
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                OrchestratorEvent::AgentFailed { record } => Some(record),
                _ => None,
            })
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].agent, "broken");
        assert_eq!(failed[0].kind, ErrorKind::Processing);
    }

    #[tokio::test]
    async fn test_free_form_shares_no_cross_agent_context() {
        let first = Arc::new(CannedAgent::new("first", "alpha", 0.9));
        let second = Arc::new(CannedAgent::new("second", "beta", 0.8));
        let agents: Vec<Arc<dyn AgentCapability>> = vec![first.clone(), second.clone()];

        let orchestrator = Orchestrator::new(Vec::new());
        let result = orchestrator
            .participate(&HashMap::new(), &agents, "go", ConversationMode::FreeForm)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        let names: Vec<&str> = result.names().collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(!second.seen_context.read()[0].contains("latestInput"));
    }

    #[tokio::test]
    async fn test_free_form_failure_substitution() {
        let agents: Vec<Arc<dyn AgentCapability>> = vec![
            Arc::new(FailingAgent::new("broken")),
            Arc::new(CannedAgent::new("fine", "ok", 0.7)),
        ];

        let orchestrator = Orchestrator::new(Vec::new());
        let result = orchestrator
            .participate(&HashMap::new(), &agents, "go", ConversationMode::FreeForm)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result["broken"].confidence(), 0.0);
        assert_eq!(result["fine"].content(), "ok");
    }

    /// Agent that cancels the shared token while responding
    struct CancellingAgent {
        name: String,
        token: CancellationToken,
    }

    #[async_trait]
    impl AgentCapability for CancellingAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn respond(&self, _request: &Request) -> anyhow::Result<Response> {
            self.token.cancel();
            Ok(Response::new("answered then cancelled", 0.5))
        }
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_set() {
        let token = CancellationToken::new();
        let agents: Vec<Arc<dyn AgentCapability>> = vec![
            Arc::new(CancellingAgent {
                name: "canceller".to_string(),
                token: token.clone(),
            }),
            Arc::new(CannedAgent::new("never", "unreached", 1.0)),
        ];

        let (orchestrator, mut channel) = Orchestrator::with_channel(Vec::new());
        let result = orchestrator
            .participate_with_cancellation(
                &HashMap::new(),
                &agents,
                "go",
                ConversationMode::TurnOrder,
                &token,
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.contains("canceller"));
        assert!(!result.contains("never"));
        assert!(channel
            .drain()
            .iter()
            .any(|event| matches!(event, OrchestratorEvent::Cancelled { completed: 1 })));
    }

    /// Agent whose confidence rises on every invocation
    struct ImprovingAgent {
        name: String,
        calls: RwLock<usize>,
    }

    #[async_trait]
    impl AgentCapability for ImprovingAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn respond(&self, _request: &Request) -> anyhow::Result<Response> {
            let mut calls = self.calls.write();
            *calls += 1;
            Ok(Response::new(format!("draft {}", *calls), 0.3 * *calls as f32))
        }
    }

    #[tokio::test]
    async fn test_converse_selects_best_round() {
        let agents: Vec<Arc<dyn AgentCapability>> = vec![Arc::new(ImprovingAgent {
            name: "drafter".to_string(),
            calls: RwLock::new(0),
        })];

        let orchestrator = Orchestrator::new(Vec::new());
        let consensus = orchestrator
            .converse(&HashMap::new(), &agents, "go", 3)
            .await
            .unwrap();

        assert_eq!(consensus["drafter"].content(), "draft 3");
        assert_eq!(orchestrator.history().len(), 3);
    }

    #[tokio::test]
    async fn test_converse_rejects_zero_rounds() {
        let orchestrator = Orchestrator::new(Vec::new());
        let result = orchestrator.converse(&HashMap::new(), &[], "go", 0).await;
        assert!(matches!(result, Err(ConclaveError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_process_query_appends_coordinator_message() {
        let orchestrator = Orchestrator::new(fixed_services());
        let messages = orchestrator.process_query("hello").await.unwrap();

        assert_eq!(messages.len(), 4);
        let last = messages.last().unwrap();
        assert_eq!(last.sender, COORDINATOR_NAME);
        assert!(last.content.contains("ok"));
        assert_eq!(last.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_process_query_rejects_empty_prompt() {
        let orchestrator = Orchestrator::new(fixed_services());
        assert!(matches!(
            orchestrator.process_query("  ").await,
            Err(ConclaveError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_process_query_requires_active_agents() {
        let orchestrator = Orchestrator::new(fixed_services());
        for name in ["muse", "warden", "relay"] {
            orchestrator.toggle_agent(name).unwrap();
        }

        assert!(matches!(
            orchestrator.process_query("hello").await,
            Err(ConclaveError::NoActiveAgents)
        ));
    }

    #[tokio::test]
    async fn test_process_query_enriches_from_memory() {
        let store = Arc::new(VecStore::default());
        store
            .insert(MemoryItem::new("relay", "the sky was green"))
            .await
            .unwrap();

        let witness = Arc::new(CannedAgent::new("witness", "noted", 0.9));
        let orchestrator =
            Orchestrator::new(vec![witness.clone()]).with_memory_store(store);

        orchestrator.process_query("sky").await.unwrap();

        let contexts = witness.seen_context.read();
        assert!(contexts[0].contains("the sky was green"));
    }

    #[tokio::test]
    async fn test_toggle_agent() {
        let orchestrator = Orchestrator::new(fixed_services());

        assert_eq!(orchestrator.toggle_agent("warden").unwrap(), false);
        assert_eq!(orchestrator.active_agents(), vec!["muse", "relay"]);
        assert_eq!(orchestrator.toggle_agent("warden").unwrap(), true);

        assert!(matches!(
            orchestrator.toggle_agent("nobody"),
            Err(ConclaveError::AgentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_register_and_deregister_dynamic_agent() {
        let orchestrator = Orchestrator::new(Vec::new());
        let helper: Arc<dyn AgentCapability> = Arc::new(CannedAgent::new("helper", "hi", 0.4));

        let config = orchestrator.register_agent(helper);
        assert_eq!(config.category, AgentCategory::Auxiliary);
        assert!(orchestrator.registered_agent("helper").is_some());
        assert!(orchestrator.registry().config_for("helper").is_some());

        assert!(orchestrator.deregister_agent("helper").is_some());
        assert!(orchestrator.registered_agent("helper").is_none());
        assert!(orchestrator.deregister_agent("helper").is_none());
    }

    /// Agent that remembers broadcast context
    struct ContextHungryAgent {
        name: String,
        received: RwLock<Option<HashMap<String, String>>>,
    }

    #[async_trait]
    impl AgentCapability for ContextHungryAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn respond(&self, _request: &Request) -> anyhow::Result<Response> {
            Ok(Response::new("ok", 0.5))
        }

        fn share_context(&self, context: &HashMap<String, String>) {
            *self.received.write() = Some(context.clone());
        }
    }

    #[tokio::test]
    async fn test_broadcast_context_reaches_opted_in_agents() {
        let hungry = Arc::new(ContextHungryAgent {
            name: "hungry".to_string(),
            received: RwLock::new(None),
        });
        let orchestrator = Orchestrator::new(vec![hungry.clone()]);

        let context = HashMap::from([("mood".to_string(), "calm".to_string())]);
        orchestrator.broadcast_context(&context);

        assert_eq!(
            hungry.received.read().as_ref().unwrap().get("mood").unwrap(),
            "calm"
        );
    }

    #[tokio::test]
    async fn test_history_record_and_clear() {
        let orchestrator = Orchestrator::new(Vec::new());
        let mut round = ResponseSet::new();
        round.insert("a", Response::new("x", 0.1));

        orchestrator.record_round(round);
        assert_eq!(orchestrator.history().len(), 1);

        orchestrator.clear_history();
        assert!(orchestrator.history().is_empty());
    }

    #[test]
    fn test_resolve_query_falls_back_to_latest_input() {
        let seed = HashMap::from([(LATEST_INPUT_KEY.to_string(), "carry on".to_string())]);
        assert_eq!(resolve_query("", &seed), "carry on");
        assert_eq!(resolve_query("fresh", &seed), "fresh");
        assert_eq!(resolve_query("", &HashMap::new()), "");
    }

    #[test]
    fn test_render_seed_is_deterministic() {
        let seed = HashMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]);
        assert_eq!(render_seed(&seed), "a=1; b=2");
    }
}
