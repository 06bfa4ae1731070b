//! Agent configuration registry
//!
//! Tracks the fixed master agent configurations plus auxiliary agents
//! registered at runtime, and answers priority-ordered listings.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::protocol::AgentCategory;

/// Scheduling priority of an agent within the assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentPriority {
    Primary,
    Secondary,
    Tertiary,
    Bridge,
    Auxiliary,
}

impl AgentCategory {
    /// Default priority assigned to agents of this category
    pub fn default_priority(&self) -> AgentPriority {
        match self {
            AgentCategory::Coordinator => AgentPriority::Primary,
            AgentCategory::Security => AgentPriority::Secondary,
            AgentCategory::Creative => AgentPriority::Tertiary,
            AgentCategory::StateManager => AgentPriority::Bridge,
            AgentCategory::Auxiliary => AgentPriority::Auxiliary,
        }
    }
}

/// Static description of one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub category: AgentCategory,
    pub priority: AgentPriority,
    pub capabilities: Vec<String>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, category: AgentCategory) -> Self {
        Self {
            name: name.into(),
            category,
            priority: category.default_priority(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }
}

/// Registry of master and auxiliary agent configurations
///
/// Master configs are fixed at construction; auxiliaries may be added
/// at runtime from any task.
pub struct AgentRegistry {
    masters: Vec<AgentConfig>,
    auxiliaries: RwLock<Vec<AgentConfig>>,
}

impl AgentRegistry {
    pub fn new(masters: Vec<AgentConfig>) -> Self {
        Self {
            masters,
            auxiliaries: RwLock::new(Vec::new()),
        }
    }

    /// Register an auxiliary agent, returning its stored config
    ///
    /// Re-registering an existing auxiliary name replaces the old
    /// entry.
    pub fn register_auxiliary<I, S>(&self, name: impl Into<String>, capabilities: I) -> AgentConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config =
            AgentConfig::new(name, AgentCategory::Auxiliary).with_capabilities(capabilities);

        let mut auxiliaries = self.auxiliaries.write();
        auxiliaries.retain(|existing| existing.name != config.name);
        auxiliaries.push(config.clone());

        info!(agent = %config.name, "Registered auxiliary agent");
        config
    }

    /// Remove an auxiliary agent by name
    pub fn deregister_auxiliary(&self, name: &str) -> bool {
        let mut auxiliaries = self.auxiliaries.write();
        let before = auxiliaries.len();
        auxiliaries.retain(|config| config.name != name);
        before != auxiliaries.len()
    }

    /// Look up a config by name, masters first
    pub fn config_for(&self, name: &str) -> Option<AgentConfig> {
        self.masters
            .iter()
            .find(|config| config.name == name)
            .cloned()
            .or_else(|| {
                self.auxiliaries
                    .read()
                    .iter()
                    .find(|config| config.name == name)
                    .cloned()
            })
    }

    /// All configs in priority order: masters in their configured
    /// order, then auxiliaries in registration order
    pub fn by_priority(&self) -> Vec<AgentConfig> {
        let mut configs = self.masters.clone();
        configs.extend(self.auxiliaries.read().iter().cloned());
        configs
    }

    pub fn len(&self) -> usize {
        self.masters.len() + self.auxiliaries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
