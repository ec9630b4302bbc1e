//! High-level builder API for creating agents

use crate::agent::Agent;
use crate::config::AgentConfig;
use anyhow::{Context, Result};
use clipt_graph::{Callback, Tool, ToolRegistry};
use clipt_llm::ModelClient;
use std::sync::Arc;

/// High-level builder for creating agents
///
/// # Example
///
/// ```rust,no_run
/// use clipt::prelude::*;
/// # use std::sync::Arc;
///
/// # fn demo(client: Arc<dyn ModelClient>, search: Arc<dyn Tool>) -> anyhow::Result<()> {
/// let agent = AgentBuilder::new()
///     .client(client)
///     .tool(search)
///     .callback(Arc::new(LoggingCallback))
///     .config(AgentConfig::load(None)?)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct AgentBuilder {
    client: Option<Arc<dyn ModelClient>>,
    tools: Vec<Arc<dyn Tool>>,
    callbacks: Vec<Arc<dyn Callback>>,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model client (required)
    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Register a tool; a later tool with the same name replaces it
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Add an observer; callbacks run in the order they were added
    pub fn callback(mut self, callback: Arc<dyn Callback>) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the agent
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no model client is set
    /// - the graph fails validation (e.g. `max_steps` is zero)
    pub fn build(self) -> Result<Agent> {
        let client = self
            .client
            .context("Model client is required. Call .client(client)")?;

        let registry: ToolRegistry = self.tools.into_iter().collect();

        Agent::assemble(client, registry, self.callbacks, self.config)
            .context("Failed to compile agent graph")
    }
}
