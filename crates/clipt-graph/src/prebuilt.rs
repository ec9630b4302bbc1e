//! Ready-made graph shapes and the adapter that exposes a graph as a tool

use crate::error::Result;
use crate::graph::{CompiledGraph, GraphDefinition, END};
use crate::nodes::{ExecuteNode, ModelNode};
use crate::router::{route_on_finish_marker, route_on_tool_calls};
use crate::tools::{Tool, ToolRegistry, UnknownToolPolicy};
use crate::types::GraphConfig;
use async_trait::async_trait;
use clipt_llm::{ModelClient, Transcript};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_FINISH_MARKER: &str = "[FINISH]";

pub const REASON: &str = "reason";
pub const ACT: &str = "act";
pub const EXECUTE: &str = "execute";
pub const OBSERVE: &str = "observe";

pub const AGENT: &str = "agent";
pub const TOOLS: &str = "tools";

pub const DEFAULT_REASON_INSTRUCTION: &str =
    "Reason step-by-step about the next action to achieve the user's goal based on the current state.";

/// System prompt that seeds a ReAct transcript, ending with `marker`
pub fn default_system_prompt(marker: &str) -> String {
    format!(
        "You are a ReAct agent with access to tools.\n\
         Reason step-by-step to answer the user's query.\n\
         Use the available tools when needed.\n\
         When you have the final answer, end your response with '{}' on a new line.",
        marker
    )
}

pub fn default_observe_instruction(marker: &str) -> String {
    format!(
        "Review the current state and decide if the user's goal is met. \
         If so, end your response with '{}' on a new line. \
         If not, suggest the next step.",
        marker
    )
}

#[derive(Debug, Clone)]
pub struct ReactOptions {
    pub reason_instruction: String,
    /// Falls back to [`default_observe_instruction`] for the finish marker
    pub observe_instruction: Option<String>,
    pub finish_marker: String,
    pub unknown_tools: UnknownToolPolicy,
    pub config: GraphConfig,
}

impl Default for ReactOptions {
    fn default() -> Self {
        Self {
            reason_instruction: DEFAULT_REASON_INSTRUCTION.to_string(),
            observe_instruction: None,
            finish_marker: DEFAULT_FINISH_MARKER.to_string(),
            unknown_tools: UnknownToolPolicy::default(),
            config: GraphConfig::default(),
        }
    }
}

impl ReactOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reason_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.reason_instruction = instruction.into();
        self
    }

    pub fn with_observe_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.observe_instruction = Some(instruction.into());
        self
    }

    pub fn with_finish_marker(mut self, marker: impl Into<String>) -> Self {
        self.finish_marker = marker.into();
        self
    }

    pub fn with_unknown_tool_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.unknown_tools = policy;
        self
    }

    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }
}

/// `reason → act → (execute | observe); execute → observe; observe → (END | reason)`
///
/// `act` is the only stage that sees the tool definitions. `observe` ends the
/// run once its text contains the finish marker.
pub fn react_graph(
    client: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
    options: ReactOptions,
) -> Result<CompiledGraph> {
    let observe_instruction = options
        .observe_instruction
        .clone()
        .unwrap_or_else(|| default_observe_instruction(&options.finish_marker));

    let reason = ModelNode::new(Arc::clone(&client)).with_instruction(options.reason_instruction);
    let act = ModelNode::new(Arc::clone(&client)).with_tools(&registry);
    let observe = ModelNode::new(client).with_instruction(observe_instruction);
    let execute = ExecuteNode::new(registry).with_unknown_tool_policy(options.unknown_tools);

    GraphDefinition::new()
        .add_node(REASON, reason)
        .add_node(ACT, act)
        .add_node(EXECUTE, execute)
        .add_node(OBSERVE, observe)
        .set_entry_point(REASON)
        .add_edge(REASON, ACT)
        .add_conditional_edge(ACT, [EXECUTE, OBSERVE], route_on_tool_calls(EXECUTE, OBSERVE))
        .add_edge(EXECUTE, OBSERVE)
        .add_conditional_edge(
            OBSERVE,
            [END, REASON],
            route_on_finish_marker(options.finish_marker, END, REASON),
        )
        .compile(options.config)
}

/// `agent → (tools | END); tools → agent`
///
/// The model keeps calling tools until it answers without any.
pub fn tool_loop_graph(
    client: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
    unknown_tools: UnknownToolPolicy,
    config: GraphConfig,
) -> Result<CompiledGraph> {
    let agent = ModelNode::new(client).with_tools(&registry);
    let tools = ExecuteNode::new(registry).with_unknown_tool_policy(unknown_tools);

    GraphDefinition::new()
        .add_node(AGENT, agent)
        .add_node(TOOLS, tools)
        .set_entry_point(AGENT)
        .add_conditional_edge(AGENT, [TOOLS, END], route_on_tool_calls(TOOLS, END))
        .add_edge(TOOLS, AGENT)
        .compile(config)
}

/// Exposes a compiled graph as a tool, so sub-agents can be composed into a
/// parent agent's registry.
///
/// Each call runs the graph on a fresh transcript seeded with `primer` and
/// the raw call arguments, and returns the text of the final message.
pub struct GraphTool {
    name: String,
    description: String,
    parameters: Value,
    primer: String,
    graph: Arc<CompiledGraph>,
}

impl GraphTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        primer: impl Into<String>,
        graph: Arc<CompiledGraph>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The request for the sub-agent" }
                }
            }),
            primer: primer.into(),
            graph,
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

#[async_trait]
impl Tool for GraphTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn call(&self, cancel: &CancellationToken, arguments: &str) -> anyhow::Result<String> {
        tracing::debug!(tool = %self.name, "running sub-graph");

        let mut transcript = Transcript::seeded(self.primer.clone(), arguments);
        self.graph.invoke(cancel, &mut transcript).await?;

        Ok(transcript.last()?.text().unwrap_or_default().to_string())
    }
}
