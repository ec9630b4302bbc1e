use crate::builder::AgentBuilder;
use crate::config::AgentConfig;
use anyhow::{anyhow, Result};
use clipt_graph::{
    react_graph, Callback, CallbackSet, CompiledGraph, GraphError, PassThrough, StreamGate, Tool,
    ToolRegistry,
};
use clipt_llm::{ModelClient, Transcript};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// A ReAct agent: the canonical graph bound to one model client and tool set.
///
/// Runs on the same agent are serialized, since they share the stream gate.
/// Use separate agents for concurrent conversations.
pub struct Agent {
    graph: Arc<CompiledGraph>,
    gate: Arc<StreamGate>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
    run_lock: Mutex<()>,
}

impl Agent {
    /// Agent with the default configuration
    pub fn new(
        client: Arc<dyn ModelClient>,
        tools: Vec<Arc<dyn Tool>>,
        callback: Arc<dyn Callback>,
    ) -> Result<Self> {
        AgentBuilder::new()
            .client(client)
            .tools(tools)
            .callback(callback)
            .build()
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub(crate) fn assemble(
        client: Arc<dyn ModelClient>,
        tools: ToolRegistry,
        callbacks: Vec<Arc<dyn Callback>>,
        config: AgentConfig,
    ) -> clipt_graph::Result<Self> {
        let mut gate = StreamGate::with_capacity(
            config.stream.keywords.iter().cloned(),
            config.stream.sink_capacity,
        );
        if !config.stream.trim_lone_colon {
            gate = gate.with_transform(Arc::new(PassThrough));
        }
        let gate = Arc::new(gate);

        let mut observers = CallbackSet::new();
        for callback in callbacks {
            observers.push(callback);
        }
        observers.push(gate.clone());

        let tools = Arc::new(tools);
        let graph = react_graph(client, Arc::clone(&tools), config.react_options())?
            .with_callback(Arc::new(observers));

        tracing::debug!(
            tools = ?tools.names(),
            keywords = ?gate.keywords(),
            "agent assembled"
        );

        Ok(Self {
            graph: Arc::new(graph),
            gate,
            tools,
            config,
            run_lock: Mutex::new(()),
        })
    }

    /// Answer `input` by running the graph on a fresh transcript.
    ///
    /// Progress is only observable through callbacks and [`Agent::stream`].
    /// Waits for any run already in flight on this agent.
    pub async fn run(&self, cancel: &CancellationToken, input: &str) -> clipt_graph::Result<()> {
        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GraphError::Cancelled),
            guard = self.run_lock.lock() => guard,
        };

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("agent_run", run_id = %run_id);

        async {
            self.gate.reset();
            let mut transcript = Transcript::seeded(self.config.system_prompt(), input);

            tracing::info!("run started");
            let result = self.graph.invoke(cancel, &mut transcript).await;

            match &result {
                Ok(()) => tracing::info!(messages = transcript.len(), "run finished"),
                Err(err) => tracing::warn!(error = %err, messages = transcript.len(), "run failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Forward gated output to `consumer` from a background task.
    ///
    /// Cancelling `cancel` closes the sink: chunks already buffered are still
    /// delivered, later ones are dropped, and the task ends. Dropping the
    /// agent ends it the same way. Only one consumer can be attached per agent.
    pub fn stream<F>(&self, cancel: CancellationToken, mut consumer: F) -> Result<JoinHandle<()>>
    where
        F: FnMut(String) + Send + 'static,
    {
        let mut rx = self
            .gate
            .take_receiver()
            .ok_or_else(|| anyhow!("a stream consumer is already attached to this agent"))?;

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        rx.close();
                        let mut drained = 0usize;
                        while let Some(chunk) = rx.recv().await {
                            consumer(chunk);
                            drained += 1;
                        }
                        tracing::debug!(drained, "stream consumer cancelled");
                        break;
                    }
                    chunk = rx.recv() => match chunk {
                        Some(chunk) => consumer(chunk),
                        None => break,
                    },
                }
            }
        }))
    }

    pub fn graph(&self) -> &Arc<CompiledGraph> {
        &self.graph
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn gate(&self) -> &StreamGate {
        &self.gate
    }
}
