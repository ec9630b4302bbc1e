use crate::callback::{Callback, NoopCallback};
use crate::error::{GraphError, Result};
use crate::node::{Node, StreamEmitter};
use crate::types::GraphConfig;
use clipt_llm::Transcript;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Reserved target that terminates a run
pub const END: &str = "END";

/// Routing function of a conditional edge, returning the next node's name
pub type Decide = Arc<dyn Fn(&Transcript) -> anyhow::Result<String> + Send + Sync>;

#[derive(Clone)]
pub enum Edge {
    Unconditional {
        target: String,
    },
    Conditional {
        /// Every name `decide` may return
        branches: Vec<String>,
        decide: Decide,
    },
}

impl Edge {
    /// All names this edge can lead to
    pub fn targets(&self) -> &[String] {
        match self {
            Edge::Unconditional { target } => std::slice::from_ref(target),
            Edge::Conditional { branches, .. } => branches,
        }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Unconditional { target } => f
                .debug_struct("Unconditional")
                .field("target", target)
                .finish(),
            Edge::Conditional { branches, .. } => f
                .debug_struct("Conditional")
                .field("branches", branches)
                .finish_non_exhaustive(),
        }
    }
}

/// Mutable description of a graph. Nothing is checked until [`compile`].
///
/// Each node has exactly one outgoing edge, keyed by the node's name; adding
/// another edge for the same source replaces the previous one.
///
/// [`compile`]: GraphDefinition::compile
#[derive(Default)]
pub struct GraphDefinition {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: Option<String>,
}

impl GraphDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node<N>(mut self, name: impl Into<String>, node: N) -> Self
    where
        N: Node + 'static,
    {
        self.nodes.insert(name.into(), Arc::new(node));
        self
    }

    pub fn add_shared_node(mut self, name: impl Into<String>, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(name.into(), node);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.insert(
            from.into(),
            Edge::Unconditional { target: to.into() },
        );
        self
    }

    pub fn add_conditional_edge<I, S, F>(mut self, from: impl Into<String>, branches: I, decide: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Transcript) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.edges.insert(
            from.into(),
            Edge::Conditional {
                branches: branches.into_iter().map(Into::into).collect(),
                decide: Arc::new(decide),
            },
        );
        self
    }

    pub fn set_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Validate the definition and freeze it.
    ///
    /// Fails with [`GraphError::Validation`] naming the first problem found.
    pub fn compile(self, config: GraphConfig) -> Result<CompiledGraph> {
        self.validate(&config)?;

        let entry = self
            .entry
            .ok_or_else(|| GraphError::Validation("no entry point set".to_string()))?;

        tracing::debug!(
            entry = %entry,
            nodes = self.nodes.len(),
            max_steps = config.max_steps,
            "graph compiled"
        );

        Ok(CompiledGraph {
            nodes: self.nodes,
            edges: self.edges,
            entry,
            config,
            callback: Arc::new(NoopCallback),
        })
    }

    fn validate(&self, config: &GraphConfig) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(GraphError::Validation(msg)) };

        if config.max_steps == 0 {
            return invalid("max_steps must be at least 1".to_string());
        }

        let Some(entry) = self.entry.as_deref() else {
            return invalid("no entry point set".to_string());
        };
        if !self.nodes.contains_key(entry) {
            return invalid(format!("entry point '{}' is not a node", entry));
        }

        if self.nodes.contains_key(END) {
            return invalid(format!("'{}' is reserved and cannot be a node", END));
        }

        // Sorted so the reported error is stable across runs
        let mut sources: Vec<&String> = self.edges.keys().collect();
        sources.sort();

        for from in sources {
            if !self.nodes.contains_key(from) {
                return invalid(format!("edge source '{}' is not a node", from));
            }

            let edge = &self.edges[from];
            if edge.targets().is_empty() {
                return invalid(format!("conditional edge from '{}' declares no branches", from));
            }

            for target in edge.targets() {
                if target != END && !self.nodes.contains_key(target) {
                    return invalid(format!(
                        "edge from '{}' targets unknown node '{}'",
                        from, target
                    ));
                }
            }
        }

        let mut names: Vec<&String> = self.nodes.keys().collect();
        names.sort();
        if let Some(dangling) = names.into_iter().find(|name| !self.edges.contains_key(*name)) {
            return invalid(format!("node '{}' has no outgoing edge", dangling));
        }

        Ok(())
    }
}

/// Immutable, validated graph.
///
/// Holds no per-run state, so one instance can serve concurrent runs as long
/// as each run owns its transcript.
pub struct CompiledGraph {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: String,
    config: GraphConfig,
    callback: Arc<dyn Callback>,
}

impl CompiledGraph {
    pub fn with_callback(mut self, callback: Arc<dyn Callback>) -> Self {
        self.callback = callback;
        self
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn callback(&self) -> &Arc<dyn Callback> {
        &self.callback
    }

    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn edge(&self, from: &str) -> Option<&Edge> {
        self.edges.get(from)
    }

    /// Run the graph from its entry point until a node routes to [`END`].
    ///
    /// The transcript keeps everything appended before a failure.
    pub async fn invoke(&self, cancel: &CancellationToken, transcript: &mut Transcript) -> Result<()> {
        match self.config.execution_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(cancel, transcript))
                .await
                .map_err(|_| {
                    tracing::warn!(timeout_ms = limit.as_millis() as u64, "graph run timed out");
                    GraphError::Timeout
                })?,
            None => self.run(cancel, transcript).await,
        }
    }

    async fn run(&self, cancel: &CancellationToken, transcript: &mut Transcript) -> Result<()> {
        let mut current = self.entry.clone();
        let mut steps = 0usize;

        while current != END {
            if steps >= self.config.max_steps {
                tracing::warn!(max_steps = self.config.max_steps, node = %current, "step limit reached");
                return Err(GraphError::MaxStepsExceeded {
                    max: self.config.max_steps,
                });
            }
            if cancel.is_cancelled() {
                return Err(GraphError::Cancelled);
            }
            steps += 1;

            let node = self.nodes.get(&current).ok_or_else(|| {
                GraphError::Validation(format!("node '{}' is not registered", current))
            })?;

            tracing::debug!(node = %current, step = steps, "executing node");
            self.callback.handle_node_start(&current, transcript).await;

            let emitter = StreamEmitter::new(current.clone(), Arc::clone(&self.callback));
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(GraphError::Cancelled),
                result = node.execute(cancel, transcript, &emitter) => {
                    result.map_err(|err| GraphError::from_node(&current, err))
                }
            };

            if let Err(err) = outcome {
                if cancel.is_cancelled() {
                    tracing::debug!(node = %current, "run cancelled");
                    return Err(GraphError::Cancelled);
                }
                tracing::error!(node = %current, error = %err, "node failed");
                return Err(err);
            }

            self.callback.handle_node_end(&current, transcript).await;
            current = self.next_node(&current, transcript).await?;
        }

        tracing::debug!(steps, messages = transcript.len(), "graph run finished");
        Ok(())
    }

    async fn next_node(&self, from: &str, transcript: &Transcript) -> Result<String> {
        let edge = self.edges.get(from).ok_or_else(|| {
            GraphError::Validation(format!("node '{}' has no outgoing edge", from))
        })?;

        match edge {
            Edge::Unconditional { target } => Ok(target.clone()),
            Edge::Conditional { branches, decide } => {
                self.callback.handle_edge_entry(from, transcript).await;

                let outcome = decide(transcript).map_err(|source| GraphError::Route {
                    edge: from.to_string(),
                    source,
                })?;

                if !branches.iter().any(|branch| *branch == outcome) {
                    return Err(GraphError::UndeclaredRoute {
                        edge: from.to_string(),
                        target: outcome,
                    });
                }

                tracing::debug!(edge = from, outcome = %outcome, "conditional edge resolved");
                self.callback.handle_edge_exit(from, transcript, &outcome).await;
                Ok(outcome)
            }
        }
    }
}

impl fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("entry", &self.entry)
            .field("nodes", &self.node_names())
            .field("edges", &self.edges)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
