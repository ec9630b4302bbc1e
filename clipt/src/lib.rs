//! # Clipt - ReAct agent engine for Rust
//!
//! Clipt drives a language model through a compiled
//! `reason → act → (execute | observe) → (END | reason)` graph:
//! - **Graph runtime** with compile-time validation, a step cap and cancellation
//! - **Tool dispatch** through a name-keyed registry
//! - **Gated streaming** that only forwards output after a final-answer keyword
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clipt::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo(client: Arc<dyn ModelClient>, search: Arc<dyn Tool>) -> anyhow::Result<()> {
//! let agent = Agent::new(client, vec![search], Arc::new(NoopCallback))?;
//!
//! let cancel = CancellationToken::new();
//! let printer = agent.stream(cancel.clone(), |chunk| print!("{}", chunk))?;
//!
//! agent.run(&cancel, "What's the weather in Paris?").await?;
//! // Closes the stream; anything still buffered is printed first
//! cancel.cancel();
//! printer.await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **clipt-llm**: message model, transcript and the model-client contract
//! - **clipt-graph**: graph engine, tools, callbacks, stream gate, prebuilt graphs
//! - **clipt** (this crate): `Agent`, `AgentBuilder`, configuration and logging

// Re-export all public APIs
pub use clipt_graph as graph;
pub use clipt_llm as llm;

pub mod agent;
pub mod config;
pub mod logging;

/// High-level builder for creating agents
pub mod builder;

pub use agent::Agent;
pub use builder::AgentBuilder;
pub use config::{AgentConfig, LoggingConfig, StreamConfig};
pub use logging::init_logging;

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::agent::Agent;
    pub use crate::builder::AgentBuilder;
    pub use crate::config::AgentConfig;
    pub use crate::graph::{
        Callback, GraphError, LoggingCallback, NoopCallback, StreamGate, Tool, ToolRegistry,
        UnknownToolPolicy,
    };
    pub use crate::llm::{Message, ModelClient, Transcript};
    pub use anyhow::Result;
    pub use tokio_util::sync::CancellationToken;
}
