//! Offline walkthrough of an agent run.
//!
//! A canned model client stands in for a real provider so the whole
//! reason → act → execute → observe loop can be watched without network
//! access. Run with `RUST_LOG=debug` to see the graph's own logs.

use anyhow::anyhow;
use async_trait::async_trait;
use clipt::llm::{CompletionStream, GenerateRequest, StreamEvent};
use clipt::prelude::*;
use clipt::{init_logging, LoggingConfig};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct CannedClient {
    turns: Mutex<VecDeque<Vec<StreamEvent>>>,
}

#[async_trait]
impl ModelClient for CannedClient {
    async fn generate_stream(&self, _request: GenerateRequest) -> Result<CompletionStream> {
        let turn = self
            .turns
            .lock()
            .map_err(|_| anyhow!("client state poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("no more canned turns"))?;
        Ok(Box::pin(futures::stream::iter(turn.into_iter().map(Ok::<_, anyhow::Error>))))
    }
}

struct WebSearch;

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "WebSearch"
    }

    fn description(&self) -> &str {
        "Performs a web search"
    }

    async fn call(&self, _cancel: &CancellationToken, arguments: &str) -> Result<String> {
        Ok(format!("Results for {}: Paris is sunny, 21°C.", arguments))
    }
}

fn canned_turns() -> Vec<Vec<StreamEvent>> {
    vec![
        vec![
            StreamEvent::text("The user wants current weather, "),
            StreamEvent::text("so a search is needed."),
            StreamEvent::done(),
        ],
        vec![
            StreamEvent::tool_call(0, "call-1", "WebSearch", r#"{"query":"weather Paris"}"#),
            StreamEvent::done(),
        ],
        vec![
            StreamEvent::text("Final"),
            StreamEvent::text(":"),
            StreamEvent::text(" It is sunny in Paris, 21°C."),
            StreamEvent::text("\n[FINISH]"),
            StreamEvent::done(),
        ],
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&LoggingConfig::default());

    let client = Arc::new(CannedClient {
        turns: Mutex::new(canned_turns().into()),
    });

    let agent = AgentBuilder::new()
        .client(client)
        .tool(Arc::new(WebSearch))
        .callback(Arc::new(LoggingCallback))
        .build()?;

    let cancel = CancellationToken::new();
    let printer = agent.stream(cancel.clone(), |chunk| print!("{}", chunk))?;

    agent.run(&cancel, "What's the weather in Paris?").await?;

    drop(agent);
    printer.await?;
    println!();

    Ok(())
}
