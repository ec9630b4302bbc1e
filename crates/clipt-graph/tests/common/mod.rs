#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clipt_graph::{Callback, Tool};
use clipt_llm::{CompletionStream, GenerateRequest, ModelClient, StreamEvent, Transcript};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Replays one scripted turn per call, recording every request
#[derive(Default)]
pub struct ScriptedClient {
    turns: Mutex<VecDeque<Vec<StreamEvent>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedClient {
    pub fn new(turns: Vec<Vec<StreamEvent>>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn generate_stream(&self, request: GenerateRequest) -> Result<CompletionStream> {
        self.requests.lock().unwrap().push(request);
        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted"))?;
        let events: Vec<Result<StreamEvent>> = turn.into_iter().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

/// Never yields anything
pub struct StalledClient;

#[async_trait]
impl ModelClient for StalledClient {
    async fn generate_stream(&self, _request: GenerateRequest) -> Result<CompletionStream> {
        Ok(Box::pin(futures::stream::pending::<Result<StreamEvent>>()))
    }
}

pub struct FailingClient;

#[async_trait]
impl ModelClient for FailingClient {
    async fn generate_stream(&self, _request: GenerateRequest) -> Result<CompletionStream> {
        Err(anyhow!("upstream unavailable"))
    }
}

/// Text turn delivered in the given chunks
pub fn text_turn(chunks: &[&str]) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = chunks.iter().map(|c| StreamEvent::text(*c)).collect();
    events.push(StreamEvent::done());
    events
}

/// Turn with optional text and a single complete tool call
pub fn tool_turn(text: &str, id: &str, name: &str, arguments: &str) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    if !text.is_empty() {
        events.push(StreamEvent::text(text));
    }
    events.push(StreamEvent::tool_call(0, id, name, arguments));
    events.push(StreamEvent::done());
    events
}

/// Replies with a fixed string and counts its calls
pub struct FixedTool {
    pub name: &'static str,
    pub reply: &'static str,
    pub calls: AtomicUsize,
}

impl FixedTool {
    pub fn new(name: &'static str, reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for FixedTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "returns a fixed reply"
    }

    async fn call(&self, _cancel: &CancellationToken, _arguments: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.to_string())
    }
}

pub struct BrokenTool;

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "Broken"
    }

    fn description(&self) -> &str {
        "always fails"
    }

    async fn call(&self, _cancel: &CancellationToken, _arguments: &str) -> Result<String> {
        Err(anyhow!("disk on fire"))
    }
}

/// Records every callback as a readable event string
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Callback for EventLog {
    async fn handle_node_start(&self, node: &str, _transcript: &Transcript) {
        self.push(format!("start:{}", node));
    }

    async fn handle_node_end(&self, node: &str, _transcript: &Transcript) {
        self.push(format!("end:{}", node));
    }

    async fn handle_node_stream(&self, node: &str, chunk: &str) {
        self.push(format!("stream:{}:{}", node, chunk));
    }

    async fn handle_edge_entry(&self, edge: &str, _transcript: &Transcript) {
        self.push(format!("edge-entry:{}", edge));
    }

    async fn handle_edge_exit(&self, edge: &str, _transcript: &Transcript, outcome: &str) {
        self.push(format!("edge-exit:{}:{}", edge, outcome));
    }
}
