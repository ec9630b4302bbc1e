use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clipt::prelude::*;
use clipt::{AgentConfig, StreamConfig};
use clipt_llm::{CompletionStream, GenerateRequest, StreamEvent};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct ScriptedClient {
    turns: Mutex<VecDeque<Vec<StreamEvent>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedClient {
    fn new(turns: Vec<Vec<StreamEvent>>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
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
        // Yield between deltas so concurrent runs interleave
        let events = futures::stream::iter(turn.into_iter().map(Ok::<_, anyhow::Error>)).then(|event| async move {
            tokio::task::yield_now().await;
            event
        });
        Ok(Box::pin(events))
    }
}

struct StalledClient;

#[async_trait]
impl ModelClient for StalledClient {
    async fn generate_stream(&self, _request: GenerateRequest) -> Result<CompletionStream> {
        Ok(Box::pin(futures::stream::pending::<Result<StreamEvent>>()))
    }
}

struct Weather(&'static str);

#[async_trait]
impl Tool for Weather {
    fn name(&self) -> &str {
        "WebSearch"
    }

    fn description(&self) -> &str {
        "Looks up the weather"
    }

    async fn call(&self, _cancel: &CancellationToken, _arguments: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

fn text(chunks: &[&str]) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = chunks.iter().map(|c| StreamEvent::text(*c)).collect();
    events.push(StreamEvent::done());
    events
}

fn search(city: &str) -> Vec<StreamEvent> {
    vec![
        StreamEvent::tool_call(0, "call-1", "WebSearch", format!(r#"{{"query":"{}"}}"#, city)),
        StreamEvent::done(),
    ]
}

fn weather_script(city: &str, answer: &str) -> Vec<Vec<StreamEvent>> {
    vec![
        text(&["I need ", "the forecast."]),
        search(city),
        text(&["Final Answer:", answer, " [FINISH]"]),
    ]
}

/// Weather run whose answer streams as `"Final:"` followed by `chunks` pieces
fn long_answer_script(chunks: usize) -> (Vec<Vec<StreamEvent>>, String) {
    let mut answer = vec!["Final:".to_string()];
    answer.extend((0..chunks).map(|i| format!(" {}", i)));
    answer.push(" [FINISH]".to_string());

    let pieces: Vec<&str> = answer.iter().map(String::as_str).collect();
    let turns = vec![text(&["Checking."]), search("Paris"), text(&pieces)];
    (turns, answer.concat())
}

fn with_sink_capacity(capacity: usize) -> AgentConfig {
    AgentConfig {
        stream: StreamConfig {
            sink_capacity: capacity,
            ..StreamConfig::default()
        },
        ..AgentConfig::default()
    }
}

fn collector() -> (Arc<Mutex<String>>, impl FnMut(String) + Send + 'static) {
    let out = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&out);
    (out, move |chunk: String| sink.lock().unwrap().push_str(&chunk))
}

#[tokio::test]
async fn test_run_streams_only_the_final_answer() {
    let client = ScriptedClient::new(weather_script("Paris", " Sunny."));
    let agent = Agent::new(
        client.clone(),
        vec![Arc::new(Weather("sunny")) as Arc<dyn Tool>],
        Arc::new(NoopCallback),
    )
    .unwrap();

    let (out, consumer) = collector();
    let handle = agent.stream(CancellationToken::new(), consumer).unwrap();

    agent
        .run(&CancellationToken::new(), "What's the weather in Paris?")
        .await
        .unwrap();

    // Dropping the agent closes the sink once buffered chunks are drained
    drop(agent);
    handle.await.unwrap();

    assert_eq!(*out.lock().unwrap(), "Final Answer: Sunny. [FINISH]");

    let requests = client.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].messages[0].text().unwrap().contains("[FINISH]"));
    assert_eq!(requests[0].messages[1].text(), Some("What's the weather in Paris?"));
}

#[tokio::test]
async fn test_run_without_consumer_completes() {
    let (mut turns, _) = long_answer_script(21);
    turns.extend(long_answer_script(21).0);
    let agent = Agent::builder()
        .client(ScriptedClient::new(turns))
        .tool(Arc::new(Weather("sunny")))
        .config(with_sink_capacity(4))
        .build()
        .unwrap();

    let cancel = CancellationToken::new();
    for input in ["first", "second"] {
        let result = tokio::time::timeout(Duration::from_secs(3), agent.run(&cancel, input)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }
    assert!(!agent.gate().is_attached());
}

#[tokio::test]
async fn test_full_sink_delivers_every_chunk() {
    let (turns, expected) = long_answer_script(30);
    let agent = Agent::builder()
        .client(ScriptedClient::new(turns))
        .tool(Arc::new(Weather("sunny")))
        .config(with_sink_capacity(1))
        .build()
        .unwrap();

    let (out, consumer) = collector();
    let handle = agent.stream(CancellationToken::new(), consumer).unwrap();

    agent.run(&CancellationToken::new(), "Weather?").await.unwrap();

    drop(agent);
    handle.await.unwrap();
    assert_eq!(*out.lock().unwrap(), expected);
}

#[tokio::test]
async fn test_cancel_after_run_drains_buffered_output() {
    let (turns, expected) = long_answer_script(5);
    let agent = Agent::new(
        ScriptedClient::new(turns),
        vec![Arc::new(Weather("sunny")) as Arc<dyn Tool>],
        Arc::new(NoopCallback),
    )
    .unwrap();

    let cancel = CancellationToken::new();
    let (out, consumer) = collector();
    let handle = agent.stream(cancel.clone(), consumer).unwrap();

    agent.run(&cancel, "Weather?").await.unwrap();
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(*out.lock().unwrap(), expected);

    // The sink is closed now; later output is dropped without blocking
    agent.gate().feed("Final: too late").await;
    assert_eq!(*out.lock().unwrap(), expected);
}

#[tokio::test]
async fn test_concurrent_agents_are_isolated() {
    let paris = ScriptedClient::new(weather_script("Paris", " Sunny in Paris."));
    let oslo = ScriptedClient::new(weather_script("Oslo", " Snow in Oslo."));

    let agent_a = Agent::new(paris.clone(), vec![Arc::new(Weather("sunny")) as Arc<dyn Tool>], Arc::new(NoopCallback)).unwrap();
    let agent_b = Agent::new(oslo.clone(), vec![Arc::new(Weather("snow")) as Arc<dyn Tool>], Arc::new(NoopCallback)).unwrap();

    let (out_a, consumer_a) = collector();
    let (out_b, consumer_b) = collector();
    let handle_a = agent_a.stream(CancellationToken::new(), consumer_a).unwrap();
    let handle_b = agent_b.stream(CancellationToken::new(), consumer_b).unwrap();

    let cancel = CancellationToken::new();
    let (a, b) = tokio::join!(
        agent_a.run(&cancel, "Weather in Paris?"),
        agent_b.run(&cancel, "Weather in Oslo?"),
    );
    a.unwrap();
    b.unwrap();

    drop(agent_a);
    drop(agent_b);
    handle_a.await.unwrap();
    handle_b.await.unwrap();

    assert_eq!(*out_a.lock().unwrap(), "Final Answer: Sunny in Paris. [FINISH]");
    assert_eq!(*out_b.lock().unwrap(), "Final Answer: Snow in Oslo. [FINISH]");

    // The observe request carries that run's whole transcript
    let observe_a = &paris.requests()[2];
    let observe_b = &oslo.requests()[2];
    assert_eq!(observe_a.messages[1].text(), Some("Weather in Paris?"));
    assert_eq!(observe_b.messages[1].text(), Some("Weather in Oslo?"));
    assert_eq!(
        observe_a.messages[4].tool_responses().next().unwrap().content,
        "sunny"
    );
    assert_eq!(
        observe_b.messages[4].tool_responses().next().unwrap().content,
        "snow"
    );
}

#[tokio::test]
async fn test_second_run_resets_the_gate() {
    let mut turns = weather_script("Paris", " Sunny.");
    turns.extend(vec![
        text(&["still thinking"]),
        text(&["no tools"]),
        text(&["Final Answer:", " Again.", " [FINISH]"]),
    ]);
    let client = ScriptedClient::new(turns);
    let agent = Agent::new(client, vec![Arc::new(Weather("sunny")) as Arc<dyn Tool>], Arc::new(NoopCallback)).unwrap();

    let (out, consumer) = collector();
    let handle = agent.stream(CancellationToken::new(), consumer).unwrap();

    let cancel = CancellationToken::new();
    agent.run(&cancel, "first").await.unwrap();
    agent.run(&cancel, "second").await.unwrap();

    drop(agent);
    handle.await.unwrap();

    assert_eq!(
        *out.lock().unwrap(),
        "Final Answer: Sunny. [FINISH]Final Answer: Again. [FINISH]"
    );
}

#[tokio::test]
async fn test_only_one_stream_consumer() {
    let agent = Agent::new(ScriptedClient::new(vec![]), vec![], Arc::new(NoopCallback)).unwrap();

    let first = agent.stream(CancellationToken::new(), |_| {}).unwrap();
    assert!(agent.stream(CancellationToken::new(), |_| {}).is_err());

    drop(agent);
    first.await.unwrap();
}

#[tokio::test]
async fn test_stream_stops_on_cancel() {
    let agent = Agent::new(ScriptedClient::new(vec![]), vec![], Arc::new(NoopCallback)).unwrap();

    let cancel = CancellationToken::new();
    let handle = agent.stream(cancel.clone(), |_| {}).unwrap();
    cancel.cancel();

    // Ends although the agent, and so the sink, is still alive
    handle.await.unwrap();
    agent.gate().feed("Final: after the consumer left").await;
}

#[tokio::test]
async fn test_run_cancellation() {
    let agent = Agent::new(Arc::new(StalledClient), vec![], Arc::new(NoopCallback)).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = agent.run(&cancel, "hang").await.unwrap_err();
    assert!(matches!(err, GraphError::Cancelled));
}

#[tokio::test]
async fn test_step_limit_from_config() {
    let client = ScriptedClient::new(vec![
        text(&["a"]),
        text(&["b"]),
        text(&["c"]),
        text(&["d"]),
    ]);
    let config = AgentConfig {
        max_steps: 4,
        ..AgentConfig::default()
    };
    let agent = Agent::builder().client(client).config(config).build().unwrap();

    let err = agent.run(&CancellationToken::new(), "loop").await.unwrap_err();
    assert!(matches!(err, GraphError::MaxStepsExceeded { max: 4 }));
}

#[test]
fn test_builder_requires_client() {
    let err = AgentBuilder::new().build().err().unwrap();
    assert!(err.to_string().contains("Model client is required"));
}

#[test]
fn test_builder_rejects_zero_steps() {
    let config = AgentConfig {
        max_steps: 0,
        ..AgentConfig::default()
    };
    let result = AgentBuilder::new()
        .client(ScriptedClient::new(vec![]))
        .config(config)
        .build();
    assert!(result.is_err());
}

#[test]
fn test_tools_are_registered_by_name() {
    let agent = AgentBuilder::new()
        .client(ScriptedClient::new(vec![]))
        .tool(Arc::new(Weather("first")))
        .tool(Arc::new(Weather("second")))
        .build()
        .unwrap();

    assert_eq!(agent.tools().names(), vec!["WebSearch"]);
    assert_eq!(agent.graph().entry(), "reason");
}
