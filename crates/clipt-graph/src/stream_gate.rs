//! Keyword-gated forwarding of streamed model output.
//!
//! The gate swallows "thinking" chunks until one of its keywords shows up in
//! the stream, then forwards every following chunk to a bounded sink. The
//! keyword may be split across any number of deliveries: the gate keeps a
//! rolling window as long as the longest keyword and matches against the
//! window plus the incoming chunk.
//!
//! Until a receiver has been taken the sink is unattached and forwarded
//! chunks are dropped, so a run never waits on a consumer that does not
//! exist. Once attached, a full sink applies back-pressure to the run.

use crate::callback::Callback;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Keywords used when a gate is built with an empty list
pub const DEFAULT_KEYWORDS: [&str; 3] = ["Final Answer:", "Final:", "AI:"];

pub const DEFAULT_SINK_CAPACITY: usize = 256;

/// Decides what happens to chunks that arrive after a keyword matched but
/// before forwarding has started.
pub trait MarkerTransform: Send + Sync {
    /// Text to forward for `chunk`, or `None` to keep holding back.
    /// Returning `Some` starts forwarding for the rest of the run.
    fn begin(&self, chunk: &str) -> Option<String>;
}

/// Holds back a lone `":"` chunk trailing a keyword such as `"Final"`.
pub struct LoneColonTrim;

impl MarkerTransform for LoneColonTrim {
    fn begin(&self, chunk: &str) -> Option<String> {
        (chunk != ":").then(|| chunk.to_string())
    }
}

/// Starts forwarding with the chunk that completed the match
pub struct PassThrough;

impl MarkerTransform for PassThrough {
    fn begin(&self, chunk: &str) -> Option<String> {
        Some(chunk.to_string())
    }
}

#[derive(Debug, Default)]
struct GateState {
    buffer: String,
    detected: bool,
    armed: bool,
}

pub struct StreamGate {
    keywords: Vec<String>,
    max_keyword_chars: usize,
    transform: Arc<dyn MarkerTransform>,
    state: Mutex<GateState>,
    sink: mpsc::Sender<String>,
    receiver: Mutex<Option<mpsc::Receiver<String>>>,
    attached: AtomicBool,
}

impl StreamGate {
    /// Gate with the default sink capacity and [`LoneColonTrim`].
    ///
    /// Empty keyword strings are ignored; if none remain the gate falls back
    /// to [`DEFAULT_KEYWORDS`].
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_capacity(keywords, DEFAULT_SINK_CAPACITY)
    }

    pub fn with_capacity<I, S>(keywords: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keywords: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            keywords = DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
        }

        let max_keyword_chars = keywords
            .iter()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or(0);

        let (sink, receiver) = mpsc::channel(capacity.max(1));

        Self {
            keywords,
            max_keyword_chars,
            transform: Arc::new(LoneColonTrim),
            state: Mutex::new(GateState::default()),
            sink,
            receiver: Mutex::new(Some(receiver)),
            attached: AtomicBool::new(false),
        }
    }

    pub fn with_transform(mut self, transform: Arc<dyn MarkerTransform>) -> Self {
        self.transform = transform;
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_armed(&self) -> bool {
        self.lock_state().armed
    }

    /// Clear the detection window; called at the start of every run
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.buffer.clear();
        state.detected = false;
        state.armed = false;
    }

    /// Consume one chunk, forwarding it to the sink if the gate is armed.
    ///
    /// A closed or unattached sink is not an error: the chunk is dropped.
    pub async fn feed(&self, chunk: &str) {
        let Some(forward) = self.admit(chunk) else {
            return;
        };

        if !self.is_attached() {
            tracing::trace!("no stream consumer attached, dropping chunk");
            return;
        }

        if self.sink.send(forward).await.is_err() {
            tracing::debug!("stream sink closed, dropping chunk");
        }
    }

    /// Take the receiving end of the sink. Only the first caller gets it.
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<String>> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()?;
        self.attached.store(true, Ordering::Release);
        Some(receiver)
    }

    /// Whether a consumer has taken the receiver
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    fn admit(&self, chunk: &str) -> Option<String> {
        let mut state = self.lock_state();

        if state.armed {
            return Some(chunk.to_string());
        }

        // Match before trimming so a keyword inside a long chunk is still seen
        state.buffer.push_str(chunk);
        if !state.detected && self.keywords.iter().any(|k| state.buffer.contains(k.as_str())) {
            tracing::debug!("stream gate keyword detected");
            state.detected = true;
        }

        let len = state.buffer.chars().count();
        if len > self.max_keyword_chars {
            let cut = state
                .buffer
                .char_indices()
                .nth(len - self.max_keyword_chars)
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            state.buffer.drain(..cut);
        }

        if !state.detected {
            return None;
        }

        let forward = self.transform.begin(chunk)?;
        state.armed = true;
        Some(forward)
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for StreamGate {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

#[async_trait]
impl Callback for StreamGate {
    async fn handle_node_stream(&self, _node: &str, chunk: &str) {
        self.feed(chunk).await;
    }
}
