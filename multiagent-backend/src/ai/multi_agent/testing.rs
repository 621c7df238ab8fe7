//! Hand-written stand-ins for the router's collaborators

use super::error::RouterError;
use super::executors::{AgentExecutor, ExecutionContext};
use super::registry::AgentRegistry;
use super::classifier::Classify;
use super::types::{AgentKind, AgentResult, Task};
use crate::ai::{LanguageModel, Message};
use crate::auth::TokenProvider;
use crate::integrations::{AgentHttpClient, AgentRequest, AgentResponse, SampleOpener, TabularSampleReader};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Cursor, Read};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Executor returning a fixed result, optionally after a delay
pub struct StubExecutor {
    kind: AgentKind,
    result: AgentResult,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<Task>>,
}

impl StubExecutor {
    pub fn new(kind: AgentKind, result: AgentResult) -> Self {
        Self {
            kind,
            result,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn arc(kind: AgentKind, result: AgentResult) -> Arc<Self> {
        Arc::new(Self::new(kind, result))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentExecutor for StubExecutor {
    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn execute(&self, task: &Task, _context: &ExecutionContext) -> AgentResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(task.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// Model returning scripted replies and remembering prompts
pub struct StubModel {
    reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(reason.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        let prompt = messages
            .into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().push(prompt);
        self.reply.clone()
    }
}

/// Classifier returning a fixed outcome
pub struct StubClassifier {
    outcome: Result<Vec<Task>, RouterError>,
}

impl StubClassifier {
    pub fn tasks(tasks: Vec<Task>) -> Arc<Self> {
        Arc::new(Self { outcome: Ok(tasks) })
    }

    pub fn error(err: RouterError) -> Arc<Self> {
        Arc::new(Self { outcome: Err(err) })
    }
}

#[async_trait]
impl Classify for StubClassifier {
    async fn classify(&self, _input: &str, _registry: &AgentRegistry) -> Result<Vec<Task>, RouterError> {
        self.outcome.clone()
    }
}

pub struct StubTokens {
    token: Result<String, String>,
}

impl StubTokens {
    pub fn ok(token: &str) -> Arc<Self> {
        Arc::new(Self { token: Ok(token.to_string()) })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self { token: Err(reason.to_string()) })
    }
}

#[async_trait]
impl TokenProvider for StubTokens {
    async fn acquire(&self) -> Result<String, String> {
        self.token.clone()
    }
}

/// HTTP client answering from a queue and recording every request
pub struct StubHttp {
    replies: Mutex<VecDeque<Result<AgentResponse, String>>>,
    pub requests: Mutex<Vec<AgentRequest>>,
}

impl StubHttp {
    pub fn with_replies(replies: Vec<Result<AgentResponse, String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

pub fn reply(status: u16, body: &str) -> Result<AgentResponse, String> {
    Ok(AgentResponse {
        status,
        body: body.to_string(),
    })
}

#[async_trait]
impl AgentHttpClient for StubHttp {
    async fn submit(&self, request: AgentRequest) -> Result<AgentResponse, String> {
        self.requests.lock().push(request);
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted reply".to_string()))
    }
}

/// Serves in-memory sample bytes and counts handle opens and releases
#[derive(Default)]
pub struct CountingOpener {
    pub opened: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
}

struct CountedHandle {
    inner: Cursor<Vec<u8>>,
    released: Arc<AtomicUsize>,
}

impl Read for CountedHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for CountedHandle {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl CountingOpener {
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl SampleOpener for CountingOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        if path.to_string_lossy().contains("missing") {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such sample"));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountedHandle {
            inner: Cursor::new(format!("sample from {}", path.display()).into_bytes()),
            released: Arc::clone(&self.released),
        }))
    }
}

pub struct StubReader(pub String);

impl TabularSampleReader for StubReader {
    fn read(&self, _path: &Path) -> String {
        self.0.clone()
    }
}
