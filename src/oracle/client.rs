//! Oracle trait and a scripted mock

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::types::{OracleError, OracleRequest};

/// Stateless oracle - each consultation is independent
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Submit one request and return the raw structured reply
    async fn consult(&self, request: OracleRequest) -> Result<Value, OracleError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

type Responder = Box<dyn Fn(&OracleRequest) -> Result<Value, OracleError> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<Result<Value, OracleError>>>),
    Responder(Responder),
}

/// Test oracle driven by a fixed queue of replies or a closure
pub struct MockOracle {
    script: Script,
    calls: AtomicUsize,
}

impl MockOracle {
    /// Answer every request with `responder`
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&OracleRequest) -> Result<Value, OracleError> + Send + Sync + 'static,
    {
        Self {
            script: Script::Responder(Box::new(responder)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Reply with each entry in turn; `Malformed` once exhausted
    pub fn scripted(replies: Vec<Result<Value, OracleError>>) -> Self {
        Self {
            script: Script::Queue(Mutex::new(replies.into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of consultations so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn consult(&self, request: OracleRequest) -> Result<Value, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Responder(responder) => responder(&request),
            Script::Queue(queue) => {
                let next = match queue.lock() {
                    Ok(mut guard) => guard.pop_front(),
                    Err(poisoned) => poisoned.into_inner().pop_front(),
                };
                next.unwrap_or_else(|| Err(OracleError::Malformed("mock script exhausted".to_string())))
            }
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}

impl std::fmt::Debug for MockOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockOracle").field("calls", &self.calls()).finish()
    }
}
