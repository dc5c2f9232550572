//! Test doubles for the Lark transport and clock.
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::services::lark::client::{
    LarkTransport, TransportError, TransportResult, UpstreamRequest,
};
use crate::services::lark::clock::Clock;

/// Transport that replays queued responses per path and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<&'static str, VecDeque<TransportResult<Value>>>>,
    requests: Mutex<Vec<UpstreamRequest>>,
    delay: Option<Duration>,
    tick: Option<(Arc<ManualClock>, i64)>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every response is held back by `delay`, so concurrent callers overlap.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Every call moves `clock` forward by `step_ms`, as a slow upstream would.
    pub fn ticking(clock: Arc<ManualClock>, step_ms: i64) -> Self {
        Self {
            tick: Some((clock, step_ms)),
            ..Self::default()
        }
    }

    pub fn push(&self, path: &'static str, response: Value) {
        self.enqueue(path, Ok(response));
    }

    pub fn push_err(&self, path: &'static str, error: TransportError) {
        self.enqueue(path, Err(error));
    }

    fn enqueue(&self, path: &'static str, response: TransportResult<Value>) {
        self.responses
            .lock()
            .unwrap()
            .entry(path)
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LarkTransport for ScriptedTransport {
    fn backend_name(&self) -> &'static str {
        "scripted"
    }

    async fn send(&self, request: UpstreamRequest) -> TransportResult<Value> {
        let path = request.path;
        self.requests.lock().unwrap().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((clock, step_ms)) = &self.tick {
            clock.advance(*step_ms);
        }

        self.responses
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(TransportError::Http(format!("no scripted response for {path}"))))
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self(AtomicI64::new(now_ms))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by_ms: i64) {
        self.0.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
