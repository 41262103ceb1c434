//! Scripted oracle for tests and offline runs

use crate::error::{Result, TailorError};
use crate::llm::{Oracle, OracleTask};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replies with queued responses per task. The last queued response of a
/// task is repeated once the queue is down to one entry.
#[derive(Default)]
pub struct MockOracle {
    responses: Mutex<HashMap<OracleTask, VecDeque<Value>>>,
    calls: Mutex<Vec<(OracleTask, Value)>>,
    call_count: AtomicUsize,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, task: OracleTask, response: Value) -> Self {
        self.push_response(task, response);
        self
    }

    pub fn push_response(&self, task: OracleTask, response: Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.entry(task).or_default().push_back(response);
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Payloads received so far, in call order.
    pub fn calls(&self) -> Vec<(OracleTask, Value)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, task: OracleTask) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(t, _)| *t == task)
            .map(|(_, payload)| payload)
            .collect()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    fn id(&self) -> &str {
        "mock"
    }

    async fn generate(&self, task: OracleTask, payload: &Value) -> Result<Value> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((task, payload.clone()));
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| TailorError::Oracle("mock oracle state is poisoned".to_string()))?;
        let queue = responses
            .get_mut(&task)
            .ok_or_else(|| TailorError::Oracle(format!("no scripted response for {}", task)))?;

        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| TailorError::Oracle(format!("no scripted response for {}", task)))
    }
}
