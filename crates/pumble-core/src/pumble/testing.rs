//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::pumble::transport::{ApiRequest, Transport};
use crate::{CoreError, Result};

/// Answers requests from a queue and records every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Value>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    /// Reply with `bodies` in order.
    pub fn replying(bodies: impl IntoIterator<Item = Value>) -> Self {
        Self {
            replies: Mutex::new(bodies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failure with the given status after the current replies.
    pub fn then_fail(self, status: u16, body: &str) -> Self {
        self.replies
            .lock()
            .expect("reply queue")
            .push_back(Err(CoreError::Transport {
                operation: "scripted".to_string(),
                status,
                body: body.to_string(),
            }));
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        self.requests.lock().expect("request log").push(request);
        self.replies
            .lock()
            .expect("reply queue")
            .pop_front()
            .unwrap_or_else(|| Err(CoreError::Http("no scripted reply left".to_string())))
    }
}
