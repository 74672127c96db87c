//! Scripted gateway
//!
//! Deterministic [`LlmGateway`] that replays queued answers and records every
//! request it receives. Used by unit and integration tests.

use crate::gateway::{GatewayError, InvokeRequest, LlmGateway, LlmResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

type Responder = dyn Fn(&InvokeRequest) -> Result<LlmResponse, GatewayError> + Send + Sync;

/// Gateway that answers from a queue, then from an optional responder
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    queue: Arc<Mutex<VecDeque<Result<LlmResponse, GatewayError>>>>,
    requests: Arc<Mutex<Vec<InvokeRequest>>>,
    responder: Option<Arc<Responder>>,
}

impl std::fmt::Debug for ScriptedGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedGateway")
            .field("queued", &lock(&self.queue).len())
            .field("calls", &lock(&self.requests).len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedGateway {
    /// Empty gateway; every call fails until answers are queued
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway whose every call fails with a transport error (simulated outage)
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_responder(move |_| Err(GatewayError::Transport(message.clone())))
    }

    /// Gateway that computes answers from the request once the queue is empty
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&InvokeRequest) -> Result<LlmResponse, GatewayError> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Arc::new(responder)),
            ..Self::default()
        }
    }

    /// Queue a structured answer
    pub fn push_json(&self, value: Value) -> &Self {
        lock(&self.queue).push_back(Ok(LlmResponse::Structured(value)));
        self
    }

    /// Queue a free-text answer
    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        lock(&self.queue).push_back(Ok(LlmResponse::Text(text.into())));
        self
    }

    /// Queue a failure
    pub fn push_error(&self, error: GatewayError) -> &Self {
        lock(&self.queue).push_back(Err(error));
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<InvokeRequest> {
        lock(&self.requests).clone()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn invoke(&self, request: InvokeRequest) -> Result<LlmResponse, GatewayError> {
        lock(&self.requests).push(request.clone());

        if let Some(answer) = lock(&self.queue).pop_front() {
            return answer;
        }
        match &self.responder {
            Some(responder) => responder(&request),
            None => Err(GatewayError::Transport(
                "scripted gateway has no answer queued".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queue_then_responder() {
        let gateway = ScriptedGateway::with_responder(|req| {
            Ok(LlmResponse::Text(format!("echo: {}", req.prompt)))
        });
        gateway.push_json(json!({"a": 1}));

        let first = gateway.invoke(InvokeRequest::text("one")).await.unwrap();
        let second = gateway.invoke(InvokeRequest::text("two")).await.unwrap();

        assert_eq!(first, LlmResponse::Structured(json!({"a": 1})));
        assert_eq!(second, LlmResponse::Text("echo: two".to_string()));
        assert_eq!(gateway.call_count(), 2);
        assert_eq!(gateway.requests()[1].prompt, "two");
    }

    #[tokio::test]
    async fn test_failing_gateway_always_errors() {
        let gateway = ScriptedGateway::failing("outage");
        for _ in 0..3 {
            assert!(gateway.invoke(InvokeRequest::text("x")).await.is_err());
        }
        assert_eq!(gateway.call_count(), 3);
    }
}
