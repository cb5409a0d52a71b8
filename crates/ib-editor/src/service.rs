//! The idea service contract and an async driver for it.
//!
//! The engine never awaits. It queues [`ServiceRequest`]s; whoever owns the
//! network (the browser host through the WASM bridge, or [`drive`] over an
//! [`IdeaService`] implementation) performs the calls and hands results back
//! through `CanvasEngine::resolve_*`.

use crate::engine::CanvasEngine;
use crate::orchestrator::{Outcome, ServiceRequest};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineResponse {
    pub combined_topic: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandResponse {
    #[serde(default)]
    pub expansions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicsResponse {
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Any failure of the backing service. The engine treats every variant the
/// same way.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl CombineResponse {
    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ExpandResponse {
    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TopicsResponse {
    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Text-in, text-out idea service (typically an LLM behind HTTP).
#[allow(async_fn_in_trait)]
pub trait IdeaService {
    async fn combine(&self, text1: &str, text2: &str, context: Option<&str>) -> Result<CombineResponse, ServiceError>;

    async fn expand(&self, text: &str, context: Option<&str>) -> Result<ExpandResponse, ServiceError>;

    async fn generate_topics(&self, context: &str) -> Result<TopicsResponse, ServiceError>;
}

/// Perform one queued request and feed the result back. The engine is only
/// borrowed before and after the await.
pub async fn run_request<S: IdeaService>(
    engine: &RefCell<CanvasEngine>,
    service: &S,
    request: ServiceRequest,
    now: &dyn Fn() -> f64,
) -> Outcome {
    match request {
        ServiceRequest::Combine {
            op,
            text1,
            text2,
            context,
        } => {
            let result = service.combine(&text1, &text2, context.as_deref()).await;
            engine.borrow_mut().resolve_combine(op, result, now())
        }
        ServiceRequest::Expand { op, text, context } => {
            let result = service.expand(&text, context.as_deref()).await;
            engine.borrow_mut().resolve_expand(op, result, now())
        }
        ServiceRequest::Generate { op, context } => {
            let result = service.generate_topics(&context).await;
            engine.borrow_mut().resolve_generation(op, result, now())
        }
    }
}

/// Drain the outbox until no requests remain, one call at a time.
/// Returns the outcome of every call in the order they completed.
pub async fn drive<S: IdeaService>(
    engine: &RefCell<CanvasEngine>,
    service: &S,
    now: &dyn Fn() -> f64,
) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    loop {
        let requests = engine.borrow_mut().take_requests();
        if requests.is_empty() {
            break;
        }
        for request in requests {
            outcomes.push(run_request(engine, service, request, now).await);
        }
    }
    outcomes
}
