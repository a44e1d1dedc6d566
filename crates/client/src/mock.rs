//! In-memory transport for tests
//!
//! Replies are scripted up front and consumed in order; every executed
//! request is recorded for inspection.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::error::{TransportError, TransportErrorKind};
use crate::request::{PendingRequest, RawResponse};
use crate::transport::Transport;

enum ScriptedReply {
    Response(RawResponse),
    Failure(TransportErrorKind, String),
}

/// Transport that replays scripted responses
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<PendingRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response with the given status and raw body
    pub fn respond(&self, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.push(ScriptedReply::Response(RawResponse::new(status, body)));
        self
    }

    /// Queues a response with a JSON body
    pub fn respond_json(&self, status: u16, body: &serde_json::Value) -> &Self {
        self.respond(status, body.to_string())
    }

    /// Queues a transport failure
    pub fn fail(&self, kind: TransportErrorKind, message: impl Into<String>) -> &Self {
        self.push(ScriptedReply::Failure(kind, message.into()));
        self
    }

    /// Every request executed so far, oldest first
    pub fn requests(&self) -> Vec<PendingRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<PendingRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Number of scripted replies not consumed yet
    pub fn pending_replies(&self) -> usize {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self, reply: ScriptedReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: PendingRequest) -> Result<RawResponse, TransportError> {
        let method = request.method().to_string();
        let path = request.path();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match reply {
            Some(ScriptedReply::Response(response)) => Ok(response),
            Some(ScriptedReply::Failure(kind, message)) => {
                Err(TransportError::new(kind, method, path, message))
            }
            None => Err(TransportError::new(
                TransportErrorKind::Other,
                method,
                path,
                "no scripted response left",
            )),
        }
    }
}
