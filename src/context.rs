//! Per-call logging context.
//!
//! Each tool invocation gets a [`CallContext`] carrying a short request id.
//! It is passed to handlers explicitly and attached to every log line through
//! a `tracing` span.

use crate::error::DbResult;
use std::future::Future;
use std::time::Instant;
use tracing::{Instrument, Span, debug, info_span, warn};

/// Length of the hex request id.
const REQUEST_ID_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct CallContext {
    request_id: String,
    operation: &'static str,
    started: Instant,
}

impl CallContext {
    pub fn new(operation: &'static str) -> Self {
        let mut request_id = uuid::Uuid::new_v4().simple().to_string();
        request_id.truncate(REQUEST_ID_LEN);
        Self {
            request_id,
            operation,
            started: Instant::now(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn span(&self) -> Span {
        info_span!("tool", request_id = %self.request_id, operation = self.operation)
    }

    /// Run `fut` inside this call's span and log how it ended.
    pub async fn observe<T, F>(&self, fut: F) -> DbResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        let span = self.span();
        let result = fut.instrument(span.clone()).await;
        let _entered = span.enter();
        match &result {
            Ok(_) => debug!(duration_ms = self.elapsed_ms(), "Tool call succeeded"),
            Err(e) => warn!(duration_ms = self.elapsed_ms(), error = %e, "Tool call failed"),
        }
        result
    }
}
