//! Durable work-queue contract and its adapters.
//!
//! Workers only see [`TaskQueue`]: take a task from the handle's own tube,
//! acknowledge or bury it, and put new payloads onto any tube.
mod memory;
mod redis;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

pub use self::memory::MemoryQueue;
pub use self::redis::{RedisConnector, RedisQueue};

/// A unit of work owned by the queue until it is acked or buried.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub tube: String,
    pub payload: Map<String, Value>,
    receipt: String,
}

impl Task {
    pub fn new(id: impl Into<String>, tube: impl Into<String>, payload: Map<String, Value>) -> Self {
        let id = id.into();
        Self {
            receipt: id.clone(),
            id,
            tube: tube.into(),
            payload,
        }
    }

    pub(crate) fn with_receipt(mut self, receipt: String) -> Self {
        self.receipt = receipt;
        self
    }

    /// Adapter-specific handle used to settle the task.
    pub fn receipt(&self) -> &str {
        &self.receipt
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("malformed queue entry: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("task {0} is not held by this consumer")]
    NotTaken(String),
}

#[async_trait::async_trait]
pub trait TaskQueue: Send + Sync {
    /// Wait up to `timeout` for the next task on this handle's tube.
    async fn take(&self, timeout: Duration) -> Result<Option<Task>, QueueError>;
    async fn ack(&self, task: &Task) -> Result<(), QueueError>;
    async fn bury(&self, task: &Task) -> Result<(), QueueError>;
    async fn put(&self, tube: &str, payload: Map<String, Value>) -> Result<(), QueueError>;
}

/// Opens a fresh queue handle; every worker owns its own.
#[async_trait::async_trait]
pub trait QueueConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn TaskQueue>, QueueError>;
}
