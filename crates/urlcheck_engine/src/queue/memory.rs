use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::Notify;
use tokio::time::Instant;

use super::{QueueConnector, QueueError, Task, TaskQueue};

#[derive(Debug, Default)]
struct Tube {
    ready: VecDeque<Task>,
    taken: HashMap<String, Task>,
    acked: Vec<Task>,
    buried: Vec<Task>,
}

#[derive(Debug, Default)]
struct Shared {
    tubes: Mutex<HashMap<String, Tube>>,
    notify: Notify,
    next_id: AtomicU64,
}

/// In-process queue. Handles made with [`MemoryQueue::for_tube`] share storage,
/// so a checker's input and output tubes can be observed from one place.
#[derive(Debug, Clone)]
pub struct MemoryQueue {
    tube: String,
    shared: Arc<Shared>,
}

impl MemoryQueue {
    pub fn new(tube: impl Into<String>) -> Self {
        Self {
            tube: tube.into(),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Another handle on the same storage, taking from `tube`.
    pub fn for_tube(&self, tube: impl Into<String>) -> Self {
        Self {
            tube: tube.into(),
            shared: self.shared.clone(),
        }
    }

    pub fn tube(&self) -> &str {
        &self.tube
    }

    /// Enqueue without awaiting; returns the new task id.
    pub fn push(&self, tube: &str, payload: Map<String, Value>) -> String {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = id.to_string();
        self.tubes()
            .entry(tube.to_string())
            .or_default()
            .ready
            .push_back(Task::new(id.clone(), tube, payload));
        self.shared.notify.notify_waiters();
        id
    }

    pub fn ready(&self, tube: &str) -> Vec<Map<String, Value>> {
        self.inspect(tube, |t| t.ready.iter().map(|task| task.payload.clone()).collect())
    }

    pub fn acked(&self, tube: &str) -> Vec<Task> {
        self.inspect(tube, |t| t.acked.clone())
    }

    pub fn buried(&self, tube: &str) -> Vec<Task> {
        self.inspect(tube, |t| t.buried.clone())
    }

    pub fn taken_len(&self, tube: &str) -> usize {
        self.inspect(tube, |t| t.taken.len())
    }

    fn inspect<T: Default>(&self, tube: &str, f: impl FnOnce(&Tube) -> T) -> T {
        self.tubes().get(tube).map(f).unwrap_or_default()
    }

    fn tubes(&self) -> MutexGuard<'_, HashMap<String, Tube>> {
        self.shared.tubes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pop_ready(&self) -> Option<Task> {
        let mut tubes = self.tubes();
        let tube = tubes.get_mut(&self.tube)?;
        let task = tube.ready.pop_front()?;
        tube.taken.insert(task.id.clone(), task.clone());
        Some(task)
    }

    fn settle(&self, task: &Task, bury: bool) -> Result<(), QueueError> {
        let mut tubes = self.tubes();
        let taken = tubes
            .get_mut(&task.tube)
            .and_then(|tube| tube.taken.remove(&task.id).map(|taken| (tube, taken)));
        match taken {
            Some((tube, taken)) if bury => tube.buried.push(taken),
            Some((tube, taken)) => tube.acked.push(taken),
            None => return Err(QueueError::NotTaken(task.id.clone())),
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskQueue for MemoryQueue {
    async fn take(&self, timeout: Duration) -> Result<Option<Task>, QueueError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register interest before checking so a concurrent push is not missed.
            let notified = self.shared.notify.notified();
            if let Some(task) = self.pop_ready() {
                return Ok(Some(task));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || tokio::time::timeout(remaining, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ack(&self, task: &Task) -> Result<(), QueueError> {
        self.settle(task, false)
    }

    async fn bury(&self, task: &Task) -> Result<(), QueueError> {
        self.settle(task, true)
    }

    async fn put(&self, tube: &str, payload: Map<String, Value>) -> Result<(), QueueError> {
        self.push(tube, payload);
        Ok(())
    }
}

#[async_trait::async_trait]
impl QueueConnector for MemoryQueue {
    async fn connect(&self) -> Result<Arc<dyn TaskQueue>, QueueError> {
        Ok(Arc::new(self.clone()))
    }
}
