//! Registry of detached generation tasks
//!
//! Retains the `JoinHandle` of every spawned generation keyed by record
//! id, so cancellation or a timeout can be bolted on later without
//! touching the polling contract.

use dashmap::DashMap;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Default)]
pub struct TaskRegistry {
    tasks: DashMap<Uuid, JoinHandle<()>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Uuid, handle: JoinHandle<()>) {
        self.tasks.insert(id, handle);
    }

    /// Whether the task for this id is still running
    pub fn is_running(&self, id: Uuid) -> bool {
        self.tasks.get(&id).map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Number of tasks ever registered and not yet joined
    pub fn tracked(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for the task with this id to finish, removing it from the
    /// registry; a no-op for unknown ids
    pub async fn join(&self, id: Uuid) {
        if let Some((_, handle)) = self.tasks.remove(&id) {
            let _ = handle.await;
        }
    }
}
