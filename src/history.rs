//! Dispatch history (pluggable storage).

use crate::result::DispatchResult;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Stores dispatch results in commit order.
#[async_trait]
pub trait DispatchHistory: Send + Sync {
    /// Append a committed result.
    async fn append(&self, result: &DispatchResult);
    /// List retained results, oldest first.
    async fn list(&self) -> Vec<DispatchResult>;
    /// Clear history.
    async fn clear(&self);
}

/// Bounded in-memory history; the oldest record is dropped when full.
#[derive(Clone)]
pub struct InMemoryHistory {
    entries: Arc<Mutex<VecDeque<DispatchResult>>>,
    capacity: usize,
}

impl InMemoryHistory {
    /// History holding at most `capacity` results (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Arc::new(Mutex::new(VecDeque::new())), capacity: capacity.max(1) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::with_capacity(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}

#[async_trait]
impl DispatchHistory for InMemoryHistory {
    async fn append(&self, result: &DispatchResult) {
        let mut guard = self.entries.lock().await;
        guard.push_back(result.clone());
        if guard.len() > self.capacity {
            guard.pop_front();
        }
    }

    async fn list(&self) -> Vec<DispatchResult> {
        self.entries.lock().await.iter().cloned().collect()
    }

    async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::state::ComponentState;

    fn result(command: Command) -> DispatchResult {
        DispatchResult::succeeded(command, ComponentState::Active, ComponentState::Active)
    }

    #[tokio::test]
    async fn evicts_oldest_when_full() {
        let history = InMemoryHistory::with_capacity(2);
        history.append(&result(Command::Start)).await;
        history.append(&result(Command::Reload)).await;
        history.append(&result(Command::HealthCheck)).await;
        let commands: Vec<Command> = history.list().await.into_iter().map(|r| r.command).collect();
        assert_eq!(commands, vec![Command::Reload, Command::HealthCheck]);
        history.clear().await;
        assert!(history.list().await.is_empty());
    }
}
