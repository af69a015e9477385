use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::models::{Principal, Result};
use crate::placeholder::PlaceholderExpansion;

/// Source of the players currently connected to the server.
#[cfg_attr(test, mockall::automock)]
pub trait PrincipalRegistry: Send + Sync {
    /// Snapshot of the online players at call time
    fn list_current_principals(&self) -> Vec<Principal>;
}

/// External ranking lookup, e.g. a placeholder provided by a PvP plugin.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreSource: Send + Sync {
    /// Resolve `query` for a principal.
    ///
    /// `Ok(None)` means the source had nothing to say. Sources that cannot
    /// answer at all should return `TierTagError::SourceUnavailable`.
    async fn query_score(&self, principal: &Principal, query: &str) -> Result<Option<String>>;
}

/// Work executed on every scheduler firing. The returned future is driven to
/// completion before the next firing.
pub type RefreshJob = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Opaque handle to a scheduled repeating task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
    
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Host timer able to run a job repeatedly.
#[cfg_attr(test, mockall::automock)]
pub trait Scheduler: Send + Sync {
    fn schedule_repeating(
        &self,
        job: RefreshJob,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<TaskHandle>;
    
    /// Stop future firings. Returns false when the handle is unknown.
    fn cancel(&self, handle: TaskHandle) -> bool;
}

/// Templating system that resolves `%identifier_params%` placeholders.
#[cfg_attr(test, mockall::automock)]
pub trait PlaceholderRegistry: Send + Sync {
    /// Register an expansion under its identifier, replacing any previous one
    fn register(&self, expansion: Arc<dyn PlaceholderExpansion>) -> Result<()>;
}
