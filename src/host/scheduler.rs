//! Repeating task scheduler backed by the tokio runtime.
//!
//! Each scheduled job gets its own task driving a `tokio::time::interval`. The
//! job future is awaited inside the tick handler, so a slow cycle delays the
//! next one instead of overlapping with it. Missed ticks are skipped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::host::{RefreshJob, Scheduler, TaskHandle};
use crate::models::{Result, TierTagError};

/// Server ticks per wall-clock second.
pub const TICKS_PER_SECOND: u64 = 20;

/// Convert server ticks into a wall-clock duration (one tick is 50ms).
pub fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::from_millis(ticks.saturating_mul(1000 / TICKS_PER_SECOND))
}

#[derive(Debug, Default)]
pub struct TokioScheduler {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<TaskHandle, CancellationToken>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Number of tasks that have been scheduled and not cancelled
    pub fn active_tasks(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(
        &self,
        job: RefreshJob,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<TaskHandle> {
        if period.is_zero() {
            return Err(TierTagError::Scheduler("period must be non-zero".to_string()));
        }
        
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TierTagError::Scheduler(e.to_string()))?;
        
        let handle = TaskHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        
        runtime.spawn(async move {
            run_repeating(handle, job, initial_delay, period, cancel_clone).await;
        });
        
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, cancel);
        
        Ok(handle)
    }
    
    fn cancel(&self, handle: TaskHandle) -> bool {
        let token = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

async fn run_repeating(
    handle: TaskHandle,
    job: RefreshJob,
    initial_delay: Duration,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + initial_delay, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    
    info!(
        task = %handle,
        initial_delay_ms = initial_delay.as_millis() as u64,
        period_secs = period.as_secs(),
        "Repeating task started"
    );
    
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(task = %handle, "Repeating task shutting down");
                break;
            }
            _ = ticker.tick() => {
                job().await;
            }
        }
    }
}
