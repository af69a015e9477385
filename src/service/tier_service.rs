use std::sync::{Arc, Mutex, PoisonError};
use futures::FutureExt;
use tracing::{info, warn};

use crate::config::{PlaceholderSettings, RefreshSettings};
use crate::host::{PlaceholderRegistry, PrincipalRegistry, RefreshJob, Scheduler, ScoreSource, TaskHandle};
use crate::models::{Principal, Result, TierCache, TierLabel, TierTagError};
use crate::placeholder::{TierExpansion, ABSENT_SENTINEL};
use crate::service::{RefreshCycle, RefreshReport};

/// Host services the tier service depends on
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<dyn PrincipalRegistry>,
    pub source: Arc<dyn ScoreSource>,
    pub scheduler: Arc<dyn Scheduler>,
    pub placeholders: Arc<dyn PlaceholderRegistry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Stopped,
    Starting,
    Running(TaskHandle),
}

/// Keeps a tier label per online player up to date and serves it to the
/// placeholder system.
pub struct TierService {
    cycle: Arc<RefreshCycle>,
    scheduler: Arc<dyn Scheduler>,
    placeholders: Arc<dyn PlaceholderRegistry>,
    expansion: Arc<TierExpansion>,
    refresh: RefreshSettings,
    state: Mutex<Lifecycle>,
}

impl TierService {
    pub fn new(
        collaborators: Collaborators,
        refresh: RefreshSettings,
        placeholder: PlaceholderSettings,
    ) -> Self {
        let cache = Arc::new(TierCache::new());
        let cycle = Arc::new(RefreshCycle::new(
            collaborators.registry,
            collaborators.source,
            cache.clone(),
            &refresh,
        ));
        
        Self {
            cycle,
            scheduler: collaborators.scheduler,
            placeholders: collaborators.placeholders,
            expansion: Arc::new(TierExpansion::new(placeholder, cache)),
            refresh,
            state: Mutex::new(Lifecycle::Stopped),
        }
    }
    
    pub fn cache(&self) -> &Arc<TierCache> {
        self.cycle.cache()
    }
    
    /// Run one refresh cycle now
    pub async fn refresh_all(&self) -> RefreshReport {
        self.cycle.run().await
    }
    
    /// Report of the most recent refresh, scheduled or manual
    pub fn last_report(&self) -> Option<RefreshReport> {
        self.cycle.last_report()
    }
    
    /// Last computed tier for a principal
    pub fn lookup(&self, principal: &Principal) -> Option<TierLabel> {
        self.cycle.cache().get(principal)
    }
    
    /// Like `lookup`, but renders the "N/A" sentinel for unknown principals
    pub fn lookup_or_sentinel(&self, principal: &Principal) -> String {
        self.lookup(principal)
            .map(|label| label.as_str().to_string())
            .unwrap_or_else(|| ABSENT_SENTINEL.to_string())
    }
    
    pub fn is_running(&self) -> bool {
        !matches!(*self.lock_state(), Lifecycle::Stopped)
    }
    
    /// Register the placeholder, refresh once, then schedule periodic refreshes.
    ///
    /// Starting a service that is already running fails with
    /// `TierTagError::AlreadyRunning` and changes nothing.
    pub async fn start(&self) -> Result<RefreshReport> {
        {
            let mut state = self.lock_state();
            if *state != Lifecycle::Stopped {
                return Err(TierTagError::AlreadyRunning);
            }
            *state = Lifecycle::Starting;
        }
        
        if let Err(e) = self.placeholders.register(self.expansion.clone()) {
            *self.lock_state() = Lifecycle::Stopped;
            return Err(e);
        }
        
        let report = self.cycle.run().await;
        
        let cycle = self.cycle.clone();
        let job: RefreshJob = Arc::new(move || {
            let cycle = cycle.clone();
            async move {
                cycle.run().await;
            }
            .boxed()
        });
        
        let handle = match self.scheduler.schedule_repeating(
            job,
            self.refresh.initial_delay(),
            self.refresh.period(),
        ) {
            Ok(handle) => handle,
            Err(e) => {
                *self.lock_state() = Lifecycle::Stopped;
                return Err(e);
            }
        };
        
        let mut state = self.lock_state();
        if *state == Lifecycle::Starting {
            *state = Lifecycle::Running(handle);
            info!(
                task = %handle,
                period_secs = self.refresh.period().as_secs(),
                principals = report.principals,
                "Tier refresh started"
            );
        } else {
            // stop() raced with start(); honour it
            self.scheduler.cancel(handle);
            warn!(task = %handle, "Tier service stopped while starting, cancelled task");
        }
        
        Ok(report)
    }
    
    /// Cancel the scheduled refresh. Returns false when nothing was running.
    ///
    /// A cycle already in progress is allowed to finish.
    pub fn stop(&self) -> bool {
        let previous = std::mem::replace(&mut *self.lock_state(), Lifecycle::Stopped);
        
        match previous {
            Lifecycle::Running(handle) => {
                if !self.scheduler.cancel(handle) {
                    warn!(task = %handle, "Scheduler did not know the refresh task");
                }
                info!(task = %handle, "Tier refresh stopped and cancelled task");
                true
            }
            Lifecycle::Starting => {
                info!("Tier refresh stopped before scheduling completed");
                true
            }
            Lifecycle::Stopped => {
                info!("Tier refresh stopped (no task to cancel)");
                false
            }
        }
    }
    
    fn lock_state(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TierService {
    fn drop(&mut self) {
        if let Lifecycle::Running(handle) = *self.lock_state() {
            self.scheduler.cancel(handle);
        }
    }
}
