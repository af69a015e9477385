use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use serde::Serialize;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::RefreshSettings;
use crate::host::{PrincipalRegistry, ScoreSource};
use crate::models::{compute_tier, parse_score, Principal, TierCache, TierTagError};

/// Why a principal's score fell back to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Unavailable,
    Malformed,
    TimedOut,
    Failed,
}

/// Summary of one refresh cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub principals: usize,
    pub unavailable: usize,
    pub malformed: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RefreshReport {
    fn record(&mut self, fallback: Fallback) {
        match fallback {
            Fallback::Unavailable => self.unavailable += 1,
            Fallback::Malformed => self.malformed += 1,
            Fallback::TimedOut => self.timed_out += 1,
            Fallback::Failed => self.failed += 1,
        }
    }
    
    /// Principals whose score had to be defaulted to zero
    pub fn defaulted(&self) -> usize {
        self.unavailable + self.malformed + self.timed_out + self.failed
    }
}

/// One pass over every online principal: query, classify, cache.
pub struct RefreshCycle {
    registry: Arc<dyn PrincipalRegistry>,
    source: Arc<dyn ScoreSource>,
    cache: Arc<TierCache>,
    score_query: String,
    query_timeout: Duration,
    last_report: Mutex<Option<RefreshReport>>,
    // held for a whole cycle so cycles never interleave
    running: tokio::sync::Mutex<()>,
}

impl RefreshCycle {
    pub fn new(
        registry: Arc<dyn PrincipalRegistry>,
        source: Arc<dyn ScoreSource>,
        cache: Arc<TierCache>,
        settings: &RefreshSettings,
    ) -> Self {
        Self {
            registry,
            source,
            cache,
            score_query: settings.score_query.clone(),
            query_timeout: settings.query_timeout(),
            last_report: Mutex::new(None),
            running: tokio::sync::Mutex::new(()),
        }
    }
    
    pub fn cache(&self) -> &Arc<TierCache> {
        &self.cache
    }
    
    /// Report of the most recently completed cycle
    pub fn last_report(&self) -> Option<RefreshReport> {
        self.last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
    
    /// Recompute the tier of every principal currently online.
    ///
    /// A failure for one principal defaults that principal's score to zero and
    /// never stops the rest of the cycle. A call made while another cycle is
    /// in progress waits for it to finish first.
    pub async fn run(&self) -> RefreshReport {
        let _running = self.running.lock().await;
        let started = Instant::now();
        let principals = self.registry.list_current_principals();
        let mut report = RefreshReport {
            principals: principals.len(),
            ..Default::default()
        };
        
        for principal in principals {
            let score = match self.observe(&principal).await {
                Ok(score) => score,
                Err(fallback) => {
                    report.record(fallback);
                    0.0
                }
            };
            
            let label = compute_tier(score);
            self.cache.set(principal, score, label);
        }
        
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        report.completed_at = Some(Utc::now());
        
        debug!(
            principals = report.principals,
            defaulted = report.defaulted(),
            elapsed_ms = report.elapsed_ms,
            "Tier refresh cycle completed"
        );
        
        *self.last_report.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        report
    }
    
    async fn observe(&self, principal: &Principal) -> Result<f64, Fallback> {
        let queried = tokio::time::timeout(
            self.query_timeout,
            self.source.query_score(principal, &self.score_query),
        )
        .await;
        
        let raw = match queried {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) if e.is_unavailable() => {
                warn!(principal = %principal, error = %e, "Score source unavailable, using 0");
                return Err(Fallback::Unavailable);
            }
            Ok(Err(e)) => {
                warn!(principal = %principal, error = %e, "Error getting ELO, using 0");
                return Err(Fallback::Failed);
            }
            Err(_) => {
                let e = TierTagError::QueryTimeout {
                    principal: principal.to_string(),
                    timeout_ms: self.query_timeout.as_millis() as u64,
                };
                warn!(principal = %principal, error = %e, "Error getting ELO, using 0");
                return Err(Fallback::TimedOut);
            }
        };
        
        parse_score(raw.as_deref()).map_err(|e| {
            warn!(principal = %principal, error = %e, "Error parsing ELO, using 0");
            Fallback::Malformed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::client::{MockPrincipalRegistry, MockScoreSource};
    use crate::models::TierLabel;
    
    fn cycle(
        registry: MockPrincipalRegistry,
        source: MockScoreSource,
        settings: &RefreshSettings,
    ) -> RefreshCycle {
        RefreshCycle::new(
            Arc::new(registry),
            Arc::new(source),
            Arc::new(TierCache::new()),
            settings,
        )
    }
    
    #[tokio::test]
    async fn test_unavailable_principal_does_not_abort_cycle() {
        let a = Principal::random("A");
        let b = Principal::random("B");
        
        let mut registry = MockPrincipalRegistry::new();
        registry
            .expect_list_current_principals()
            .times(1)
            .return_const(vec![a.clone(), b.clone()]);
        
        let a_id = a.id;
        let mut source = MockScoreSource::new();
        source.expect_query_score().times(2).returning(move |p, _| {
            if p.id == a_id {
                Err(TierTagError::SourceUnavailable {
                    principal: p.to_string(),
                    reason: "illegal state".to_string(),
                })
            } else {
                Ok(Some("12000".to_string()))
            }
        });
        
        let cycle = cycle(registry, source, &RefreshSettings::default());
        let report = cycle.run().await;
        
        assert_eq!(report.principals, 2);
        assert_eq!(report.unavailable, 1);
        assert_eq!(report.defaulted(), 1);
        assert_eq!(cycle.cache().get(&a), Some(TierLabel::Lt5));
        assert_eq!(cycle.cache().get(&b), Some(TierLabel::Lt3));
    }
    
    #[tokio::test]
    async fn test_uses_configured_query() {
        let steve = Principal::random("Steve");
        
        let mut registry = MockPrincipalRegistry::new();
        registry
            .expect_list_current_principals()
            .return_const(vec![steve.clone()]);
        
        let mut source = MockScoreSource::new();
        source
            .expect_query_score()
            .withf(|_, query| query == "%custom_elo%")
            .times(1)
            .returning(|_, _| Ok(Some("45000".to_string())));
        
        let settings = RefreshSettings {
            score_query: "%custom_elo%".to_string(),
            ..Default::default()
        };
        let cycle = cycle(registry, source, &settings);
        cycle.run().await;
        
        assert_eq!(cycle.cache().get(&steve), Some(TierLabel::Ht1));
        assert_eq!(cycle.cache().get_entry(&steve).unwrap().score, 45_000.0);
    }
    
    #[tokio::test]
    async fn test_malformed_and_empty_payloads_default_to_zero() {
        let garbage = Principal::random("garbage");
        let empty = Principal::random("empty");
        let null = Principal::random("null");
        
        let mut registry = MockPrincipalRegistry::new();
        registry
            .expect_list_current_principals()
            .return_const(vec![garbage.clone(), empty.clone(), null.clone()]);
        
        let garbage_id = garbage.id;
        let empty_id = empty.id;
        let mut source = MockScoreSource::new();
        source.expect_query_score().returning(move |p, _| {
            if p.id == garbage_id {
                Ok(Some("not-a-number".to_string()))
            } else if p.id == empty_id {
                Ok(Some(String::new()))
            } else {
                Ok(Some("null".to_string()))
            }
        });
        
        let cycle = cycle(registry, source, &RefreshSettings::default());
        let report = cycle.run().await;
        
        assert_eq!(report.malformed, 1);
        assert_eq!(report.defaulted(), 1);
        for p in [&garbage, &empty, &null] {
            assert_eq!(cycle.cache().get(p), Some(TierLabel::Lt5));
        }
    }
    
    #[tokio::test]
    async fn test_other_errors_are_counted_as_failures() {
        let steve = Principal::random("Steve");
        
        let mut registry = MockPrincipalRegistry::new();
        registry
            .expect_list_current_principals()
            .return_const(vec![steve.clone()]);
        
        let mut source = MockScoreSource::new();
        source
            .expect_query_score()
            .returning(|_, _| Err(TierTagError::Placeholder("expansion crashed".to_string())));
        
        let cycle = cycle(registry, source, &RefreshSettings::default());
        let report = cycle.run().await;
        
        assert_eq!(report.failed, 1);
        assert_eq!(cycle.cache().get(&steve), Some(TierLabel::Lt5));
    }
    
    #[tokio::test]
    async fn test_empty_registry() {
        let mut registry = MockPrincipalRegistry::new();
        registry.expect_list_current_principals().return_const(Vec::<Principal>::new());
        let source = MockScoreSource::new();
        
        let cycle = cycle(registry, source, &RefreshSettings::default());
        let report = cycle.run().await;
        
        assert_eq!(report.principals, 0);
        assert!(cycle.cache().is_empty());
        assert!(report.completed_at.is_some());
        assert_eq!(cycle.last_report().unwrap().principals, 0);
    }
}
