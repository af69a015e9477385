use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::{Principal, TierLabel};

/// Last computed tier for a principal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedTier {
    pub label: TierLabel,
    pub score: f64,
    pub refreshed_at: DateTime<Utc>,
}

/// In-memory tier cache shared between the refresh loop and placeholder lookups.
///
/// Entries are only written by a refresh cycle and are never evicted; a player
/// who disconnects keeps their last tier until the process exits.
#[derive(Debug, Default)]
pub struct TierCache {
    entries: RwLock<HashMap<Principal, CachedTier>>,
}

impl TierCache {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Get the cached tier for a principal
    pub fn get(&self, principal: &Principal) -> Option<TierLabel> {
        self.get_entry(principal).map(|entry| entry.label)
    }
    
    /// Get the full cached entry for a principal
    pub fn get_entry(&self, principal: &Principal) -> Option<CachedTier> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(principal).copied()
    }
    
    /// Replace the entry for a principal as a single value
    pub fn set(&self, principal: Principal, score: f64, label: TierLabel) {
        let entry = CachedTier {
            label,
            score,
            refreshed_at: Utc::now(),
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(principal, entry);
    }
    
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    
    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut per_tier: Vec<(TierLabel, usize)> =
            TierLabel::ALL.iter().map(|tier| (*tier, 0)).collect();
        
        for entry in entries.values() {
            if let Some(slot) = per_tier.iter_mut().find(|(tier, _)| *tier == entry.label) {
                slot.1 += 1;
            }
        }
        
        CacheStats {
            total_entries: entries.len(),
            per_tier,
            last_refreshed: entries.values().map(|e| e.refreshed_at).max(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub per_tier: Vec<(TierLabel, usize)>,
    pub last_refreshed: Option<DateTime<Utc>>,
}
