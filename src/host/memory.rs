//! In-process implementations of the host collaborators.
//!
//! Used by the `tier-tag simulate` command and by tests that need a host
//! without a running game server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use async_trait::async_trait;

use crate::host::{PlaceholderRegistry, PrincipalRegistry, ScoreSource};
use crate::models::{Principal, Result, TierTagError};
use crate::placeholder::PlaceholderExpansion;

/// Online player list that can be edited while the service runs.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    online: RwLock<Vec<Principal>>,
}

impl InMemoryRegistry {
    pub fn new(online: Vec<Principal>) -> Self {
        Self {
            online: RwLock::new(online),
        }
    }
    
    pub fn join(&self, principal: Principal) {
        let mut online = self.online.write().unwrap_or_else(PoisonError::into_inner);
        if !online.contains(&principal) {
            online.push(principal);
        }
    }
    
    pub fn leave(&self, principal: &Principal) {
        let mut online = self.online.write().unwrap_or_else(PoisonError::into_inner);
        online.retain(|p| p != principal);
    }
}

impl PrincipalRegistry for InMemoryRegistry {
    fn list_current_principals(&self) -> Vec<Principal> {
        self.online.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Canned answer for one principal
#[derive(Debug, Clone)]
pub enum ScriptedScore {
    Raw(String),
    Missing,
    Unavailable,
    /// Answer only after the given delay
    Delayed(Duration, String),
}

/// Score source answering from a table of scripted replies.
#[derive(Debug, Default)]
pub struct InMemoryScoreSource {
    scores: RwLock<HashMap<Principal, ScriptedScore>>,
    queries: AtomicUsize,
}

impl InMemoryScoreSource {
    pub fn new() -> Self {
        Self::default()
    }
    
    pub fn set(&self, principal: &Principal, score: ScriptedScore) {
        self.scores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(principal.clone(), score);
    }
    
    pub fn set_raw(&self, principal: &Principal, raw: impl Into<String>) {
        self.set(principal, ScriptedScore::Raw(raw.into()));
    }
    
    /// Total queries answered so far
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoreSource for InMemoryScoreSource {
    async fn query_score(&self, principal: &Principal, _query: &str) -> Result<Option<String>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        
        let scripted = self
            .scores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(principal)
            .cloned()
            .unwrap_or(ScriptedScore::Missing);
        
        match scripted {
            ScriptedScore::Raw(raw) => Ok(Some(raw)),
            ScriptedScore::Missing => Ok(None),
            ScriptedScore::Unavailable => Err(TierTagError::SourceUnavailable {
                principal: principal.to_string(),
                reason: "placeholder provider not ready".to_string(),
            }),
            ScriptedScore::Delayed(delay, raw) => {
                tokio::time::sleep(delay).await;
                Ok(Some(raw))
            }
        }
    }
}

/// Minimal templating host that expands `%identifier_params%` tokens.
#[derive(Default)]
pub struct InMemoryPlaceholders {
    expansions: RwLock<HashMap<String, Arc<dyn PlaceholderExpansion>>>,
}

impl InMemoryPlaceholders {
    pub fn new() -> Self {
        Self::default()
    }
    
    pub fn is_registered(&self, identifier: &str) -> bool {
        self.expansions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&identifier.to_lowercase())
    }
    
    /// Resolve a single placeholder. `None` when the identifier is unknown or
    /// the expansion does not support `params`.
    pub fn request(&self, identifier: &str, principal: &Principal, params: &str) -> Option<String> {
        let expansion = self
            .expansions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&identifier.to_lowercase())
            .cloned()?;
        
        expansion.resolve(principal, params).render()
    }
    
    /// Replace every resolvable `%identifier_params%` token in `text`.
    /// Unresolvable tokens are left as they are.
    pub fn apply(&self, principal: &Principal, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        
        while let Some(start) = rest.find('%') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            
            let Some(end) = after.find('%') else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            
            let token = &after[..end];
            let resolved = token
                .split_once('_')
                .and_then(|(identifier, params)| self.request(identifier, principal, params));
            
            match resolved {
                Some(value) => {
                    out.push_str(&value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('%');
                    rest = after;
                }
            }
        }
        
        out.push_str(rest);
        out
    }
}

impl PlaceholderRegistry for InMemoryPlaceholders {
    fn register(&self, expansion: Arc<dyn PlaceholderExpansion>) -> Result<()> {
        let identifier = expansion.identifier().to_lowercase();
        if identifier.is_empty() || identifier.contains('_') {
            return Err(TierTagError::Placeholder(format!(
                "invalid identifier {:?}",
                expansion.identifier()
            )));
        }
        
        self.expansions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier, expansion);
        Ok(())
    }
}
