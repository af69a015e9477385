use std::sync::Arc;

use crate::config::PlaceholderSettings;
use crate::models::{Principal, TierCache};

/// Rendered when a supported placeholder has no value yet.
pub const ABSENT_SENTINEL: &str = "N/A";

/// Placeholder keys understood by the tier expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKey {
    Tier,
}

impl PlaceholderKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderKey::Tier => "tier",
        }
    }
    
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tier" => Some(PlaceholderKey::Tier),
            _ => None,
        }
    }
}

/// Outcome of resolving a placeholder for a principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Value(String),
    /// Key is supported but nothing is known for this principal yet
    Absent,
    /// Key is not handled by this expansion
    Unsupported(String),
}

impl Resolution {
    /// Text handed back to the templating system. Unsupported keys yield
    /// `None` so the host leaves the placeholder untouched.
    pub fn render(self) -> Option<String> {
        match self {
            Resolution::Value(value) => Some(value),
            Resolution::Absent => Some(ABSENT_SENTINEL.to_string()),
            Resolution::Unsupported(_) => None,
        }
    }
}

/// A named group of placeholders, `%identifier_params%`.
pub trait PlaceholderExpansion: Send + Sync {
    fn identifier(&self) -> &str;
    fn author(&self) -> &str;
    fn version(&self) -> &str;
    fn resolve(&self, principal: &Principal, params: &str) -> Resolution;
}

/// Exposes cached tiers as `%tiertag_tier%`.
pub struct TierExpansion {
    settings: PlaceholderSettings,
    cache: Arc<TierCache>,
}

impl TierExpansion {
    pub fn new(settings: PlaceholderSettings, cache: Arc<TierCache>) -> Self {
        Self { settings, cache }
    }
}

impl PlaceholderExpansion for TierExpansion {
    fn identifier(&self) -> &str {
        &self.settings.identifier
    }
    
    fn author(&self) -> &str {
        &self.settings.author
    }
    
    fn version(&self) -> &str {
        &self.settings.version
    }
    
    fn resolve(&self, principal: &Principal, params: &str) -> Resolution {
        match PlaceholderKey::from_str(params) {
            Some(PlaceholderKey::Tier) => match self.cache.get(principal) {
                Some(label) => Resolution::Value(label.as_str().to_string()),
                None => Resolution::Absent,
            },
            None => Resolution::Unsupported(params.to_string()),
        }
    }
}
