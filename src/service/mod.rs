pub mod refresh;
pub mod tier_service;

pub use refresh::{RefreshCycle, RefreshReport, Fallback};
pub use tier_service::{TierService, Collaborators};
