pub mod models;
pub mod config;
pub mod host;
pub mod placeholder;
pub mod service;

pub use models::{compute_tier, Principal, TierCache, TierLabel, TierTagError, Result};
pub use config::Settings;
pub use service::{Collaborators, RefreshReport, TierService};
