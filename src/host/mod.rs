pub mod client;
pub mod scheduler;
pub mod memory;

pub use client::{PrincipalRegistry, ScoreSource, Scheduler, PlaceholderRegistry, RefreshJob, TaskHandle};
pub use scheduler::{TokioScheduler, ticks_to_duration, TICKS_PER_SECOND};
pub use memory::{InMemoryRegistry, InMemoryScoreSource, InMemoryPlaceholders, ScriptedScore};
