pub mod expansion;

pub use expansion::{PlaceholderExpansion, PlaceholderKey, Resolution, TierExpansion, ABSENT_SENTINEL};
