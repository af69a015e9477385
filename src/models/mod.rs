pub mod principal;
pub mod tier;
pub mod score;
pub mod error;
pub mod cache;

pub use principal::*;
pub use tier::*;
pub use score::*;
pub use error::*;
pub use cache::*;
