pub mod record;
pub mod prediction;
pub mod win_tier;

pub use record::*;
pub use prediction::*;
pub use win_tier::*;
