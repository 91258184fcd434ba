pub mod simulator;
pub mod results;

pub use simulator::*;
pub use results::*;
