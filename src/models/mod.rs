pub mod analysis;
pub mod paper;

pub use analysis::*;
pub use paper::*;
