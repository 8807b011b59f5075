pub mod types;
pub mod detector;

pub use types::*;
pub use detector::*;
