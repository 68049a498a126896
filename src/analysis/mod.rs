pub mod analyzer;
pub mod types;

pub use analyzer::analyze;
pub use types::{Analysis, EngagementStyle, TechnicalLevel};
