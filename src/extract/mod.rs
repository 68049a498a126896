pub mod prospects;
pub mod types;

pub use prospects::extract_prospects;
pub use types::{Prospect, Quality};
