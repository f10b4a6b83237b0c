pub mod candidates;
pub mod catalog;
pub mod recommendations;

pub use recommendations::{Basis, RecommendationEngine, Recommendations};
