//! Dinner menu pipeline constrained by a static diet chart.

pub mod diet;
pub mod prompts;
pub mod recommender;
