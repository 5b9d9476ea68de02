//! Project idea pipeline: prompt building, duplicate filtering, novelty
//! adjudication and the bounded retry loop that ties them together.

pub mod extract;
pub mod generator;
pub mod novelty;
pub mod prompts;
pub mod similarity;
