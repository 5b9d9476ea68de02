pub mod idea;
pub mod meal;
