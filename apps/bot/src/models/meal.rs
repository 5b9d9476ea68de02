use serde::{Deserialize, Serialize};

/// Menus recommended on a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRecord {
    /// `YYYY-MM-DD` in the bot's configured offset.
    pub date: String,
    pub meals: Vec<String>,
}
