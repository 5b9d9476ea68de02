use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::models::meal::MealRecord;

pub const MEAL_HISTORY_FILE: &str = "meal_history.json";
/// About three months of daily recommendations.
pub const MAX_MEAL_DAYS: usize = 90;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MealHistoryState {
    #[serde(default)]
    history: Vec<MealRecord>,
}

/// JSON log of recommended dinner menus, one record per send.
pub struct MealHistory {
    path: PathBuf,
    offset: FixedOffset,
    state: MealHistoryState,
}

impl MealHistory {
    pub fn load(path: impl Into<PathBuf>, offset: FixedOffset) -> Self {
        let path = path.into();
        let state = read_state(&path);
        Self {
            path,
            offset,
            state,
        }
    }

    pub fn record_meals(&mut self, meals: Vec<String>) {
        let count = meals.len();
        self.state.history.push(MealRecord {
            date: crate::store::today(&self.offset)
                .format("%Y-%m-%d")
                .to_string(),
            meals,
        });

        let len = self.state.history.len();
        if len > MAX_MEAL_DAYS {
            self.state.history.drain(..len - MAX_MEAL_DAYS);
        }

        self.save();
        info!("Saved {count} menus to meal history");
    }

    /// Menu titles from the last `days` records, oldest first.
    pub fn recent_meals(&self, days: usize) -> Vec<String> {
        let history = &self.state.history;
        let start = history.len().saturating_sub(days);
        history[start..]
            .iter()
            .flat_map(|r| r.meals.iter().cloned())
            .collect()
    }

    fn save(&self) {
        let json = match serde_json::to_string_pretty(&self.state) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize meal history: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            error!("Failed to save meal history to {}: {e}", self.path.display());
        }
    }
}

fn read_state(path: &Path) -> MealHistoryState {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!("Failed to read meal history {}: {e}", path.display());
            }
            return MealHistoryState::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        error!("Failed to parse meal history {}: {e}", path.display());
        MealHistoryState::default()
    })
}
