use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::models::idea::{lenient_kind, HistoryRecord, IdeaKind};

pub const HISTORY_FILE: &str = "idea_history.json";
/// Records kept on disk; older entries are evicted first.
pub const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    #[serde(default, deserialize_with = "lenient_kind")]
    pub last_type: IdeaKind,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

/// Chooses which idea category to generate next.
pub trait KindPolicy: Send + Sync {
    fn next_kind(&self, state: &HistoryState) -> IdeaKind;
}

/// Always asks for software ideas.
pub struct SoftwareOnly;

impl KindPolicy for SoftwareOnly {
    fn next_kind(&self, _state: &HistoryState) -> IdeaKind {
        IdeaKind::Software
    }
}

/// Flips between the two categories based on the last accepted one.
pub struct Alternating;

impl KindPolicy for Alternating {
    fn next_kind(&self, state: &HistoryState) -> IdeaKind {
        match state.last_type {
            IdeaKind::Software => IdeaKind::Mixed,
            IdeaKind::Mixed => IdeaKind::Software,
        }
    }
}

/// Rolling JSON log of accepted idea titles.
pub struct HistoryStore {
    path: PathBuf,
    state: HistoryState,
    policy: Box<dyn KindPolicy>,
}

impl HistoryStore {
    /// Loads `path`, falling back to an empty history on any read or parse error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = read_state(&path);
        Self {
            path,
            state,
            policy: Box::new(SoftwareOnly),
        }
    }

    pub fn with_policy(mut self, policy: impl KindPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn state(&self) -> &HistoryState {
        &self.state
    }

    pub fn next_kind(&self) -> IdeaKind {
        self.policy.next_kind(&self.state)
    }

    /// Appends an accepted idea, keeps the newest `MAX_HISTORY`, and rewrites the file.
    pub fn record_idea(&mut self, title: &str, kind: IdeaKind) {
        self.state.last_type = kind;
        self.state.history.push(HistoryRecord {
            title: title.to_string(),
            kind,
        });

        let len = self.state.history.len();
        if len > MAX_HISTORY {
            self.state.history.drain(..len - MAX_HISTORY);
        }

        self.save();
    }

    /// The last `limit` titles, oldest first.
    pub fn recent_titles(&self, limit: usize) -> Vec<String> {
        let history = &self.state.history;
        let start = history.len().saturating_sub(limit);
        history[start..].iter().map(|r| r.title.clone()).collect()
    }

    fn save(&self) {
        let json = match serde_json::to_string_pretty(&self.state) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize idea history: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            error!("Failed to save idea history to {}: {e}", self.path.display());
        }
    }
}

fn read_state(path: &Path) -> HistoryState {
    let fresh = || HistoryState {
        last_type: IdeaKind::Mixed,
        history: Vec::new(),
    };

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No idea history at {}, starting fresh", path.display());
            return fresh();
        }
        Err(e) => {
            error!("Failed to read idea history {}: {e}", path.display());
            return fresh();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        error!("Failed to parse idea history {}: {e}", path.display());
        fresh()
    })
}
