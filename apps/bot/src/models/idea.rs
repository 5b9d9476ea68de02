use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Category of project idea. Drives prompt template selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaKind {
    /// Pure software answer to an everyday domestic pain point.
    Software,
    /// Hardware + software (IoT, gadgets, automation).
    #[default]
    #[serde(alias = "hardware")]
    Mixed,
}

impl IdeaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaKind::Software => "software",
            IdeaKind::Mixed => "mixed",
        }
    }
}

/// Reads a stored kind, mapping names this build does not know to the default.
///
/// Applied to every persisted kind so one odd record cannot make the whole
/// history file unreadable.
pub fn lenient_kind<'de, D>(deserializer: D) -> Result<IdeaKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::trim) {
        Some("software") => IdeaKind::Software,
        Some("mixed") | Some("hardware") => IdeaKind::Mixed,
        _ => IdeaKind::default(),
    })
}

impl fmt::Display for IdeaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted idea in the rolling history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    pub kind: IdeaKind,
}

/// Longest summary kept in the summary log, in characters.
pub const SUMMARY_MAX_CHARS: usize = 180;

/// One line of the summary log: `DATE | TYPE | TITLE | SUMMARY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub date: NaiveDate,
    pub kind: String,
    pub title: String,
    pub summary: String,
}

/// Verdict returned by the novelty judge. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoveltyVerdict {
    pub is_novel: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub similar_examples: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_record_uses_type_key() {
        let record = HistoryRecord {
            title: "앱A".to_string(),
            kind: IdeaKind::Software,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "software");
        assert_eq!(json["title"], "앱A");
    }

    #[test]
    fn test_legacy_hardware_kind_reads_as_mixed() {
        let record: HistoryRecord =
            serde_json::from_str(r#"{"title": "스마트 화분", "type": "hardware"}"#).unwrap();
        assert_eq!(record.kind, IdeaKind::Mixed);
    }

    #[test]
    fn test_unknown_or_missing_kind_reads_as_default() {
        let odd: HistoryRecord = serde_json::from_str(r#"{"title": "odd", "type": "iot"}"#).unwrap();
        assert_eq!(odd.kind, IdeaKind::Mixed);

        let bare: HistoryRecord = serde_json::from_str(r#"{"title": "bare"}"#).unwrap();
        assert_eq!(bare.kind, IdeaKind::Mixed);

        let null: HistoryRecord =
            serde_json::from_str(r#"{"title": "null", "type": null}"#).unwrap();
        assert_eq!(null.kind, IdeaKind::Mixed);
    }

    #[test]
    fn test_verdict_defaults_optional_fields() {
        let verdict: NoveltyVerdict = serde_json::from_str(r#"{"is_novel": false}"#).unwrap();
        assert!(!verdict.is_novel);
        assert!(verdict.reason.is_empty());
        assert!(verdict.similar_examples.is_empty());
    }
}
