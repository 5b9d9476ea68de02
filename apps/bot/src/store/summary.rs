use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{FixedOffset, NaiveDate};
use tracing::{error, info};

use crate::models::idea::{IdeaKind, SummaryRecord, SUMMARY_MAX_CHARS};

pub const SUMMARY_FILE: &str = "idea_summaries.txt";
pub const SUMMARY_HEADER: &str =
    "# Inspiration Bot Idea Summaries\n# format: YYYY-MM-DD | type | title | summary\n";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Append-only `DATE | TYPE | TITLE | SUMMARY` log used for long-horizon dedup context.
pub struct SummaryStore {
    path: PathBuf,
    offset: FixedOffset,
}

impl SummaryStore {
    /// Opens the store, creating the file with its header if needed.
    pub fn open(path: impl Into<PathBuf>, offset: FixedOffset) -> Self {
        let store = Self {
            path: path.into(),
            offset,
        };
        store.ensure_file();
        store
    }

    /// Creates the file with its header when absent. Never truncates.
    pub fn ensure_file(&self) {
        let created = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(SUMMARY_HEADER.as_bytes()));

        match created {
            Ok(()) => info!("Created idea summary file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => error!(
                "Failed to create idea summary file {}: {e}",
                self.path.display()
            ),
        }
    }

    /// Appends one sanitized line dated today.
    pub fn append_summary(&self, title: &str, kind: IdeaKind, summary: &str) {
        self.append_dated(crate::store::today(&self.offset), title, kind, summary);
    }

    fn append_dated(&self, date: NaiveDate, title: &str, kind: IdeaKind, summary: &str) {
        let safe_title = sanitize_field(title);
        let safe_summary: String = sanitize_field(summary)
            .chars()
            .take(SUMMARY_MAX_CHARS)
            .collect();
        let line = format!(
            "{} | {} | {} | {}\n",
            date.format(DATE_FORMAT),
            kind,
            safe_title,
            safe_summary.trim_end()
        );

        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(line.as_bytes()));

        match written {
            Ok(()) => info!("Saved idea summary: {safe_title}"),
            Err(e) => error!(
                "Failed to append to idea summary file {}: {e}",
                self.path.display()
            ),
        }
    }

    /// All well-formed records in file order. Malformed lines are skipped.
    pub fn entries(&self) -> Vec<SummaryRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    error!(
                        "Failed to read idea summary file {}: {e}",
                        self.path.display()
                    );
                }
                return Vec::new();
            }
        };

        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(parse_line)
            .collect()
    }

    /// The last `limit` records as a bullet list for prompt injection, or `""` when empty.
    pub fn recent_context(&self, limit: usize) -> String {
        let entries = self.entries();
        let start = entries.len().saturating_sub(limit);
        entries[start..]
            .iter()
            .map(|e| {
                format!(
                    "- {} | {} | {} | {}",
                    e.date.format(DATE_FORMAT),
                    e.kind,
                    e.title,
                    e.summary
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn all_titles(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|e| e.title)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Collapses newlines and replaces the field separator.
fn sanitize_field(text: &str) -> String {
    text.replace(['\r', '\n'], " ").replace('|', "/").trim().to_string()
}

fn parse_line(line: &str) -> Option<SummaryRecord> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let [date, kind, title, summary] = parts.as_slice() else {
        return None;
    };
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;

    Some(SummaryRecord {
        date,
        kind: kind.to_string(),
        title: title.to_string(),
        summary: summary.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn store_in(dir: &TempDir) -> SummaryStore {
        SummaryStore::open(dir.path().join(SUMMARY_FILE), kst())
    }

    #[test]
    fn test_open_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_file();
        store.ensure_file();

        let raw = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert_eq!(raw, SUMMARY_HEADER);
        assert!(store.entries().is_empty());
        assert_eq!(store.recent_context(80), "");
    }

    #[test]
    fn test_ensure_file_never_truncates() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append_summary("물주기 알리미", IdeaKind::Software, "화분 물주기 알림");
        store.ensure_file();
        let reopened = store_in(&dir);
        assert_eq!(reopened.entries().len(), 1);
    }

    #[test]
    fn test_append_sanitizes_pipes_and_newlines() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append_summary("A|B\nC", IdeaKind::Software, "line one\nline | two");

        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "A/B C");
        assert_eq!(entries[0].summary, "line one line / two");
        assert_eq!(entries[0].kind, "software");
        assert_eq!(entries[0].date, crate::store::today(&kst()));
    }

    #[test]
    fn test_long_summary_is_capped() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append_summary("긴 요약", IdeaKind::Software, &"가나다 ".repeat(100));

        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].summary.chars().count() <= SUMMARY_MAX_CHARS);
        assert!(entries[0].summary.starts_with("가나다 가나다"));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        fs::write(
            &path,
            format!(
                "{SUMMARY_HEADER}\
                 2025-01-01 | software | 첫번째 | 요약1\n\
                 2025-01-02 | broken\n\
                 \n\
                 2025-01-03 | mixed | 두번째 | 요약2\n"
            ),
        )
        .unwrap();

        let store = SummaryStore::open(&path, kst());
        let entries = store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "첫번째");
        assert_eq!(entries[1].title, "두번째");
    }

    #[test]
    fn test_bad_date_is_malformed() {
        assert!(parse_line("yesterday | software | t | s").is_none());
        assert!(parse_line("2025-01-01 | software | t | s | extra").is_none());
        assert!(parse_line("2025-01-01 | software | t | s").is_some());
    }

    #[test]
    fn test_recent_context_renders_tail() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        for i in 0..5 {
            store.append_dated(date, &format!("t{i}"), IdeaKind::Software, "s");
        }

        let context = store.recent_context(2);
        assert_eq!(
            context,
            "- 2025-03-01 | software | t3 | s\n- 2025-03-01 | software | t4 | s"
        );
    }

    #[test]
    fn test_all_titles_in_file_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append_summary("one", IdeaKind::Software, "s");
        store.append_summary("two", IdeaKind::Mixed, "s");
        assert_eq!(store.all_titles(), vec!["one", "two"]);
    }
}
