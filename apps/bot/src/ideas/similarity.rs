//! Local duplicate check. Fast, deterministic, no I/O.
//!
//! Titles are compared on a canonical key (lowercase, word characters and
//! Hangul only) using a Ratcliff/Obershelp ratio: `2 * matches / total_len`,
//! where matches are found by recursively taking the longest common block.

use std::sync::LazyLock;

use regex::Regex;

static NON_KEY_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w가-힣]").expect("static regex is valid")
});

/// Canonical comparison key. Idempotent.
pub fn normalize(text: &str) -> String {
    NON_KEY_CHARS
        .replace_all(&text.to_lowercase(), "")
        .into_owned()
}

/// Similarity ratio in `[0, 1]`; `1.0` for two empty strings.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + size..], &b[j + size..])
}

/// Earliest longest common block as `(start_a, start_b, len)`.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut cur = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let run = prev[j] + 1;
                cur[j + 1] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            }
        }
        prev = cur;
    }
    best
}

/// A pool title that tripped the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarTitle {
    pub existing: String,
    pub ratio: f64,
}

#[derive(Debug, Clone)]
pub struct SimilarityFilter {
    threshold: f64,
}

impl SimilarityFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// First pool entry that equals the candidate after normalization or whose
    /// ratio reaches the threshold. An empty candidate key never matches.
    pub fn find_similar<S: AsRef<str>>(&self, candidate: &str, pool: &[S]) -> Option<SimilarTitle> {
        let key = normalize(candidate);
        if key.is_empty() {
            return None;
        }

        pool.iter().find_map(|existing| {
            let existing = existing.as_ref();
            let other = normalize(existing);
            if other.is_empty() {
                return None;
            }
            let ratio = if other == key {
                1.0
            } else {
                sequence_ratio(&key, &other)
            };
            (ratio >= self.threshold).then(|| SimilarTitle {
                existing: existing.to_string(),
                ratio,
            })
        })
    }
}
