//! File-backed stores for everything the bot has already sent.
//!
//! All stores are lossy logs: write failures are logged and swallowed so a
//! full disk never blocks delivery. Callers serialize access through the
//! bot's pipeline lock; nothing here locks on its own.

pub mod history;
pub mod meals;
pub mod summary;

use chrono::{FixedOffset, NaiveDate, Utc};

/// Current calendar date in the bot's configured offset.
pub fn today(offset: &FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(offset).date_naive()
}
