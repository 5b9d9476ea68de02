//! Telegram Bot API delivery.
//!
//! Long messages are split on the section rule first and hard-split only when
//! a single section is still too long. Each chunk is sent as legacy Markdown;
//! if Telegram refuses to parse the markup the chunk is resent as plain text.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::notifier::DeliveryChannel;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Telegram's per-message limit, in UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 4096;
/// Section rule used by the meal menu. Preferred split point.
pub const SECTION_SEPARATOR: &str = "━━━━━━━━━━━━━━━";
const CHUNK_PAUSE: Duration = Duration::from_millis(500);

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("static regex is valid")
});

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error ({code}): {description}")]
    Api { code: u16, description: String },
}

impl NotifyError {
    /// True when Telegram rejected the Markdown rather than the message.
    pub fn is_markup_error(&self) -> bool {
        match self {
            NotifyError::Api { description, .. } => {
                let lower = description.to_lowercase();
                lower.contains("parse") || lower.contains("entities")
            }
            NotifyError::Http(_) => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: String,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            token,
            chat_id,
            base_url: TELEGRAM_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// One `sendMessage` call.
    pub async fn send_raw(&self, text: &str, parse_mode: Option<&str>) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id: &self.chat_id,
                text,
                parse_mode,
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        let body: TelegramResponse = response.json().await?;
        if body.ok {
            return Ok(());
        }

        Err(NotifyError::Api {
            code: body.error_code.unwrap_or(status),
            description: body.description.unwrap_or_default(),
        })
    }

    /// Sends one chunk as Markdown, falling back to cleaned plain text on markup errors.
    async fn send_chunk(&self, chunk: &str) -> bool {
        let e = match self.send_raw(chunk, Some("Markdown")).await {
            Ok(()) => return true,
            Err(e) => e,
        };

        if !e.is_markup_error() {
            error!("Telegram delivery failed: {e}");
            return false;
        }

        warn!("Telegram rejected Markdown, retrying as plain text: {e}");
        match self.send_raw(&clean_markdown(chunk), None).await {
            Ok(()) => {
                info!("Delivered as plain text");
                true
            }
            Err(e) => {
                error!("Plain text delivery failed too: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl DeliveryChannel for TelegramNotifier {
    async fn deliver(&self, text: &str) -> bool {
        let chunks = split_message(text, MAX_MESSAGE_LEN);
        if chunks.len() > 1 {
            info!("Message split into {} chunks", chunks.len());
        }

        let mut delivered = true;
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(CHUNK_PAUSE).await;
            }
            delivered &= self.send_chunk(chunk).await;
        }
        delivered
    }
}

fn text_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Splits `text` into chunks of at most `max` UTF-16 units.
///
/// Sections between `SECTION_SEPARATOR` rules are packed greedily; a section
/// that alone exceeds `max` is hard-split on character boundaries.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    if text_len(text) <= max {
        return vec![text.to_string()];
    }

    let mut packed: Vec<String> = Vec::new();
    let mut current = String::new();
    for (i, part) in text.split(SECTION_SEPARATOR).enumerate() {
        let piece = if i == 0 {
            part.to_string()
        } else {
            format!("{SECTION_SEPARATOR}{part}")
        };
        if !current.is_empty() && text_len(&current) + text_len(&piece) > max {
            packed.push(std::mem::take(&mut current));
        }
        current.push_str(&piece);
    }
    packed.push(current);

    packed
        .iter()
        .flat_map(|chunk| hard_split(chunk.trim(), max))
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}

fn hard_split(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut len = 0;
    for c in text.chars() {
        let width = c.len_utf16();
        if len + width > max {
            chunks.push(std::mem::take(&mut current));
            len = 0;
        }
        current.push(c);
        len += width;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Strips legacy Markdown so the text survives `parse_mode = None`.
pub fn clean_markdown(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`'))
        .collect();
    MARKDOWN_LINK.replace_all(&stripped, "$1 ($2)").into_owned()
}
