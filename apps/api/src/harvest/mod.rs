//! Attachment Harvester — queries a mail provider and downloads matching
//! resume attachments. One fetch operation per provider behind a common trait.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use thiserror::Error;

pub mod graph;
pub mod imap;

/// Inclusive time window a scan covers. Providers widen it at the query level
/// where their date granularity is coarse; messages are re-filtered against
/// the exact bounds after fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Unit for relative look-back windows. A month counts as 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

impl TimeWindow {
    /// Window ending now and reaching back `amount` units.
    pub fn last(amount: u32, unit: WindowUnit) -> Self {
        let end = Utc::now();
        let span = match unit {
            WindowUnit::Minutes => Duration::minutes(amount as i64),
            WindowUnit::Hours => Duration::hours(amount as i64),
            WindowUnit::Days => Duration::days(amount as i64),
            WindowUnit::Weeks => Duration::weeks(amount as i64),
            WindowUnit::Months => Duration::days(amount as i64 * 30),
        };
        Self {
            start: end - span,
            end,
        }
    }

    /// Explicit date range: start of `start` through end of `end`.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).expect("valid time");
        Self {
            start: start.and_time(NaiveTime::MIN).and_utc(),
            end: end.and_time(end_of_day).and_utc(),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// One downloaded attachment, pre-extraction.
#[derive(Debug, Clone)]
pub struct RawAttachment {
    pub filename: String,
    pub bytes: Bytes,
    pub sender: String,
    pub received: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Bad credentials or a rejected login. Aborts the scan.
    #[error("{0}")]
    Auth(String),

    /// Graph source used without an access token. Distinct from zero results.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Transport failure or a rejected provider query.
    #[error("{0}")]
    Provider(String),
}

/// The capability interface unifying the per-provider scan implementations.
/// An empty mailbox is `Ok(vec![])` — never an error.
#[async_trait]
pub trait MailSource: Send + Sync {
    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<RawAttachment>, HarvestError>;
}

/// Suffix filter shared by both sources. Matching is by filename only — no
/// content sniffing.
pub fn is_resume_filename(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".pdf") || lower.ends_with(".docx")
}

/// Decodes an RFC 2047 encoded-word filename (`=?UTF-8?B?...?=`), returning
/// the input unchanged when it is not encoded or fails to parse.
pub fn decode_filename(raw: &str) -> String {
    if raw.contains("=?") {
        let synthetic = format!("X-Filename: {raw}");
        if let Ok((header, _)) = mailparse::parse_header(synthetic.as_bytes()) {
            let decoded = header.get_value();
            if !decoded.trim().is_empty() {
                return decoded;
            }
        }
    }
    raw.to_string()
}
