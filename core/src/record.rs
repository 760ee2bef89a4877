//! Video records as they enter and move through the pipeline.

use crate::{
    normalize::parse_day,
    types::{CreatorId, Platform},
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One row from one platform export. Built by the loader, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVideoRecord {
    pub platform:         Platform,
    #[serde(default)]
    pub account_handle:   String,
    #[serde(default)]
    pub display_name:     Option<String>,
    #[serde(default)]
    pub video_url:        String,
    #[serde(default)]
    pub caption:          Option<String>,
    /// Day granularity. Exports give dates, datetimes or `MM/DD/YYYY`.
    #[serde(default, deserialize_with = "day_or_none")]
    pub published_date:   Option<NaiveDate>,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    /// 14-day cumulative views. `None` marks the record malformed.
    #[serde(default, deserialize_with = "views_or_none")]
    pub view_count:       Option<u64>,
}

impl RawVideoRecord {
    /// A record with only the fields every export carries.
    pub fn new(platform: Platform, account_handle: impl Into<String>, view_count: u64) -> Self {
        Self {
            platform,
            account_handle: account_handle.into(),
            display_name: None,
            video_url: String::new(),
            caption: None,
            published_date: None,
            duration_seconds: None,
            view_count: Some(view_count),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = url.into();
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.published_date = Some(date);
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

fn day_or_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    let day = match raw {
        Some(Value::String(text)) if !text.trim().is_empty() => {
            let day = parse_day(text.trim());
            if day.is_none() {
                log::warn!("record: unrecognized date '{text}', treating as missing");
            }
            day
        }
        _ => None,
    };
    Ok(day)
}

/// Exports give views as a number or as text such as `"1,234"`.
/// Anything unreadable becomes `None`.
fn views_or_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    let views = match raw {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(text)) => {
            let digits: String = text
                .chars()
                .filter(|c| !matches!(c, ',' | '_') && !c.is_whitespace())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    };
    Ok(views)
}

/// Which matcher step produced (or blocked) a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStep {
    Url,
    Handle,
    DisplayName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// No step found any creator.
    NoCandidate,
    /// A step found more than one creator; the record is not guessed.
    Ambiguous {
        step:       MatchStep,
        candidates: Vec<CreatorId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched {
        creator_id: CreatorId,
        step:       MatchStep,
    },
    Unmatched(UnmatchedReason),
}

impl MatchOutcome {
    pub fn creator_id(&self) -> Option<&str> {
        match self {
            MatchOutcome::Matched { creator_id, .. } => Some(creator_id),
            MatchOutcome::Unmatched(_) => None,
        }
    }
}

/// A raw record annotated with its input position and match result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedVideoRecord {
    pub record_index: usize,
    pub record:       RawVideoRecord,
    pub outcome:      MatchOutcome,
}

impl MatchedVideoRecord {
    pub fn creator_id(&self) -> Option<&str> {
        self.outcome.creator_id()
    }

    /// Views used for dedup and cost. Malformed records never reach here,
    /// so a missing count reads as zero.
    pub fn views(&self) -> u64 {
        self.record.view_count.unwrap_or(0)
    }
}
