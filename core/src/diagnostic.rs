//! Per-record issues that do not stop a run.
//!
//! A record with a diagnostic contributes nothing to any cost.

use crate::{
    record::{MatchOutcome, MatchStep, MatchedVideoRecord, UnmatchedReason},
    types::CreatorId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No creator found by any step.
    Unmatched {
        record_index: usize,
        video_url:    String,
    },
    /// A step found several creators; the record stays unmatched.
    AmbiguousMatch {
        record_index: usize,
        step:         MatchStep,
        candidates:   Vec<CreatorId>,
    },
    MalformedRecord {
        record_index: usize,
        video_url:    String,
        reason:       String,
    },
}

impl Diagnostic {
    /// Diagnostic for a record the matcher could not place, if any.
    pub fn from_match(matched: &MatchedVideoRecord) -> Option<Self> {
        let MatchOutcome::Unmatched(reason) = &matched.outcome else {
            return None;
        };
        Some(match reason {
            UnmatchedReason::NoCandidate => Diagnostic::Unmatched {
                record_index: matched.record_index,
                video_url:    matched.record.video_url.clone(),
            },
            UnmatchedReason::Ambiguous { step, candidates } => Diagnostic::AmbiguousMatch {
                record_index: matched.record_index,
                step:         *step,
                candidates:   candidates.clone(),
            },
        })
    }

    pub fn record_index(&self) -> usize {
        match self {
            Diagnostic::Unmatched { record_index, .. }
            | Diagnostic::AmbiguousMatch { record_index, .. }
            | Diagnostic::MalformedRecord { record_index, .. } => *record_index,
        }
    }

    /// Short type tag, as stored.
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::Unmatched { .. }       => "unmatched",
            Diagnostic::AmbiguousMatch { .. }  => "ambiguous_match",
            Diagnostic::MalformedRecord { .. } => "malformed_record",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Unmatched { record_index, video_url } => {
                write!(f, "record {record_index}: no creator for '{video_url}'")
            }
            Diagnostic::AmbiguousMatch { record_index, step, candidates } => write!(
                f,
                "record {record_index}: {step:?} lookup matched {} creators ({})",
                candidates.len(),
                candidates.join(", ")
            ),
            Diagnostic::MalformedRecord { record_index, video_url, reason } => {
                write!(f, "record {record_index}: malformed '{video_url}': {reason}")
            }
        }
    }
}
