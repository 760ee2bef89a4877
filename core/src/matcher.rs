//! Record → creator resolution.
//!
//! PRIORITY ORDER (fixed, never reordered):
//!   1. URL:          handle embedded in `video_url`
//!   2. Handle:       `account_handle` on the record's platform
//!   3. Display name: case-insensitive exact `display_name`
//!
//! The first step that finds exactly one creator wins. A step that finds
//! several stops the search: the record is unmatched, never guessed.

use crate::{
    record::{MatchOutcome, MatchStep, MatchedVideoRecord, RawVideoRecord, UnmatchedReason},
    registry::{CreatorRegistry, Lookup},
};

/// Resolve one record against a registry snapshot. Pure.
pub fn match_record(record: &RawVideoRecord, registry: &CreatorRegistry) -> MatchOutcome {
    let display_name = record.display_name.as_deref().unwrap_or_default();

    let by_url = || registry.lookup_by_url(&record.video_url);
    let by_handle = || registry.lookup_by_handle(record.platform, &record.account_handle);
    let by_name = || registry.lookup_by_display_name(display_name);
    let steps: [(MatchStep, &dyn Fn() -> Lookup); 3] = [
        (MatchStep::Url, &by_url),
        (MatchStep::Handle, &by_handle),
        (MatchStep::DisplayName, &by_name),
    ];

    for (step, lookup) in steps {
        match lookup() {
            Lookup::Found(creator_id) => return MatchOutcome::Matched { creator_id, step },
            Lookup::Ambiguous(candidates) => {
                return MatchOutcome::Unmatched(UnmatchedReason::Ambiguous { step, candidates })
            }
            Lookup::NotFound => continue,
        }
    }
    MatchOutcome::Unmatched(UnmatchedReason::NoCandidate)
}

/// Match a whole batch, keeping input positions.
pub fn match_all(records: &[RawVideoRecord], registry: &CreatorRegistry) -> Vec<MatchedVideoRecord> {
    records
        .iter()
        .enumerate()
        .map(|(record_index, record)| MatchedVideoRecord {
            record_index,
            record: record.clone(),
            outcome: match_record(record, registry),
        })
        .collect()
}
