//! Cross-platform deduplication for one creator's videos.
//!
//! Two records are linked when ALL hold:
//!   - normalized captions are equal (two missing captions are equal;
//!     missing vs present is not),
//!   - dates are both missing, or within `date_days` of each other,
//!   - durations are both missing, or within `duration_secs`.
//!
//! Groups are the connected components of that relation (union-find over
//! input indices). Linking is not transitive on its own: A~B and B~C put
//! A and C in one group even when A≁C.
//!
//! RULE: output order and representative choice depend only on input
//! order. Same input, same groups, same representatives.

use crate::{
    config::DedupTolerances,
    error::{PayoutError, PayoutResult},
    normalize::normalize_caption,
    record::MatchedVideoRecord,
    types::{CreatorId, Platform},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Indices (into the deduplicated slice) believed to be one upload,
/// in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub creator_id: CreatorId,
    pub members:    Vec<usize>,
}

/// The merged result of one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueVideo {
    pub creator_id:       CreatorId,
    /// Sum over every member.
    pub total_views:      u64,
    /// Representative fields come from the most-viewed member.
    pub platform:         Platform,
    pub video_url:        String,
    pub caption:          Option<String>,
    pub published_date:   Option<NaiveDate>,
    pub duration_seconds: Option<u32>,
    /// Pipeline input position of the representative.
    pub representative:   usize,
    pub member_count:     usize,
    pub platforms:        BTreeSet<Platform>,
    pub member_urls:      Vec<String>,
}

/// Disjoint-set forest keyed by array index.
struct UnionFind {
    parent: Vec<usize>,
    rank:   Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank:   vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less    => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal   => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// What the similarity test looks at, computed once per record.
struct Signature {
    caption:  String,
    date:     Option<NaiveDate>,
    duration: Option<u32>,
}

impl Signature {
    fn of(record: &MatchedVideoRecord) -> Self {
        Self {
            caption:  normalize_caption(record.record.caption.as_deref()),
            date:     record.record.published_date,
            duration: record.record.duration_seconds,
        }
    }
}

fn dates_close(a: Option<NaiveDate>, b: Option<NaiveDate>, tol: &DedupTolerances) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).num_days().abs() <= tol.date_days,
        _ => false,
    }
}

fn durations_close(a: Option<u32>, b: Option<u32>, tol: &DedupTolerances) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.abs_diff(b) <= tol.duration_secs,
        _ => false,
    }
}

fn linked(a: &Signature, b: &Signature, tol: &DedupTolerances) -> bool {
    a.caption == b.caption
        && dates_close(a.date, b.date, tol)
        && durations_close(a.duration, b.duration, tol)
}

/// Check every record belongs to one matched creator and return it.
fn common_creator(records: &[MatchedVideoRecord]) -> PayoutResult<Option<CreatorId>> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let expected = first.creator_id().unwrap_or("<unmatched>").to_string();
    for r in records {
        let found = r.creator_id().unwrap_or("<unmatched>");
        if first.creator_id().is_none() || found != expected {
            return Err(PayoutError::MixedCreators {
                expected,
                found: found.to_string(),
            });
        }
    }
    Ok(Some(expected))
}

/// Partition one creator's records into duplicate groups.
pub fn group_duplicates(
    records: &[MatchedVideoRecord],
    tol: &DedupTolerances,
) -> PayoutResult<Vec<DuplicateGroup>> {
    let Some(creator_id) = common_creator(records)? else {
        return Ok(Vec::new());
    };

    let signatures: Vec<Signature> = records.iter().map(Signature::of).collect();

    // Caption equality is required, so only same-caption records can link.
    let mut by_caption: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, sig) in signatures.iter().enumerate() {
        by_caption.entry(sig.caption.as_str()).or_default().push(i);
    }

    let mut forest = UnionFind::new(records.len());
    for bucket in by_caption.values() {
        for (pos, &i) in bucket.iter().enumerate() {
            for &j in &bucket[pos + 1..] {
                if linked(&signatures[i], &signatures[j], tol) {
                    forest.union(i, j);
                }
            }
        }
    }

    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for i in 0..records.len() {
        let root = forest.find(i);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            groups.push(DuplicateGroup {
                creator_id: creator_id.clone(),
                members:    Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].members.push(i);
    }
    Ok(groups)
}

/// Merge one group: sum the views, copy the most-viewed member's metadata.
/// Ties go to the member seen first. `None` for a group with no members.
pub fn merge_group(records: &[MatchedVideoRecord], group: &DuplicateGroup) -> Option<UniqueVideo> {
    let (&first, rest) = group.members.split_first()?;
    let mut rep = first;
    for &i in rest {
        if records[i].views() > records[rep].views() {
            rep = i;
        }
    }
    let chosen = &records[rep].record;

    Some(UniqueVideo {
        creator_id:       group.creator_id.clone(),
        total_views:      group.members.iter().map(|&i| records[i].views()).sum(),
        platform:         chosen.platform,
        video_url:        chosen.video_url.clone(),
        caption:          chosen.caption.clone(),
        published_date:   chosen.published_date,
        duration_seconds: chosen.duration_seconds,
        representative:   records[rep].record_index,
        member_count:     group.members.len(),
        platforms:        group.members.iter().map(|&i| records[i].record.platform).collect(),
        member_urls:      group
            .members
            .iter()
            .map(|&i| records[i].record.video_url.clone())
            .filter(|u| !u.is_empty())
            .collect(),
    })
}

/// Collapse one creator's records into unique videos, ordered by each
/// group's first appearance.
pub fn deduplicate(
    records: &[MatchedVideoRecord],
    tol: &DedupTolerances,
) -> PayoutResult<Vec<UniqueVideo>> {
    let groups = group_duplicates(records, tol)?;
    let videos: Vec<UniqueVideo> = groups
        .iter()
        .filter_map(|g| merge_group(records, g))
        .collect();
    if let Some(first) = videos.first() {
        log::debug!(
            "dedup: '{}' {} record(s) -> {} unique video(s)",
            first.creator_id,
            records.len(),
            videos.len()
        );
    }
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_find_merges_chains() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(1, 2);
        uf.union(3, 4);
        assert_eq!(uf.find(0), uf.find(2));
        assert_eq!(uf.find(3), uf.find(4));
        assert_ne!(uf.find(0), uf.find(3));
    }

    #[test]
    fn tolerances_are_inclusive() {
        let tol = DedupTolerances::default();
        let d = |day| NaiveDate::from_ymd_opt(2025, 12, day);
        assert!(dates_close(d(1), d(2), &tol));
        assert!(!dates_close(d(1), d(3), &tol));
        assert!(dates_close(None, None, &tol));
        assert!(!dates_close(d(1), None, &tol));

        assert!(durations_close(Some(30), Some(35), &tol));
        assert!(!durations_close(Some(30), Some(36), &tol));
        assert!(durations_close(None, None, &tol));
        assert!(!durations_close(None, Some(30), &tol));
    }

    #[test]
    fn empty_group_merges_to_nothing() {
        let group = DuplicateGroup {
            creator_id: "kevin-rhee".into(),
            members:    Vec::new(),
        };
        assert_eq!(merge_group(&[], &group), None);
    }
}
