//! Payout pipeline: raw records in, cost report out.
//!
//! STAGES (fixed order):
//!   1. validate config
//!   2. set aside malformed records (no view count)
//!   3. match every remaining record against one registry snapshot
//!   4. group matched records by creator
//!   5. deduplicate each creator's records
//!   6. cost each creator's unique videos
//!
//! RULE: the pipeline does no I/O. Loading inputs and persisting the
//! report belong to the caller.

use crate::{
    bonus::{BonusEngine, BonusMode},
    config::PayoutConfig,
    dedup::{deduplicate, UniqueVideo},
    diagnostic::Diagnostic,
    error::PayoutResult,
    matcher::match_record,
    money::Cents,
    record::{MatchedVideoRecord, RawVideoRecord},
    registry::CreatorRegistry,
    types::{CreatorId, Platform},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One unique video's share of its creator's cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoContribution {
    pub video:      UniqueVideo,
    pub base_cost:  Cents,
    /// Zero in summed mode.
    pub bonus_cost: Cents,
    pub qualified:  bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub creator_id:            CreatorId,
    pub display_name:          String,
    pub bonus_mode:            BonusMode,
    pub base_rate:             Cents,
    /// Matched raw records before dedup.
    pub record_count:          usize,
    pub unique_video_count:    usize,
    pub qualified_video_count: usize,
    pub total_views:           u64,
    pub base_cost:             Cents,
    pub bonus_cost:            Cents,
    pub total_cost:            Cents,
    pub platforms:             BTreeSet<Platform>,
    pub videos:                Vec<VideoContribution>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTotals {
    pub creators:         usize,
    pub unique_videos:    usize,
    pub qualified_videos: usize,
    pub total_views:      u64,
    pub base_cost:        Cents,
    pub bonus_cost:       Cents,
    pub total_cost:       Cents,
    /// Cost per thousand views, rounded down.
    pub cost_per_mille:   Cents,
}

impl CostTotals {
    pub fn from_breakdowns(breakdowns: &[CostBreakdown]) -> Self {
        let mut totals = CostTotals {
            creators: breakdowns.len(),
            ..CostTotals::default()
        };
        for b in breakdowns {
            totals.unique_videos += b.unique_video_count;
            totals.qualified_videos += b.qualified_video_count;
            totals.total_views += b.total_views;
            totals.base_cost += b.base_cost;
            totals.bonus_cost += b.bonus_cost;
            totals.total_cost += b.total_cost;
        }
        totals.cost_per_mille = totals.total_cost.per_mille(totals.total_views);
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutReport {
    pub bonus_mode:  BonusMode,
    /// Sorted by creator id. Creators with no matched videos are absent.
    pub breakdowns:  Vec<CostBreakdown>,
    pub unmatched:   Vec<RawVideoRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub totals:      CostTotals,
}

impl PayoutReport {
    pub fn breakdown(&self, creator_id: &str) -> Option<&CostBreakdown> {
        self.breakdowns.iter().find(|b| b.creator_id == creator_id)
    }

    /// Input records seen by the run. Every record either reached a
    /// breakdown or raised exactly one diagnostic.
    pub fn record_count(&self) -> usize {
        self.breakdowns.iter().map(|b| b.record_count).sum::<usize>() + self.diagnostics.len()
    }
}

/// The same input costed under both bonus modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeComparison {
    pub individual: PayoutReport,
    pub summed:     PayoutReport,
}

impl ModeComparison {
    /// Summed total minus individual total.
    pub fn difference(&self) -> Cents {
        self.summed.totals.total_cost - self.individual.totals.total_cost
    }

    /// The cheaper mode. Individual on a tie.
    pub fn cheaper(&self) -> BonusMode {
        if self.summed.totals.total_cost < self.individual.totals.total_cost {
            BonusMode::Summed
        } else {
            BonusMode::Individual
        }
    }
}

pub struct Pipeline {
    registry: Arc<CreatorRegistry>,
    config:   PayoutConfig,
}

impl Pipeline {
    /// `registry` is the snapshot used for the whole run.
    pub fn new(registry: Arc<CreatorRegistry>, config: PayoutConfig) -> Self {
        Self { registry, config }
    }

    pub fn run(&self, records: &[RawVideoRecord]) -> PayoutResult<PayoutReport> {
        self.config.validate()?;

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let mut unmatched: Vec<RawVideoRecord> = Vec::new();
        let mut by_creator: BTreeMap<CreatorId, Vec<MatchedVideoRecord>> = BTreeMap::new();

        for (record_index, record) in records.iter().enumerate() {
            if record.view_count.is_none() {
                let diagnostic = Diagnostic::MalformedRecord {
                    record_index,
                    video_url: record.video_url.clone(),
                    reason:    "missing view count".into(),
                };
                log::warn!("pipeline: {diagnostic}");
                diagnostics.push(diagnostic);
                continue;
            }

            let matched = MatchedVideoRecord {
                record_index,
                record: record.clone(),
                outcome: match_record(record, &self.registry),
            };
            if let Some(diagnostic) = Diagnostic::from_match(&matched) {
                log::warn!("pipeline: {diagnostic}");
                diagnostics.push(diagnostic);
                unmatched.push(matched.record);
                continue;
            }
            if let Some(creator_id) = matched.creator_id() {
                by_creator.entry(creator_id.to_string()).or_default().push(matched);
            }
        }

        let breakdowns = by_creator
            .iter()
            .map(|(creator_id, matched)| self.cost_creator(creator_id, matched))
            .collect::<PayoutResult<Vec<_>>>()?;
        let totals = CostTotals::from_breakdowns(&breakdowns);

        log::info!(
            "pipeline: {} record(s), {} creator(s), {} unique video(s), {} unmatched, total {} ({} mode)",
            records.len(),
            totals.creators,
            totals.unique_videos,
            unmatched.len(),
            totals.total_cost,
            self.config.bonus_mode
        );

        Ok(PayoutReport {
            bonus_mode: self.config.bonus_mode,
            breakdowns,
            unmatched,
            diagnostics,
            totals,
        })
    }

    /// Run once per bonus mode against the same snapshot.
    pub fn compare(&self, records: &[RawVideoRecord]) -> PayoutResult<ModeComparison> {
        compare_modes(Arc::clone(&self.registry), &self.config, records)
    }

    fn cost_creator(
        &self,
        creator_id: &str,
        matched: &[MatchedVideoRecord],
    ) -> PayoutResult<CostBreakdown> {
        let videos = deduplicate(matched, &self.config.dedup)?;
        let cost = BonusEngine::new(&self.config).creator_cost(creator_id, &videos);

        let display_name = self
            .registry
            .get(creator_id)
            .map(|c| c.display_name.clone())
            .unwrap_or_else(|| creator_id.to_string());
        let platforms = videos.iter().flat_map(|v| v.platforms.iter().copied()).collect();

        log::debug!(
            "pipeline: '{creator_id}' {} record(s) -> {} video(s), {} qualified, base {} + bonus {} = {}",
            matched.len(),
            videos.len(),
            cost.qualified_count,
            cost.base_cost,
            cost.bonus_cost,
            cost.total_cost
        );

        let unique_video_count = videos.len();
        let contributions = videos
            .into_iter()
            .zip(cost.per_video)
            .map(|(video, vc)| VideoContribution {
                video,
                base_cost:  vc.base_cost,
                bonus_cost: vc.bonus_cost,
                qualified:  vc.qualified,
            })
            .collect();

        Ok(CostBreakdown {
            creator_id: creator_id.to_string(),
            display_name,
            bonus_mode: self.config.bonus_mode,
            base_rate: cost.base_rate,
            record_count: matched.len(),
            unique_video_count,
            qualified_video_count: cost.qualified_count,
            total_views: cost.total_views,
            base_cost: cost.base_cost,
            bonus_cost: cost.bonus_cost,
            total_cost: cost.total_cost,
            platforms,
            videos: contributions,
        })
    }
}

/// Cost the same records under individual and summed modes.
pub fn compare_modes(
    registry: Arc<CreatorRegistry>,
    config: &PayoutConfig,
    records: &[RawVideoRecord],
) -> PayoutResult<ModeComparison> {
    let individual = Pipeline::new(
        Arc::clone(&registry),
        config.clone().with_mode(BonusMode::Individual),
    )
    .run(records)?;
    let summed = Pipeline::new(registry, config.clone().with_mode(BonusMode::Summed)).run(records)?;
    Ok(ModeComparison { individual, summed })
}
