//! Bonus engine: view counts to money.
//!
//! The tier table is fixed. A creator's base pay is per qualifying video;
//! the bonus is either per video (`Individual`) or on the creator's summed
//! views (`Summed`). Everything here is pure integer arithmetic.

use crate::{config::PayoutConfig, dedup::UniqueVideo, money::Cents};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusTier {
    pub min_views: u64,
    pub amount:    Cents,
}

/// Ascending, inclusive lower bounds. The last tier is the cap.
pub const BONUS_TIERS: [BonusTier; 7] = [
    BonusTier { min_views: 0,         amount: Cents::from_dollars(0) },
    BonusTier { min_views: 10_000,    amount: Cents::from_dollars(45) },
    BonusTier { min_views: 50_000,    amount: Cents::from_dollars(170) },
    BonusTier { min_views: 100_000,   amount: Cents::from_dollars(470) },
    BonusTier { min_views: 500_000,   amount: Cents::from_dollars(1_270) },
    BonusTier { min_views: 2_000_000, amount: Cents::from_dollars(2_270) },
    BonusTier { min_views: 5_000_000, amount: Cents::from_dollars(2_970) },
];

/// Highest tier whose lower bound `views` reaches.
pub fn bonus_for_views(views: u64) -> Cents {
    BONUS_TIERS
        .iter()
        .rev()
        .find(|tier| views >= tier.min_views)
        .map(|tier| tier.amount)
        .unwrap_or(Cents::ZERO)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusMode {
    /// Each unique video earns its own tier bonus.
    #[default]
    Individual,
    /// One tier bonus on the creator's total views.
    Summed,
}

impl BonusMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusMode::Individual => "individual",
            BonusMode::Summed     => "summed",
        }
    }
}

impl fmt::Display for BonusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BonusMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "individual" => Ok(BonusMode::Individual),
            "summed"     => Ok(BonusMode::Summed),
            other => Err(format!("Unknown bonus mode: {other} (expected individual|summed)")),
        }
    }
}

/// Tier lookup gated by the configured minimum.
pub struct BonusEngine<'a> {
    config: &'a PayoutConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoCost {
    pub base_cost:  Cents,
    /// Always zero in `Summed` mode; the bonus belongs to the creator.
    pub bonus_cost: Cents,
    pub qualified:  bool,
}

/// What one creator's set of unique videos costs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorCost {
    pub base_rate:       Cents,
    /// Aligned with the input slice.
    pub per_video:       Vec<VideoCost>,
    pub qualified_count: usize,
    pub total_views:     u64,
    pub base_cost:       Cents,
    pub bonus_cost:      Cents,
    pub total_cost:      Cents,
}

impl<'a> BonusEngine<'a> {
    pub fn new(config: &'a PayoutConfig) -> Self {
        Self { config }
    }

    pub fn bonus(&self, views: u64) -> Cents {
        if views < self.config.bonus_min_views {
            Cents::ZERO
        } else {
            bonus_for_views(views)
        }
    }

    pub fn qualifies_for_base(&self, views: u64) -> bool {
        views >= self.config.base_min_views
    }

    pub fn base_cost(&self, video: &UniqueVideo, base_rate: Cents) -> Cents {
        if self.qualifies_for_base(video.total_views) {
            base_rate
        } else {
            Cents::ZERO
        }
    }

    /// Cost of one creator's unique videos under the configured mode.
    pub fn creator_cost(&self, creator_id: &str, videos: &[UniqueVideo]) -> CreatorCost {
        let base_rate = self.config.base_rate_for(creator_id);
        let mode = self.config.bonus_mode;

        let per_video: Vec<VideoCost> = videos
            .iter()
            .map(|v| VideoCost {
                base_cost:  self.base_cost(v, base_rate),
                bonus_cost: match mode {
                    BonusMode::Individual => self.bonus(v.total_views),
                    BonusMode::Summed     => Cents::ZERO,
                },
                qualified:  self.qualifies_for_base(v.total_views),
            })
            .collect();

        let total_views: u64 = videos.iter().map(|v| v.total_views).sum();
        let base_cost: Cents = per_video.iter().map(|c| c.base_cost).sum();
        let bonus_cost = match mode {
            BonusMode::Individual => per_video.iter().map(|c| c.bonus_cost).sum(),
            BonusMode::Summed     => self.bonus(total_views),
        };
        let qualified_count = per_video.iter().filter(|c| c.qualified).count();

        CreatorCost {
            base_rate,
            per_video,
            qualified_count,
            total_views,
            base_cost,
            bonus_cost,
            total_cost: base_cost + bonus_cost,
        }
    }
}
