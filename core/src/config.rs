use crate::{
    bonus::BonusMode,
    error::{PayoutError, PayoutResult},
    money::Cents,
    types::CreatorId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How far apart two records may be and still count as one upload.
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupTolerances {
    pub date_days:     i64,
    pub duration_secs: u32,
}

impl Default for DedupTolerances {
    fn default() -> Self {
        Self {
            date_days:     1,
            duration_secs: 5,
        }
    }
}

/// Everything a run can be tuned with. Missing JSON fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutConfig {
    pub bonus_mode:          BonusMode,
    /// Per qualifying video. Written in dollars in JSON, like `--base-rate`.
    #[serde(with = "crate::money::dollars")]
    pub base_rate:           Cents,
    pub base_min_views:      u64,
    pub bonus_min_views:     u64,
    /// Creators paid a different base rate (dollars), keyed by creator id.
    #[serde(with = "crate::money::dollars::by_key")]
    pub base_rate_overrides: BTreeMap<CreatorId, Cents>,
    pub dedup:               DedupTolerances,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            bonus_mode:          BonusMode::Individual,
            base_rate:           Cents::from_dollars(30),
            base_min_views:      3_000,
            bonus_min_views:     10_000,
            base_rate_overrides: BTreeMap::new(),
            dedup:               DedupTolerances::default(),
        }
    }
}

impl PayoutConfig {
    /// Load from a JSON file and validate. Rates are dollar amounts:
    /// `{"base_rate": 30}` and `{"base_rate": "$30.00"}` both pay $30.
    /// In tests, use PayoutConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PayoutConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("config: loaded {path} ({:?} mode)", config.bonus_mode);
        Ok(config)
    }

    pub fn with_mode(mut self, mode: BonusMode) -> Self {
        self.bonus_mode = mode;
        self
    }

    pub fn with_base_rate(mut self, rate: Cents) -> Self {
        self.base_rate = rate;
        self
    }

    pub fn with_override(mut self, creator_id: impl Into<CreatorId>, rate: Cents) -> Self {
        self.base_rate_overrides.insert(creator_id.into(), rate);
        self
    }

    /// Base rate that applies to one creator.
    pub fn base_rate_for(&self, creator_id: &str) -> Cents {
        self.base_rate_overrides
            .get(creator_id)
            .copied()
            .unwrap_or(self.base_rate)
    }

    pub fn validate(&self) -> PayoutResult<()> {
        if self.base_rate.is_negative() {
            return Err(PayoutError::Config {
                reason: format!("base_rate must not be negative, got {}", self.base_rate),
            });
        }
        if let Some((id, rate)) = self.base_rate_overrides.iter().find(|(_, r)| r.is_negative()) {
            return Err(PayoutError::Config {
                reason: format!("base rate override for '{id}' is negative ({rate})"),
            });
        }
        if self.dedup.date_days < 0 {
            return Err(PayoutError::Config {
                reason: format!("dedup.date_days must not be negative, got {}", self.dedup.date_days),
            });
        }
        Ok(())
    }
}
