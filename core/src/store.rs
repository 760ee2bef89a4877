//! SQLite persistence for finished runs.
//!
//! RULE: Only store.rs talks to the database.
//! The pipeline never calls the store; the runner saves reports after the fact.

use crate::{
    config::PayoutConfig,
    diagnostic::Diagnostic,
    error::PayoutResult,
    money::Cents,
    pipeline::{CostBreakdown, PayoutReport},
    types::CreatorId,
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct ReportStore {
    conn: Connection,
}

/// Run-level row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRun {
    pub run_id:          String,
    pub bonus_mode:      String,
    pub record_count:    usize,
    pub unmatched_count: usize,
    pub total_views:     u64,
    pub base_cost:       Cents,
    pub bonus_cost:      Cents,
    pub total_cost:      Cents,
    pub created_at:      String,
}

/// Queryable columns of one creator's breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCreatorCost {
    pub creator_id:       CreatorId,
    pub display_name:     String,
    pub unique_videos:    usize,
    pub qualified_videos: usize,
    pub total_views:      u64,
    pub base_cost:        Cents,
    pub bonus_cost:       Cents,
    pub total_cost:       Cents,
}

impl ReportStore {
    /// Open (or create) the report database at `path`.
    pub fn open(path: &str) -> PayoutResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PayoutResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PayoutResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_payout_runs.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        report: &PayoutReport,
        config: &PayoutConfig,
        created_at: &str,
    ) -> PayoutResult<()> {
        let config_json = serde_json::to_string(config)?;
        self.conn.execute(
            "INSERT INTO payout_run (
                run_id, bonus_mode, record_count, unmatched_count, total_views,
                base_cents, bonus_cents, total_cents, config_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                run_id,
                report.bonus_mode.as_str(),
                report.record_count() as i64,
                report.unmatched.len() as i64,
                report.totals.total_views as i64,
                report.totals.base_cost.as_i64(),
                report.totals.bonus_cost.as_i64(),
                report.totals.total_cost.as_i64(),
                config_json,
                created_at,
            ],
        )?;
        Ok(())
    }

    pub fn run(&self, run_id: &str) -> PayoutResult<Option<StoredRun>> {
        let run = self
            .conn
            .query_row(
                "SELECT run_id, bonus_mode, record_count, unmatched_count, total_views,
                        base_cents, bonus_cents, total_cents, created_at
                 FROM payout_run WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok(StoredRun {
                        run_id:          row.get(0)?,
                        bonus_mode:      row.get(1)?,
                        record_count:    row.get::<_, i64>(2)? as usize,
                        unmatched_count: row.get::<_, i64>(3)? as usize,
                        total_views:     row.get::<_, i64>(4)? as u64,
                        base_cost:       Cents(row.get(5)?),
                        bonus_cost:      Cents(row.get(6)?),
                        total_cost:      Cents(row.get(7)?),
                        created_at:      row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }

    /// Persist a whole report in one transaction: the run row, every
    /// breakdown and every diagnostic.
    pub fn save_report(
        &self,
        run_id: &str,
        report: &PayoutReport,
        config: &PayoutConfig,
        created_at: &str,
    ) -> PayoutResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.insert_run(run_id, report, config, created_at)?;
        for breakdown in &report.breakdowns {
            self.insert_creator_cost(run_id, breakdown)?;
        }
        for diagnostic in &report.diagnostics {
            self.insert_diagnostic(run_id, diagnostic)?;
        }
        tx.commit()?;
        log::debug!(
            "store: saved run {run_id} ({} breakdown(s), {} diagnostic(s))",
            report.breakdowns.len(),
            report.diagnostics.len()
        );
        Ok(())
    }

    // ── Creator costs ──────────────────────────────────────────

    fn insert_creator_cost(&self, run_id: &str, b: &CostBreakdown) -> PayoutResult<()> {
        let breakdown_json = serde_json::to_string(b)?;
        self.conn.execute(
            "INSERT INTO creator_cost (
                run_id, creator_id, display_name, unique_videos, qualified_videos,
                total_views, base_cents, bonus_cents, total_cents, breakdown_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                run_id,
                &b.creator_id,
                &b.display_name,
                b.unique_video_count as i64,
                b.qualified_video_count as i64,
                b.total_views as i64,
                b.base_cost.as_i64(),
                b.bonus_cost.as_i64(),
                b.total_cost.as_i64(),
                breakdown_json,
            ],
        )?;
        Ok(())
    }

    pub fn creator_costs_for_run(&self, run_id: &str) -> PayoutResult<Vec<StoredCreatorCost>> {
        let mut stmt = self.conn.prepare(
            "SELECT creator_id, display_name, unique_videos, qualified_videos,
                    total_views, base_cents, bonus_cents, total_cents
             FROM creator_cost WHERE run_id = ?1
             ORDER BY creator_id ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok(StoredCreatorCost {
                creator_id:       row.get(0)?,
                display_name:     row.get(1)?,
                unique_videos:    row.get::<_, i64>(2)? as usize,
                qualified_videos: row.get::<_, i64>(3)? as usize,
                total_views:      row.get::<_, i64>(4)? as u64,
                base_cost:        Cents(row.get(5)?),
                bonus_cost:       Cents(row.get(6)?),
                total_cost:       Cents(row.get(7)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Full breakdowns, decoded from their stored JSON.
    pub fn breakdowns_for_run(&self, run_id: &str) -> PayoutResult<Vec<CostBreakdown>> {
        let mut stmt = self.conn.prepare(
            "SELECT breakdown_json FROM creator_cost WHERE run_id = ?1
             ORDER BY creator_id ASC",
        )?;
        let payloads = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|json| serde_json::from_str(json).map_err(Into::into))
            .collect()
    }

    // ── Diagnostics ────────────────────────────────────────────

    fn insert_diagnostic(&self, run_id: &str, diagnostic: &Diagnostic) -> PayoutResult<()> {
        self.conn.execute(
            "INSERT INTO run_diagnostic (run_id, record_index, kind, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                run_id,
                diagnostic.record_index() as i64,
                diagnostic.kind(),
                serde_json::to_string(diagnostic)?,
            ],
        )?;
        Ok(())
    }

    /// Diagnostics in the order they were raised.
    pub fn diagnostics_for_run(&self, run_id: &str) -> PayoutResult<Vec<Diagnostic>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM run_diagnostic WHERE run_id = ?1 ORDER BY id ASC",
        )?;
        let payloads = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|json| serde_json::from_str(json).map_err(Into::into))
            .collect()
    }
}
