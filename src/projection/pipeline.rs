//! One aggregation pass over a draftable listing.
//!
//! For each roster slot: resolve the canonical id, select the next game,
//! enrich with odds, assemble the record, then gate it through the pass's
//! dedup set. Per-slot failures become diagnostics; nothing aborts the pass.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::assembler::{assemble, AssemblyInput};
use super::dedup::{Admission, DedupGate};
use super::game_selector::select_next_game;
use super::odds::{enrich, MatchupOdds};
use super::tables::{Crosswalk, SlateTables};
use crate::db::models::{ProjectionRecord, RosterSlotEntry, Service, Sport};
use crate::error::SlotError;

#[derive(Debug, Clone, Copy)]
pub struct SlateContext {
    pub sport: Sport,
    pub service: Service,
    pub reference_time: DateTime<Utc>,
}

/// A roster slot that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotDiagnostic {
    pub provider_id: String,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub processed: usize,
    pub emitted: usize,
    pub duplicates: usize,
    pub ineligible: usize,
    pub unresolved: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AggregateOutcome {
    pub records: Vec<ProjectionRecord>,
    pub diagnostics: Vec<SlotDiagnostic>,
    pub stats: PassStats,
}

/// Accumulators scoped to a single pass.
pub struct AggregationPass<'a> {
    ctx: SlateContext,
    tables: &'a SlateTables,
    crosswalk: &'a Crosswalk,
    gate: DedupGate,
    outcome: AggregateOutcome,
}

impl<'a> AggregationPass<'a> {
    pub fn new(ctx: SlateContext, tables: &'a SlateTables, crosswalk: &'a Crosswalk) -> Self {
        AggregationPass {
            ctx,
            tables,
            crosswalk,
            gate: DedupGate::new(),
            outcome: AggregateOutcome::default(),
        }
    }

    pub fn process(&mut self, slot: &RosterSlotEntry) {
        self.outcome.stats.processed += 1;
        match self.build_record(slot) {
            Ok(record) => match self.gate.admit(&record) {
                Admission::Accepted => {
                    self.outcome.stats.emitted += 1;
                    self.outcome.records.push(record);
                }
                Admission::Duplicate => {
                    debug!("Duplicate draftable {} suppressed", record.draftable_uid);
                    self.outcome.stats.duplicates += 1;
                }
                Admission::Ineligible => self.outcome.stats.ineligible += 1,
            },
            Err(e) => {
                warn!(
                    "Skipping draftable {} ({}): {}",
                    slot.provider_id, slot.name, e
                );
                self.outcome.stats.skipped += 1;
                self.outcome.diagnostics.push(SlotDiagnostic {
                    provider_id: slot.provider_id.clone(),
                    name: slot.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn build_record(&mut self, slot: &RosterSlotEntry) -> Result<ProjectionRecord, SlotError> {
        let tables = self.tables;
        let canonical_id =
            self.crosswalk
                .resolve(&slot.provider_id, self.ctx.sport, self.ctx.service);
        if canonical_id.is_none() {
            debug!(
                "No crosswalk mapping for {} {} player {} ({})",
                self.ctx.sport, self.ctx.service, slot.provider_id, slot.name
            );
            self.outcome.stats.unresolved += 1;
        }

        let athlete = canonical_id.and_then(|id| tables.athlete(id));
        let game = match canonical_id {
            Some(id) => select_next_game(tables.ledger(id), self.ctx.reference_time)?,
            None => None,
        };

        let odds = match (athlete, game) {
            (Some(a), Some(g)) => {
                let team = if a.team.trim().is_empty() {
                    slot.team.as_str()
                } else {
                    a.team.as_str()
                };
                enrich(tables, team, &g.entry.opponent, g.game_time)
            }
            _ => MatchupOdds::default(),
        };

        let input = AssemblyInput {
            sport: self.ctx.sport,
            service: self.ctx.service,
            canonical_id,
            athlete,
            game,
            odds,
        };
        Ok(assemble(slot, &input))
    }

    pub fn finish(self) -> AggregateOutcome {
        self.outcome
    }
}

/// Run a full pass over `slots` in listing order.
pub fn aggregate(
    slots: &[RosterSlotEntry],
    ctx: SlateContext,
    tables: &SlateTables,
    crosswalk: &Crosswalk,
) -> AggregateOutcome {
    let mut pass = AggregationPass::new(ctx, tables, crosswalk);
    for slot in slots {
        pass.process(slot);
    }
    let outcome = pass.finish();
    let s = outcome.stats;
    info!(
        "Aggregated {} {} slate: {} slots → {} projections ({} duplicate, {} ineligible, {} unresolved, {} skipped)",
        ctx.sport, ctx.service, s.processed, s.emitted, s.duplicates, s.ineligible, s.unresolved, s.skipped
    );
    outcome
}
