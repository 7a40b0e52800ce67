//! Read-only lookup tables resolved once per request before the pass runs.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::db::models::{
    parse_timestamp, AthleteSimulation, CanonicalAthleteId, GameLedgerEntry, OddsEntry,
    OddsFeed, SeasonStats, Service, SimulationsFeed, Sport, TeamAveragesFeed,
    UNRESOLVED_ATHLETE_ID,
};

/// Provider player id → canonical athlete id, per (sport, service).
#[derive(Debug, Clone, Default)]
pub struct Crosswalk {
    mappings: HashMap<(Sport, Service, String), CanonicalAthleteId>,
}

impl Crosswalk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        sport: Sport,
        service: Service,
        provider_id: &str,
        canonical_id: CanonicalAthleteId,
    ) {
        self.mappings
            .insert((sport, service, provider_id.trim().to_string()), canonical_id);
    }

    /// Returns `None` for unknown ids and for ids mapped to the unresolved
    /// sentinel.
    pub fn resolve(
        &self,
        provider_id: &str,
        sport: Sport,
        service: Service,
    ) -> Option<CanonicalAthleteId> {
        self.mappings
            .get(&(sport, service, provider_id.trim().to_string()))
            .copied()
            .filter(|&id| id != UNRESOLVED_ATHLETE_ID)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Everything the simulation feed knows about one athlete.
#[derive(Debug, Clone, Default)]
pub struct AthleteLedger {
    pub team: String,
    pub season: SeasonStats,
    pub games: Vec<GameLedgerEntry>,
}

/// Ledger, odds and team-average tables for one slate.
#[derive(Debug, Clone, Default)]
pub struct SlateTables {
    ledgers: HashMap<CanonicalAthleteId, AthleteLedger>,
    odds: HashMap<String, Vec<OddsEntry>>,
    averages: HashMap<String, f64>,
}

fn team_key(team: &str) -> String {
    team.trim().to_uppercase()
}

impl SlateTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_feeds(
        simulations: SimulationsFeed,
        odds: Option<OddsFeed>,
        averages: Option<TeamAveragesFeed>,
    ) -> Self {
        let mut tables = SlateTables::new();
        for athlete in simulations.athletes {
            tables.insert_athlete(athlete);
        }
        if let Some(odds) = odds {
            for (team, lines) in odds.teams {
                let mut entries = Vec::with_capacity(lines.len());
                for line in lines {
                    match parse_timestamp(&line.commence_time) {
                        Some(commence_time) => entries.push(OddsEntry {
                            commence_time,
                            implied_points: line.implied_points,
                        }),
                        None => warn!(
                            "Dropping odds line for {} with malformed commence time '{}'",
                            team, line.commence_time
                        ),
                    }
                }
                tables.insert_odds(&team, entries);
            }
        }
        if let Some(averages) = averages {
            for (team, avg) in averages.teams {
                tables.insert_team_average(&team, avg);
            }
        }
        debug!(
            "SlateTables: {} athletes, {} odds teams, {} averages",
            tables.ledgers.len(),
            tables.odds.len(),
            tables.averages.len()
        );
        tables
    }

    pub fn insert_athlete(&mut self, athlete: AthleteSimulation) {
        if athlete.canonical_id == UNRESOLVED_ATHLETE_ID {
            return;
        }
        self.ledgers.insert(
            athlete.canonical_id,
            AthleteLedger {
                team: athlete.team,
                season: athlete.season,
                games: athlete.games,
            },
        );
    }

    pub fn insert_odds(&mut self, team: &str, entries: Vec<OddsEntry>) {
        self.odds.insert(team_key(team), entries);
    }

    pub fn insert_team_average(&mut self, team: &str, average: f64) {
        self.averages.insert(team_key(team), average);
    }

    pub fn athlete(&self, id: CanonicalAthleteId) -> Option<&AthleteLedger> {
        self.ledgers.get(&id)
    }

    /// Game ledger for an athlete, empty when the athlete is unknown.
    pub fn ledger(&self, id: CanonicalAthleteId) -> &[GameLedgerEntry] {
        self.ledgers
            .get(&id)
            .map(|l| l.games.as_slice())
            .unwrap_or(&[])
    }

    pub fn odds(&self, team: &str) -> &[OddsEntry] {
        self.odds
            .get(&team_key(team))
            .map(|o| o.as_slice())
            .unwrap_or(&[])
    }

    /// Long-run scoring average, `0.0` when unknown.
    pub fn team_average(&self, team: &str) -> f64 {
        self.averages.get(&team_key(team)).copied().unwrap_or(0.0)
    }
}
