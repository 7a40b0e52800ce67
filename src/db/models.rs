use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Sport-wide athlete identifier, independent of any single DFS service.
pub type CanonicalAthleteId = i64;

/// Crosswalk value meaning "no mapping exists".
pub const UNRESOLVED_ATHLETE_ID: CanonicalAthleteId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Nfl,
    Nba,
    Mlb,
    Nhl,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Nfl => "nfl",
            Sport::Nba => "nba",
            Sport::Mlb => "mlb",
            Sport::Nhl => "nhl",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nfl" | "football" | "american_football" => Ok(Sport::Nfl),
            "nba" | "basketball" => Ok(Sport::Nba),
            "mlb" | "baseball" => Ok(Sport::Mlb),
            "nhl" | "hockey" | "ice_hockey" => Ok(Sport::Nhl),
            other => Err(format!("unknown sport '{}'", other)),
        }
    }
}

/// DFS scoring service a projection is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    DraftKings,
    FanDuel,
    Yahoo,
    SuperDraft,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::DraftKings => "draftkings",
            Service::FanDuel => "fanduel",
            Service::Yahoo => "yahoo",
            Service::SuperDraft => "superdraft",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dk" | "draftkings" => Ok(Service::DraftKings),
            "fd" | "fanduel" => Ok(Service::FanDuel),
            "yahoo" => Ok(Service::Yahoo),
            "sd" | "superdraft" => Ok(Service::SuperDraft),
            other => Err(format!("unknown service '{}'", other)),
        }
    }
}

/// One value per scoring service, as the simulation feed publishes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerService<T> {
    #[serde(default)]
    pub draftkings: T,
    #[serde(default)]
    pub fanduel: T,
    #[serde(default)]
    pub yahoo: T,
    #[serde(default)]
    pub superdraft: T,
}

impl<T> PerService<T> {
    pub fn get(&self, service: Service) -> &T {
        match service {
            Service::DraftKings => &self.draftkings,
            Service::FanDuel => &self.fanduel,
            Service::Yahoo => &self.yahoo,
            Service::SuperDraft => &self.superdraft,
        }
    }
}

// ── Draftables feed ──────────────────────────────────────────────────────────

/// Key/value flag attached to a draftable, e.g. `starting_lineup = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameAttribute {
    pub key: String,
    pub value: String,
}

/// One row of a service's draftable listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSlotEntry {
    /// Service-specific player id
    pub provider_id: String,
    pub name: String,
    #[serde(default)]
    pub team: String,
    /// Raw position strings as listed, e.g. `["PG", "SG"]`
    #[serde(default)]
    pub positions: Vec<String>,
    pub salary: i64,
    /// Encodes special lineup slots (captain, utility)
    #[serde(default)]
    pub roster_slot_id: i64,
    #[serde(default = "default_true")]
    pub eligible: bool,
    #[serde(default)]
    pub game_attributes: Vec<GameAttribute>,
    #[serde(default)]
    pub injury_status: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RosterSlotEntry {
    /// Positions joined the way the service displays them, e.g. `PG/SG`.
    pub fn position_string(&self) -> String {
        self.positions.join("/")
    }

    /// Value of the first game attribute named `key`, if any.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.game_attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Draftables blob as published. Rows stay raw JSON so that one bad row can
/// be skipped on its own; see `service::decode_rows`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftablesFeed {
    #[serde(default)]
    pub slate_start: Option<serde_json::Value>,
    #[serde(default)]
    pub draftables: Vec<serde_json::Value>,
}

// ── Simulations feed ─────────────────────────────────────────────────────────

/// Simulated outcomes for one service in one game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    #[serde(default)]
    pub mean: f64,
    #[serde(default)]
    pub std_dev: f64,
    /// Sum of all simulated fantasy points
    #[serde(default)]
    pub cumulative_points: f64,
    #[serde(default)]
    pub samples: Vec<f64>,
}

/// One contest in an athlete's game ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameLedgerEntry {
    /// Scheduled start as reported by the feed (parsed per slot)
    pub game_time: String,
    #[serde(default)]
    pub opponent: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub simulations: PerService<SimulationSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    #[serde(default)]
    pub games_played: u32,
    /// Season fantasy point totals per service
    #[serde(default)]
    pub points: PerService<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteSimulation {
    pub canonical_id: CanonicalAthleteId,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub season: SeasonStats,
    #[serde(default)]
    pub games: Vec<GameLedgerEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationsFeed {
    #[serde(default)]
    pub athletes: Vec<AthleteSimulation>,
}

/// Simulations blob as published, rows not yet decoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSimulationsFeed {
    #[serde(default)]
    pub athletes: Vec<serde_json::Value>,
}

// ── Odds / averages feeds ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsLine {
    pub commence_time: String,
    pub implied_points: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OddsFeed {
    #[serde(default)]
    pub teams: HashMap<String, Vec<OddsLine>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamAveragesFeed {
    #[serde(default)]
    pub teams: HashMap<String, f64>,
}

/// Parsed odds line for one team's game.
#[derive(Debug, Clone, PartialEq)]
pub struct OddsEntry {
    pub commence_time: DateTime<Utc>,
    pub implied_points: f64,
}

// ── Crosswalk ────────────────────────────────────────────────────────────────

/// One provider-id → canonical-id mapping row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosswalkMapping {
    pub sport: Sport,
    pub service: Service,
    pub provider_id: String,
    pub canonical_id: CanonicalAthleteId,
}

// ── Output ───────────────────────────────────────────────────────────────────

/// Counts of simulated scores per 10-point bucket:
/// (-∞,0], (0,10), [10,20), [20,30), [30,40), [40,50), [50,60), [60,∞)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointHistogram(pub [u32; 8]);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineupStatus {
    Confirmed,
    Probable,
    #[default]
    Unconfirmed,
}

/// Final per-player projection row returned to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    pub draftable_uid: String,
    pub canonical_id: CanonicalAthleteId,
    pub provider_id: String,
    pub name: String,
    pub team: String,
    pub opponent: String,
    pub venue: String,
    /// RFC3339 start of the selected game, empty when none was found
    pub game_date: String,
    pub game_timestamp: i64,
    pub team_projected_points: f64,
    pub opponent_projected_points: f64,
    pub player_odds_factor: f64,
    pub projected_points: f64,
    pub std_dev: f64,
    pub cumulative_points: f64,
    pub season_average: f64,
    pub histogram: PointHistogram,
    pub position: String,
    pub eligible_positions: Vec<String>,
    pub roster_slot_id: i64,
    pub salary: i64,
    pub eligible: bool,
    pub lineup_status: LineupStatus,
    pub injury_status: String,
}

/// Parse a feed timestamp. Accepts RFC3339 and naive date-times, which are
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Like [`parse_timestamp`] but also accepts a bare `YYYY-MM-DD`, read as
/// midnight UTC.
pub fn parse_reference_time(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(raw).or_else(|| {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sport_and_service_aliases() {
        assert_eq!("NFL".parse::<Sport>(), Ok(Sport::Nfl));
        assert_eq!("hockey".parse::<Sport>(), Ok(Sport::Nhl));
        assert_eq!("dk".parse::<Service>(), Ok(Service::DraftKings));
        assert_eq!("FanDuel".parse::<Service>(), Ok(Service::FanDuel));
        assert!("cricket".parse::<Sport>().is_err());
        assert!("prizepicks".parse::<Service>().is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 19, 17, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2026-10-19T17:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-10-19T13:00:00-04:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-10-19T17:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-10-19 17:00:00"), Some(expected));
        assert_eq!(parse_timestamp("next sunday"), None);
    }

    #[test]
    fn test_parse_reference_time_accepts_bare_date() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        assert_eq!(parse_reference_time("2026-10-19"), Some(expected));
        assert_eq!(parse_reference_time("19/10/2026"), None);
    }

    #[test]
    fn test_roster_slot_defaults() {
        let slot: RosterSlotEntry = serde_json::from_str(
            r#"{"provider_id":"123","name":"Jalen Hurts","positions":["QB"],"salary":8100}"#,
        )
        .unwrap();
        assert!(slot.eligible);
        assert_eq!(slot.roster_slot_id, 0);
        assert!(slot.game_attributes.is_empty());
        assert_eq!(slot.position_string(), "QB");
    }

    #[test]
    fn test_attribute_lookup() {
        let slot: RosterSlotEntry = serde_json::from_str(
            r#"{"provider_id":"123","name":"Jalen Hurts","salary":8100,
                "game_attributes":[{"key":"injury_status","value":"Q"},
                                   {"key":"injury_status","value":"O"}]}"#,
        )
        .unwrap();
        assert_eq!(slot.attribute("injury_status"), Some("Q"));
        assert_eq!(slot.attribute("starting_lineup"), None);
    }

    #[test]
    fn test_histogram_serializes_as_array() {
        let h = PointHistogram([2, 1, 1, 0, 0, 0, 0, 1]);
        assert_eq!(serde_json::to_string(&h).unwrap(), "[2,1,1,0,0,0,0,1]");
    }

    #[test]
    fn test_per_service_lookup() {
        let sims: PerService<f64> =
            serde_json::from_str(r#"{"draftkings": 18.5, "yahoo": 12.0}"#).unwrap();
        assert_eq!(*sims.get(Service::DraftKings), 18.5);
        assert_eq!(*sims.get(Service::Yahoo), 12.0);
        assert_eq!(*sims.get(Service::FanDuel), 0.0);
    }
}
