use chrono::SecondsFormat;

use super::game_selector::SelectedGame;
use super::histogram::build_histogram;
use super::odds::MatchupOdds;
use super::rules::{season_average, slot_kind, sport_rules, SlotKind, SportRules};
use super::tables::AthleteLedger;
use crate::db::models::{
    CanonicalAthleteId, ProjectionRecord, RosterSlotEntry, Service, Sport,
    UNRESOLVED_ATHLETE_ID,
};

/// Injury designation used when none applies.
pub const NO_INJURY: &str = "None";

/// Game attribute carrying the injury designation when the slot has no
/// dedicated field.
pub const INJURY_ATTRIBUTE: &str = "injury_status";

/// Joined data for one roster slot, ready to be flattened into a record.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    pub sport: Sport,
    pub service: Service,
    pub canonical_id: Option<CanonicalAthleteId>,
    pub athlete: Option<&'a AthleteLedger>,
    pub game: Option<SelectedGame<'a>>,
    pub odds: MatchupOdds,
}

/// Lowercase, split combined strings like `PG/SG`, drop blanks and repeats.
pub fn normalize_positions(positions: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in positions {
        for part in raw.split('/') {
            let p = part.trim().to_lowercase();
            if !p.is_empty() && !out.contains(&p) {
                out.push(p);
            }
        }
    }
    out
}

/// Listed positions plus derived tags (`flex`, `util`, ...) and the
/// showdown slot tag, without duplicates.
pub fn eligibility_tags(rules: &SportRules, normalized: &[String], kind: SlotKind) -> Vec<String> {
    let mut tags = normalized.to_vec();
    for derived in rules.derived_tags {
        let applies = normalized
            .iter()
            .any(|p| derived.any_of.contains(&p.as_str()));
        if applies && !tags.iter().any(|t| t == derived.tag) {
            tags.push(derived.tag.to_string());
        }
    }
    if let Some(tag) = kind.tag() {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

pub fn draftable_uid(
    provider_id: &str,
    canonical_id: CanonicalAthleteId,
    kind: SlotKind,
    position: &str,
    salary: i64,
) -> String {
    format!(
        "{}-{}{}-{}-{}",
        provider_id,
        canonical_id,
        kind.identity_suffix(),
        position,
        salary
    )
}

pub fn assemble(slot: &RosterSlotEntry, input: &AssemblyInput<'_>) -> ProjectionRecord {
    let rules = sport_rules(input.sport);
    let kind = slot_kind(input.service, slot.roster_slot_id);
    let canonical_id = input.canonical_id.unwrap_or(UNRESOLVED_ATHLETE_ID);
    let normalized = normalize_positions(&slot.positions);

    let injury_status = if rules.is_team_defense(&normalized) {
        NO_INJURY.to_string()
    } else {
        slot.injury_status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                slot.attribute(INJURY_ATTRIBUTE)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or(NO_INJURY)
            .to_string()
    };

    let team = if slot.team.trim().is_empty() {
        input.athlete.map(|a| a.team.clone()).unwrap_or_default()
    } else {
        slot.team.clone()
    };

    let mut record = ProjectionRecord {
        draftable_uid: draftable_uid(
            &slot.provider_id,
            canonical_id,
            kind,
            &slot.position_string(),
            slot.salary,
        ),
        canonical_id,
        provider_id: slot.provider_id.clone(),
        name: slot.name.clone(),
        team,
        position: normalized.join("/"),
        eligible_positions: eligibility_tags(rules, &normalized, kind),
        roster_slot_id: slot.roster_slot_id,
        salary: slot.salary,
        eligible: slot.eligible,
        lineup_status: rules.lineup_status(slot),
        injury_status,
        ..Default::default()
    };

    if let Some(athlete) = input.athlete {
        record.season_average = season_average(&athlete.season, input.service);
    }

    if let Some(game) = input.game {
        let sim = game.entry.simulations.get(input.service);
        record.opponent = game.entry.opponent.clone();
        record.venue = game.entry.venue.clone();
        record.game_date = game.game_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        record.game_timestamp = game.game_time.timestamp();
        record.projected_points = sim.mean;
        record.std_dev = sim.std_dev;
        record.cumulative_points = sim.cumulative_points;
        record.histogram = build_histogram(&sim.samples);
        record.team_projected_points = input.odds.team_points;
        record.opponent_projected_points = input.odds.opponent_points;
        record.player_odds_factor = input.odds.player_factor;
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        GameAttribute, GameLedgerEntry, LineupStatus, PerService, PointHistogram, SeasonStats,
        SimulationSummary,
    };
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn slot(positions: &[&str], roster_slot_id: i64) -> RosterSlotEntry {
        RosterSlotEntry {
            provider_id: "39971296".into(),
            name: "A.J. Brown".into(),
            team: "PHI".into(),
            positions: positions.iter().map(|p| p.to_string()).collect(),
            salary: 7800,
            roster_slot_id,
            eligible: true,
            game_attributes: vec![],
            injury_status: Some("Q".into()),
        }
    }

    fn empty_input(sport: Sport, service: Service) -> AssemblyInput<'static> {
        AssemblyInput {
            sport,
            service,
            canonical_id: None,
            athlete: None,
            game: None,
            odds: MatchupOdds::default(),
        }
    }

    #[test]
    fn test_normalize_positions() {
        let raw = vec!["PG/SG".to_string(), " sg ".to_string(), "".to_string()];
        assert_eq!(normalize_positions(&raw), vec!["pg", "sg"]);
    }

    #[test]
    fn test_nfl_flex_tag() {
        let rules = sport_rules(Sport::Nfl);
        let tags = eligibility_tags(rules, &["wr".to_string()], SlotKind::Standard);
        assert_eq!(tags, vec!["wr", "flex"]);
        let qb = eligibility_tags(rules, &["qb".to_string()], SlotKind::Standard);
        assert_eq!(qb, vec!["qb"]);
    }

    #[test]
    fn test_nba_guard_forward_util_tags() {
        let rules = sport_rules(Sport::Nba);
        let tags = eligibility_tags(
            rules,
            &["sg".to_string(), "sf".to_string()],
            SlotKind::Standard,
        );
        assert_eq!(tags, vec!["sg", "sf", "g", "f", "util"]);
    }

    #[test]
    fn test_showdown_captain_tag_and_uid_suffix() {
        let record = assemble(&slot(&["WR"], 511), &AssemblyInput {
            canonical_id: Some(4040),
            ..empty_input(Sport::Nfl, Service::DraftKings)
        });
        assert_eq!(record.eligible_positions, vec!["wr", "flex", "captain"]);
        assert_eq!(record.draftable_uid, "39971296-4040-cpt-WR-7800");

        let util = assemble(&slot(&["WR"], 512), &AssemblyInput {
            canonical_id: Some(4040),
            ..empty_input(Sport::Nfl, Service::DraftKings)
        });
        assert_eq!(util.eligible_positions, vec!["wr", "flex", "utility"]);
        assert_eq!(util.draftable_uid, "39971296-4040-WR-7800");
    }

    #[test]
    fn test_team_defense_suppresses_injury() {
        let record = assemble(&slot(&["DST"], 0), &empty_input(Sport::Nfl, Service::DraftKings));
        assert_eq!(record.injury_status, NO_INJURY);

        let player = assemble(&slot(&["WR"], 0), &empty_input(Sport::Nfl, Service::DraftKings));
        assert_eq!(player.injury_status, "Q");
    }

    #[test]
    fn test_injury_read_from_game_attributes() {
        let mut listed = slot(&["WR"], 0);
        listed.injury_status = None;
        listed.game_attributes = vec![GameAttribute {
            key: INJURY_ATTRIBUTE.into(),
            value: " D ".into(),
        }];
        let record = assemble(&listed, &empty_input(Sport::Nfl, Service::DraftKings));
        assert_eq!(record.injury_status, "D");

        // the dedicated field wins over the attribute
        listed.injury_status = Some("Q".into());
        let record = assemble(&listed, &empty_input(Sport::Nfl, Service::DraftKings));
        assert_eq!(record.injury_status, "Q");

        listed.injury_status = None;
        listed.game_attributes.clear();
        let record = assemble(&listed, &empty_input(Sport::Nfl, Service::DraftKings));
        assert_eq!(record.injury_status, NO_INJURY);
    }

    #[test]
    fn test_unresolved_record_is_zeroed() {
        let record = assemble(&slot(&["WR"], 0), &empty_input(Sport::Nfl, Service::FanDuel));
        assert_eq!(record.canonical_id, UNRESOLVED_ATHLETE_ID);
        assert_eq!(record.opponent, "");
        assert_eq!(record.game_date, "");
        assert_eq!(record.game_timestamp, 0);
        assert_relative_eq!(record.player_odds_factor, 0.0);
        assert_eq!(record.histogram, PointHistogram::default());
        assert_eq!(record.lineup_status, LineupStatus::Unconfirmed);
        assert_eq!(record.salary, 7800);
        assert_eq!(record.team, "PHI");
    }

    #[test]
    fn test_service_specific_fields_selected() {
        let entry = GameLedgerEntry {
            game_time: "2026-10-19T17:00:00Z".into(),
            opponent: "NYG".into(),
            venue: "Lincoln Financial Field".into(),
            simulations: PerService {
                draftkings: SimulationSummary {
                    mean: 17.2,
                    std_dev: 6.1,
                    cumulative_points: 86.0,
                    samples: vec![5.0, 12.0, 22.0, 25.0, 22.0],
                },
                fanduel: SimulationSummary {
                    mean: 14.9,
                    std_dev: 5.5,
                    cumulative_points: 74.5,
                    samples: vec![65.0],
                },
                ..Default::default()
            },
        };
        let athlete = AthleteLedger {
            team: "PHI".into(),
            season: SeasonStats {
                games_played: 5,
                points: PerService {
                    draftkings: 100.0,
                    fanduel: 75.0,
                    ..Default::default()
                },
            },
            games: vec![],
        };
        let game_time = Utc.with_ymd_and_hms(2026, 10, 19, 17, 0, 0).unwrap();
        let input = AssemblyInput {
            sport: Sport::Nfl,
            service: Service::FanDuel,
            canonical_id: Some(4040),
            athlete: Some(&athlete),
            game: Some(SelectedGame {
                entry: &entry,
                game_time,
            }),
            odds: MatchupOdds {
                team_points: 27.5,
                opponent_points: 17.0,
                player_factor: 1.1,
            },
        };
        let record = assemble(&slot(&["WR"], 0), &input);
        assert_relative_eq!(record.projected_points, 14.9);
        assert_relative_eq!(record.std_dev, 5.5);
        assert_relative_eq!(record.cumulative_points, 74.5);
        assert_relative_eq!(record.season_average, 15.0);
        assert_eq!(record.histogram, PointHistogram([0, 0, 0, 0, 0, 0, 0, 1]));
        assert_eq!(record.opponent, "NYG");
        assert_eq!(record.game_date, "2026-10-19T17:00:00Z");
        assert_eq!(record.game_timestamp, game_time.timestamp());
        assert_relative_eq!(record.team_projected_points, 27.5);

        let dk = assemble(&slot(&["WR"], 0), &AssemblyInput {
            service: Service::DraftKings,
            ..input
        });
        assert_relative_eq!(dk.projected_points, 17.2);
        assert_eq!(dk.histogram, PointHistogram([0, 1, 1, 3, 0, 0, 0, 0]));
    }
}
