use chrono::{DateTime, Utc};

use super::game_selector::start_time_skew;
use super::tables::SlateTables;

/// Matchup-implied scoring context attached to a selected game.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchupOdds {
    pub team_points: f64,
    pub opponent_points: f64,
    /// Team implied points relative to the team's long-run average
    pub player_factor: f64,
}

/// `team_points / team_average`, or `0.0` when the average is zero or not a
/// usable number.
pub fn odds_factor(team_points: f64, team_average: f64) -> f64 {
    if team_average == 0.0 || !team_average.is_finite() {
        return 0.0;
    }
    let factor = team_points / team_average;
    if factor.is_finite() {
        factor
    } else {
        0.0
    }
}

/// Attach odds for `team` vs `opponent` to a game starting at `game_time`.
///
/// Takes the first odds line for `team` whose commence time precedes the
/// skew-adjusted start. The opponent line is the one with the same commence
/// time, falling back to the line at the same index.
pub fn enrich(
    tables: &SlateTables,
    team: &str,
    opponent: &str,
    game_time: DateTime<Utc>,
) -> MatchupOdds {
    let adjusted = game_time + start_time_skew();
    let team_odds = tables.odds(team);

    let Some((index, line)) = team_odds
        .iter()
        .enumerate()
        .find(|(_, o)| o.commence_time < adjusted)
    else {
        return MatchupOdds::default();
    };

    let opponent_odds = tables.odds(opponent);
    let opponent_points = opponent_odds
        .iter()
        .find(|o| o.commence_time == line.commence_time)
        .or_else(|| opponent_odds.get(index))
        .map(|o| o.implied_points)
        .unwrap_or(0.0);

    MatchupOdds {
        team_points: line.implied_points,
        opponent_points,
        player_factor: odds_factor(line.implied_points, tables.team_average(team)),
    }
}
