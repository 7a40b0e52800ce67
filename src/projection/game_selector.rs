use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::db::models::{parse_timestamp, GameLedgerEntry};
use crate::error::SlotError;

/// Feeds report start times up to an hour early; every game time is pushed
/// forward by this much before comparing against the reference time.
const START_TIME_SKEW_SECS: i64 = 60 * 60;

pub fn start_time_skew() -> Duration {
    Duration::seconds(START_TIME_SKEW_SECS)
}

/// The ledger entry chosen as an athlete's next game.
#[derive(Debug, Clone, Copy)]
pub struct SelectedGame<'a> {
    pub entry: &'a GameLedgerEntry,
    /// Parsed, unadjusted start time
    pub game_time: DateTime<Utc>,
}

/// Pick the earliest game whose skew-adjusted start is strictly after
/// `reference`, scanning the whole ledger.
///
/// Ledger order is not trusted. Ties keep the entry listed first. Any
/// unparseable timestamp fails the selection for this athlete.
pub fn select_next_game(
    games: &[GameLedgerEntry],
    reference: DateTime<Utc>,
) -> Result<Option<SelectedGame<'_>>, SlotError> {
    let skew = start_time_skew();
    let mut parsed = Vec::with_capacity(games.len());
    for entry in games {
        let game_time = parse_timestamp(&entry.game_time)
            .ok_or_else(|| SlotError::MalformedTimestamp(entry.game_time.clone()))?;
        parsed.push(SelectedGame { entry, game_time });
    }

    if parsed.windows(2).any(|w| w[1].game_time < w[0].game_time) {
        debug!("Game ledger out of order ({} entries)", parsed.len());
    }

    Ok(parsed
        .into_iter()
        .filter(|g| g.game_time + skew > reference)
        .min_by_key(|g| g.game_time))
}
