pub mod cache;
pub mod http;
pub mod store;

pub use cache::FeedCache;
pub use http::HttpBlobStore;
pub use store::{BlobStore, LocalBlobStore};

use chrono::NaiveDate;

use crate::db::models::{Service, Sport};

pub const DRAFTABLES_FEED: &str = "draftables";
pub const SIMULATIONS_FEED: &str = "simulations";
pub const ODDS_FEED: &str = "odds";
pub const TEAM_AVERAGES_FEED: &str = "team_averages";

pub fn draftables_object(service: Service, sport: Sport, slate: &str) -> String {
    format!("{}/{}/{}/{}.json", DRAFTABLES_FEED, service, sport, slate)
}

pub fn simulations_object(sport: Sport, date: NaiveDate) -> String {
    format!("{}/{}/{}.json", SIMULATIONS_FEED, sport, date.format("%Y-%m-%d"))
}

pub fn odds_object(sport: Sport) -> String {
    format!("{}/{}.json", ODDS_FEED, sport)
}

pub fn team_averages_object(sport: Sport) -> String {
    format!("{}/{}.json", TEAM_AVERAGES_FEED, sport)
}

/// Slate names end up in object paths; keep them to a safe alphabet.
pub fn is_valid_slate_name(slate: &str) -> bool {
    !slate.is_empty()
        && slate.len() <= 64
        && slate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_names() {
        assert_eq!(
            draftables_object(Service::DraftKings, Sport::Nfl, "main"),
            "draftables/draftkings/nfl/main.json"
        );
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            simulations_object(Sport::Mlb, date),
            "simulations/mlb/2026-10-19.json"
        );
        assert_eq!(odds_object(Sport::Nhl), "odds/nhl.json");
        assert_eq!(team_averages_object(Sport::Nba), "team_averages/nba.json");
    }

    #[test]
    fn test_slate_names() {
        assert!(is_valid_slate_name("main"));
        assert!(is_valid_slate_name("showdown_PHI-NYG"));
        assert!(!is_valid_slate_name(""));
        assert!(!is_valid_slate_name("../main"));
        assert!(!is_valid_slate_name("main slate"));
    }
}
