//! Sport- and service-specific field rules used by the assembler.
//!
//! Everything that used to differ between per-sport and per-service code
//! paths lives here as data: derived position tags, team-defense positions,
//! lineup attribute keys and showdown roster-slot ids.

use crate::db::models::{LineupStatus, RosterSlotEntry, SeasonStats, Service, Sport};

/// Adds `tag` when any of `any_of` is among the listed positions.
#[derive(Debug)]
pub struct DerivedTag {
    pub tag: &'static str,
    pub any_of: &'static [&'static str],
}

#[derive(Debug)]
pub struct SportRules {
    pub derived_tags: &'static [DerivedTag],
    /// Positions denoting a whole-team defense entry
    pub team_defense: &'static [&'static str],
    /// Attribute keys that confirm a player is in the starting lineup
    pub starter_keys: &'static [&'static str],
    /// Attribute keys that mark a player as a probable starter
    pub probable_keys: &'static [&'static str],
}

static NFL_RULES: SportRules = SportRules {
    derived_tags: &[DerivedTag {
        tag: "flex",
        any_of: &["rb", "wr", "te"],
    }],
    team_defense: &["dst", "def", "d/st"],
    starter_keys: &["starting_lineup"],
    probable_keys: &[],
};

static NBA_RULES: SportRules = SportRules {
    derived_tags: &[
        DerivedTag {
            tag: "g",
            any_of: &["pg", "sg"],
        },
        DerivedTag {
            tag: "f",
            any_of: &["sf", "pf"],
        },
        DerivedTag {
            tag: "util",
            any_of: &["pg", "sg", "sf", "pf", "c", "g", "f"],
        },
    ],
    team_defense: &[],
    starter_keys: &["starting_lineup"],
    probable_keys: &["probable_starter"],
};

static MLB_RULES: SportRules = SportRules {
    derived_tags: &[
        DerivedTag {
            tag: "p",
            any_of: &["sp", "rp"],
        },
        DerivedTag {
            tag: "of",
            any_of: &["lf", "cf", "rf"],
        },
        DerivedTag {
            tag: "util",
            any_of: &["c", "1b", "2b", "3b", "ss", "of", "lf", "cf", "rf", "dh"],
        },
    ],
    team_defense: &[],
    starter_keys: &["starting_lineup"],
    probable_keys: &["probable_pitcher"],
};

static NHL_RULES: SportRules = SportRules {
    derived_tags: &[
        DerivedTag {
            tag: "w",
            any_of: &["lw", "rw"],
        },
        DerivedTag {
            tag: "util",
            any_of: &["c", "lw", "rw", "w", "d"],
        },
    ],
    team_defense: &[],
    starter_keys: &["starting_lineup", "starting_goalie"],
    probable_keys: &["probable_goalie"],
};

pub fn sport_rules(sport: Sport) -> &'static SportRules {
    match sport {
        Sport::Nfl => &NFL_RULES,
        Sport::Nba => &NBA_RULES,
        Sport::Mlb => &MLB_RULES,
        Sport::Nhl => &NHL_RULES,
    }
}

impl SportRules {
    pub fn is_team_defense(&self, normalized_positions: &[String]) -> bool {
        normalized_positions
            .iter()
            .any(|p| self.team_defense.contains(&p.as_str()))
    }

    pub fn lineup_status(&self, slot: &RosterSlotEntry) -> LineupStatus {
        let flagged = |keys: &[&str]| {
            slot.game_attributes
                .iter()
                .any(|a| keys.contains(&a.key.as_str()) && is_truthy(&a.value))
        };
        if flagged(self.starter_keys) {
            LineupStatus::Confirmed
        } else if flagged(self.probable_keys) {
            LineupStatus::Probable
        } else {
            LineupStatus::Unconfirmed
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "confirmed"
    )
}

// ── Showdown slots ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Standard,
    Captain,
    Utility,
}

impl SlotKind {
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            SlotKind::Standard => None,
            SlotKind::Captain => Some("captain"),
            SlotKind::Utility => Some("utility"),
        }
    }

    /// Appended to the canonical identity inside the draftable UID so a
    /// captain and a utility entry for one athlete never collide.
    pub fn identity_suffix(&self) -> &'static str {
        match self {
            SlotKind::Captain => "-cpt",
            SlotKind::Standard | SlotKind::Utility => "",
        }
    }
}

struct ShowdownSlots {
    captain: &'static [i64],
    utility: &'static [i64],
}

const DRAFTKINGS_SHOWDOWN: ShowdownSlots = ShowdownSlots {
    captain: &[476, 511, 529, 1283],
    utility: &[475, 512, 530, 1284],
};

const FANDUEL_SINGLE_GAME: ShowdownSlots = ShowdownSlots {
    captain: &[3001, 3011],
    utility: &[3002, 3012],
};

const YAHOO_SINGLE_GAME: ShowdownSlots = ShowdownSlots {
    captain: &[901],
    utility: &[902],
};

const SUPERDRAFT_CHAMPION: ShowdownSlots = ShowdownSlots {
    captain: &[71],
    utility: &[72],
};

fn showdown_slots(service: Service) -> &'static ShowdownSlots {
    match service {
        Service::DraftKings => &DRAFTKINGS_SHOWDOWN,
        Service::FanDuel => &FANDUEL_SINGLE_GAME,
        Service::Yahoo => &YAHOO_SINGLE_GAME,
        Service::SuperDraft => &SUPERDRAFT_CHAMPION,
    }
}

pub fn slot_kind(service: Service, roster_slot_id: i64) -> SlotKind {
    let slots = showdown_slots(service);
    if slots.captain.contains(&roster_slot_id) {
        SlotKind::Captain
    } else if slots.utility.contains(&roster_slot_id) {
        SlotKind::Utility
    } else {
        SlotKind::Standard
    }
}

// ── Season figures ───────────────────────────────────────────────────────────

/// Season points per game for `service`, `0.0` before any games are played.
pub fn season_average(season: &SeasonStats, service: Service) -> f64 {
    if season.games_played == 0 {
        return 0.0;
    }
    *season.points.get(service) / season.games_played as f64
}
