//! Match slots of the round/court matrix, and the game type derived from them.

use crate::models::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// One of the four player positions of a slot. Team A is players 1-2, team B is players 3-4.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerField {
    Player1,
    Player2,
    Player3,
    Player4,
}

impl PlayerField {
    pub const ALL: [PlayerField; 4] = [
        PlayerField::Player1,
        PlayerField::Player2,
        PlayerField::Player3,
        PlayerField::Player4,
    ];

    /// Field by its 1-based position.
    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn index(self) -> usize {
        match self {
            PlayerField::Player1 => 0,
            PlayerField::Player2 => 1,
            PlayerField::Player3 => 2,
            PlayerField::Player4 => 3,
        }
    }
}

/// A cell of the matrix: one doubles match on one court in one round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSlot {
    pub round_number: u32,
    pub court_number: u32,
    /// Player ids by position; None is unassigned.
    pub players: [Option<ParticipantId>; 4],
}

impl MatchSlot {
    pub fn new(round_number: u32, court_number: u32) -> Self {
        Self {
            round_number,
            court_number,
            players: [None; 4],
        }
    }

    pub fn get(&self, field: PlayerField) -> Option<ParticipantId> {
        self.players[field.index()]
    }

    pub fn set(&mut self, field: PlayerField, id: Option<ParticipantId>) {
        self.players[field.index()] = id;
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.players.contains(&Some(id))
    }

    /// Reset every field holding `id`. Returns how many fields were cleared.
    pub fn clear_participant(&mut self, id: ParticipantId) -> usize {
        let mut cleared = 0;
        for p in self.players.iter_mut().filter(|p| **p == Some(id)) {
            *p = None;
            cleared += 1;
        }
        cleared
    }
}

/// Category of a doubles match, derived from the four players' genders.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    MenDoubles,
    WomenDoubles,
    MixedDoubles,
    CrossDoubles,
    OtherDoubles,
    /// At least one position is unassigned or unknown.
    Incomplete,
}

impl GameType {
    pub fn label(self) -> &'static str {
        match self {
            GameType::MenDoubles => "Men's doubles",
            GameType::WomenDoubles => "Women's doubles",
            GameType::MixedDoubles => "Mixed doubles",
            GameType::CrossDoubles => "Cross doubles",
            GameType::OtherDoubles => "Other doubles",
            GameType::Incomplete => "-",
        }
    }
}

/// A game type together with its display label.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Classification {
    pub game_type: GameType,
    pub label: &'static str,
}

impl From<GameType> for Classification {
    fn from(game_type: GameType) -> Self {
        Self {
            game_type,
            label: game_type.label(),
        }
    }
}
