//! Read-back shape of a submitted game, as the backend (or the local store) returns it.

use crate::logic::classify;
use crate::models::participant::{AgeGroup, Gender, GradeType, SkillTier};
use crate::models::slot::{Classification, GameType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier the backend assigns to a created game.
pub type GameId = u64;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchResult {
    Team1Win,
    Team2Win,
    Draw,
}

/// How results are recorded for a game: full results or just progress status.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchRecordMode {
    #[default]
    Result,
    StatusOnly,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedParticipant {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub gender: Gender,
    pub grade: SkillTier,
    pub age_group: AgeGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

/// One match of a submitted game. Player ids are empty strings when unassigned.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub round_number: u32,
    pub court_number: u32,
    #[serde(default)]
    pub player1_id: String,
    #[serde(default)]
    pub player2_id: String,
    #[serde(default)]
    pub player3_id: String,
    #[serde(default)]
    pub player4_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<GameType>,
    #[serde(default)]
    pub result: Option<MatchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
}

impl CourtMatch {
    pub fn player_ids(&self) -> [&str; 4] {
        [
            self.player1_id.as_str(),
            self.player2_id.as_str(),
            self.player3_id.as_str(),
            self.player4_id.as_str(),
        ]
    }
}

/// A game as stored by its owner after submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProjection {
    pub id: GameId,
    pub title: String,
    pub court_count: u32,
    pub round_count: u32,
    #[serde(default)]
    pub grade_type: GradeType,
    pub participants: Vec<ProjectedParticipant>,
    pub court_matches: Vec<CourtMatch>,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default)]
    pub share_link: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: u64,
    /// Join code, issued by the local store for private games.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
}

impl GameProjection {
    /// Matches of one round, in court order.
    pub fn round_matches(&self, round_number: u32) -> Vec<&CourtMatch> {
        let mut matches: Vec<_> = self
            .court_matches
            .iter()
            .filter(|m| m.round_number == round_number)
            .collect();
        matches.sort_by_key(|m| m.court_number);
        matches
    }

    pub fn participant_name(&self, id: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }

    /// Game type of one of this game's matches, from the participants' genders.
    pub fn classify_match(&self, m: &CourtMatch) -> Classification {
        let genders = m.player_ids().map(|id| {
            self.participants
                .iter()
                .find(|p| !id.is_empty() && p.id == id)
                .map(|p| p.gender)
        });
        classify(genders)
    }
}
