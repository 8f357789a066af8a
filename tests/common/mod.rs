//! Shared helpers for integration tests.

#![allow(dead_code)]

use court_manager::{
    proceed_to_matchup, AgeGroup, GameSession, Gender, Grade, GradeType, ParticipantId, SkillTier,
};

pub fn grade_d() -> Grade {
    Grade::Regional(SkillTier::D)
}

/// Session in CreateBasics with the given participants registered in order.
pub fn session_with(players: &[(&str, Gender)], rounds: u32, courts: u32) -> (GameSession, Vec<ParticipantId>) {
    let mut s = GameSession::new("Thursday club night", courts, rounds, GradeType::Regional).unwrap();
    let ids = players
        .iter()
        .map(|(name, gender)| {
            s.add_participant(name, *gender, grade_d(), AgeGroup::default())
                .unwrap()
        })
        .collect();
    (s, ids)
}

/// Same as `session_with`, already in MatchupEditing with an empty matrix.
pub fn matchup_with(players: &[(&str, Gender)], rounds: u32, courts: u32) -> (GameSession, Vec<ParticipantId>) {
    let (mut s, ids) = session_with(players, rounds, courts);
    proceed_to_matchup(&mut s).unwrap();
    (s, ids)
}

pub const ABCD: [(&str, Gender); 4] = [
    ("A", Gender::Male),
    ("B", Gender::Male),
    ("C", Gender::Female),
    ("D", Gender::Female),
];
