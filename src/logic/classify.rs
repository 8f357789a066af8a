//! Game-type classification from the genders of a match's four players.

use crate::models::{Classification, GameSession, GameType, Gender, MatchSlot};

/// Classify a doubles match. `genders` are players 1-4; `None` is an unassigned or unknown player.
///
/// Rules are checked in order and the first match wins:
/// 1. any player missing -> Incomplete
/// 2. two men on each side -> MenDoubles
/// 3. two women on each side -> WomenDoubles
/// 4. one man and one woman on each side -> MixedDoubles
/// 5. two men against two women -> CrossDoubles
/// 6. anything else (e.g. 2 men vs man + woman) -> OtherDoubles
pub fn classify(genders: [Option<Gender>; 4]) -> Classification {
    let [Some(p1), Some(p2), Some(p3), Some(p4)] = genders else {
        return GameType::Incomplete.into();
    };

    let males = |team: [Gender; 2]| team.iter().filter(|g| **g == Gender::Male).count();
    let team_a = males([p1, p2]);
    let team_b = males([p3, p4]);

    let game_type = match (team_a, team_b) {
        (2, 2) => GameType::MenDoubles,
        (0, 0) => GameType::WomenDoubles,
        (1, 1) => GameType::MixedDoubles,
        (2, 0) | (0, 2) => GameType::CrossDoubles,
        _ => GameType::OtherDoubles,
    };
    game_type.into()
}

/// Classify a slot of the session, resolving player ids against its registry.
pub fn classify_slot(session: &GameSession, slot: &MatchSlot) -> Classification {
    classify(
        slot.players
            .map(|id| id.and_then(|id| session.participant(id)).map(|p| p.gender)),
    )
}
