//! Which participants may still be placed into a given slot field.

use crate::models::{GameSession, Participant, ParticipantId, PlayerField};
use std::collections::HashSet;

/// Ids already placed anywhere in `round`, except in the one field being edited.
fn taken_in_round(session: &GameSession, round: u32, court: u32, field: PlayerField) -> HashSet<ParticipantId> {
    let mut taken = HashSet::new();
    for slot in session.round_slots(round) {
        let editing_this_slot = slot.court_number == court;
        for f in PlayerField::ALL {
            if editing_this_slot && f == field {
                continue;
            }
            if let Some(id) = slot.get(f) {
                taken.insert(id);
            }
        }
    }
    taken
}

/// Participants selectable for (`round`, `court`, `field`), in registry order.
///
/// The participant currently in the edited field stays selectable, so re-picking it is a no-op.
pub fn available_participants(
    session: &GameSession,
    round: u32,
    court: u32,
    field: PlayerField,
) -> Vec<&Participant> {
    let taken = taken_in_round(session, round, court, field);
    session
        .participants
        .iter()
        .filter(|p| !taken.contains(&p.id))
        .collect()
}

/// Whether `id` may be placed at (`round`, `court`, `field`).
pub fn is_available(
    session: &GameSession,
    round: u32,
    court: u32,
    field: PlayerField,
    id: ParticipantId,
) -> bool {
    session.participant(id).is_some() && !taken_in_round(session, round, court, field).contains(&id)
}
