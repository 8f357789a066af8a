//! Round/court matrix: building, adding and removing rounds, assigning players.

use crate::logic::availability::is_available;
use crate::models::{
    validate_counts, CreationStep, GameSession, MatchSlot, ParticipantId, PlayerField, SessionError,
    MAX_ROUNDS,
};

/// Outcome of a round removal request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundRemoval {
    Removed,
    /// Only one round is left; the caller must confirm deleting the whole game instead.
    DeleteGameRequired,
}

/// Rebuild all slots as rounds x courts, every field unassigned.
///
/// Slots are round-major: (1,1), (1,2), ..., (2,1), ...
pub fn initialize_matrix(session: &mut GameSession, round_count: u32, court_count: u32) -> Result<(), SessionError> {
    validate_counts(court_count, round_count)?;
    session.slots = (1..=round_count)
        .flat_map(|round| (1..=court_count).map(move |court| MatchSlot::new(round, court)))
        .collect();
    session.round_count = round_count;
    session.court_count = court_count;
    Ok(())
}

/// Whether the matrix already has the configured shape.
pub fn matches_dimensions(session: &GameSession) -> bool {
    let expected = (session.round_count as usize).checked_mul(session.court_count as usize);
    expected == Some(session.slots.len())
        && session
            .slots
            .iter()
            .all(|s| s.round_number <= session.round_count && s.court_number <= session.court_count)
}

fn require_matchup_editing(session: &GameSession) -> Result<(), SessionError> {
    if session.step != CreationStep::MatchupEditing {
        return Err(SessionError::InvalidState);
    }
    Ok(())
}

fn max_round(session: &GameSession) -> u32 {
    session.slots.iter().map(|s| s.round_number).max().unwrap_or(0)
}

/// Append one round (one empty slot per court). Returns the new round number.
pub fn add_round(session: &mut GameSession) -> Result<u32, SessionError> {
    require_matchup_editing(session)?;
    let round = max_round(session) + 1;
    if round > MAX_ROUNDS {
        return Err(SessionError::InvalidCount);
    }
    session
        .slots
        .extend((1..=session.court_count).map(|court| MatchSlot::new(round, court)));
    session.round_count = round;
    Ok(round)
}

/// Remove a round and shift later rounds down so numbering stays 1..=n.
///
/// The last remaining round is never removed; see [`RoundRemoval::DeleteGameRequired`].
pub fn remove_round(session: &mut GameSession, round: u32) -> Result<RoundRemoval, SessionError> {
    require_matchup_editing(session)?;
    if !session.slots.iter().any(|s| s.round_number == round) {
        return Err(SessionError::RoundNotFound(round));
    }
    if max_round(session) <= 1 {
        return Ok(RoundRemoval::DeleteGameRequired);
    }
    session.slots.retain(|s| s.round_number != round);
    for slot in session.slots.iter_mut().filter(|s| s.round_number > round) {
        slot.round_number -= 1;
    }
    session.round_count = max_round(session);
    Ok(RoundRemoval::Removed)
}

/// Assign (`Some`) or clear (`None`) one player field of a slot.
///
/// Only participants the availability filter offers for that field are accepted,
/// so nobody is booked twice in the same round.
pub fn set_slot_field(
    session: &mut GameSession,
    round: u32,
    court: u32,
    field: PlayerField,
    participant: Option<ParticipantId>,
) -> Result<(), SessionError> {
    require_matchup_editing(session)?;
    if session.slot(round, court).is_none() {
        return Err(SessionError::SlotNotFound { round, court });
    }
    if let Some(id) = participant {
        if session.participant(id).is_none() {
            return Err(SessionError::ParticipantNotFound(id));
        }
        if !is_available(session, round, court, field, id) {
            return Err(SessionError::ParticipantUnavailable { id, round });
        }
    }
    if let Some(slot) = session.slot_mut(round, court) {
        slot.set(field, participant);
    }
    Ok(())
}

/// Number of slots (any round, any court) that include `id`.
pub fn count_games_for(session: &GameSession, id: ParticipantId) -> usize {
    session.slots.iter().filter(|s| s.contains(id)).count()
}
