//! Creation flow: CreateBasics -> MatchupEditing -> Submitting -> Complete.

use crate::logic::matrix::{initialize_matrix, matches_dimensions};
use crate::models::{validate_counts, CreationStep, GameSession, SessionError, SubmittedGame};

/// Move to matchup editing. Builds the matrix if it is empty or its shape no longer matches the counts.
pub fn proceed_to_matchup(session: &mut GameSession) -> Result<(), SessionError> {
    if session.step != CreationStep::CreateBasics {
        return Err(SessionError::InvalidState);
    }
    if session.title.trim().is_empty() {
        return Err(SessionError::EmptyTitle);
    }
    if session.participants.is_empty() {
        return Err(SessionError::NoParticipants);
    }
    validate_counts(session.court_count, session.round_count)?;
    if session.slots.is_empty() || !matches_dimensions(session) {
        let (rounds, courts) = (session.round_count, session.court_count);
        initialize_matrix(session, rounds, courts)?;
    }
    session.step = CreationStep::MatchupEditing;
    Ok(())
}

/// Go back from matchup editing to the basics form. Assignments are kept.
pub fn back_to_basics(session: &mut GameSession) -> Result<(), SessionError> {
    if session.step != CreationStep::MatchupEditing {
        return Err(SessionError::InvalidState);
    }
    session.step = CreationStep::CreateBasics;
    Ok(())
}

/// Lock the session for submission after checking the request contract.
pub fn begin_submission(session: &mut GameSession) -> Result<(), SessionError> {
    if session.step != CreationStep::MatchupEditing {
        return Err(SessionError::InvalidState);
    }
    if session.title.trim().is_empty() {
        return Err(SessionError::EmptyTitle);
    }
    validate_counts(session.court_count, session.round_count)?;
    session.step = CreationStep::Submitting;
    Ok(())
}

/// Submission failed: back to matchup editing, nothing recorded.
pub fn submission_failed(session: &mut GameSession) -> Result<(), SessionError> {
    if session.step != CreationStep::Submitting {
        return Err(SessionError::InvalidState);
    }
    session.step = CreationStep::MatchupEditing;
    Ok(())
}

/// Submission accepted: record the backend's id and link. Complete is terminal.
pub fn complete_submission(session: &mut GameSession, submitted: SubmittedGame) -> Result<(), SessionError> {
    if session.step != CreationStep::Submitting {
        return Err(SessionError::InvalidState);
    }
    session.submitted = Some(submitted);
    session.step = CreationStep::Complete;
    Ok(())
}
