//! GameSession aggregate, CreationStep and SessionError.

use crate::models::participant::{
    AgeGroup, Gender, Grade, GradeType, Participant, ParticipantId, ParticipantUpdate,
};
use crate::models::projection::{GameId, MatchRecordMode};
use crate::models::slot::MatchSlot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur while editing a session.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// Session is not in a step that allows this action.
    #[error("Invalid state for this action")]
    InvalidState,
    #[error("Participant name must not be empty")]
    BlankName,
    /// Names are unique (case-insensitive) since the backend receives names, not ids.
    #[error("A participant with this name already exists")]
    DuplicateParticipantName,
    #[error("Participant not found")]
    ParticipantNotFound(ParticipantId),
    #[error("Grade scope {found} does not match the game's grade type {expected}")]
    GradeScopeMismatch { expected: GradeType, found: GradeType },
    #[error("No match on court {court} in round {round}")]
    SlotNotFound { round: u32, court: u32 },
    #[error("Round {0} does not exist")]
    RoundNotFound(u32),
    /// Participant is already playing elsewhere in the round.
    #[error("Participant is already assigned in round {round}")]
    ParticipantUnavailable { id: ParticipantId, round: u32 },
    #[error("Court count must be 1-{} and round count 1-{}", MAX_COURTS, MAX_ROUNDS)]
    InvalidCount,
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("Add at least one participant")]
    NoParticipants,
}

/// Unique identifier for an editing session.
pub type SessionId = Uuid;

/// Upper bounds on the matrix dimensions.
pub const MAX_COURTS: u32 = 50;
pub const MAX_ROUNDS: u32 = 100;

/// Check that court and round counts are within `1..=MAX_COURTS` and `1..=MAX_ROUNDS`.
pub fn validate_counts(court_count: u32, round_count: u32) -> Result<(), SessionError> {
    if !(1..=MAX_COURTS).contains(&court_count) || !(1..=MAX_ROUNDS).contains(&round_count) {
        return Err(SessionError::InvalidCount);
    }
    Ok(())
}

/// Step of the creation flow. Linear, with the back-transitions of the editor.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationStep {
    /// Title, counts, grade type and participants.
    #[default]
    CreateBasics,
    /// Filling in the round/court matrix.
    MatchupEditing,
    /// Request handed to the submission adapter.
    Submitting,
    /// Submitted; the session is read-only.
    Complete,
}

/// Result of a successful submission.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SubmittedGame {
    pub game_id: GameId,
    pub share_url: String,
}

/// Full editing state of one game: settings, participants, match slots and step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub title: String,
    pub court_count: u32,
    pub round_count: u32,
    pub grade_type: GradeType,
    pub match_record_mode: Option<MatchRecordMode>,
    /// Private games get an invite code from the local store.
    pub is_private: bool,
    /// Registered participants, in insertion order.
    pub participants: Vec<Participant>,
    /// Round-major: all courts of round 1, then round 2, ...
    pub slots: Vec<MatchSlot>,
    pub step: CreationStep,
    pub created_at: DateTime<Utc>,
    /// Set once the submission adapter has accepted the game.
    pub submitted: Option<SubmittedGame>,
}

impl GameSession {
    /// Create a session in CreateBasics with no participants and an empty matrix.
    pub fn new(
        title: impl Into<String>,
        court_count: u32,
        round_count: u32,
        grade_type: GradeType,
    ) -> Result<Self, SessionError> {
        validate_counts(court_count, round_count)?;
        Ok(Self {
            id: Uuid::new_v4(),
            title: title.into(),
            court_count,
            round_count,
            grade_type,
            match_record_mode: None,
            is_private: false,
            participants: Vec::new(),
            slots: Vec::new(),
            step: CreationStep::CreateBasics,
            created_at: Utc::now(),
            submitted: None,
        })
    }

    fn is_editable(&self) -> bool {
        matches!(self.step, CreationStep::CreateBasics | CreationStep::MatchupEditing)
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn participant_by_name(&self, name: &str) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    fn check_grade(&self, grade: Grade) -> Result<(), SessionError> {
        if grade.grade_type() != self.grade_type {
            return Err(SessionError::GradeScopeMismatch {
                expected: self.grade_type,
                found: grade.grade_type(),
            });
        }
        Ok(())
    }

    /// Register a participant. Blank names leave the registry untouched.
    pub fn add_participant(
        &mut self,
        name: &str,
        gender: Gender,
        grade: Grade,
        age_group: AgeGroup,
    ) -> Result<ParticipantId, SessionError> {
        if !self.is_editable() {
            return Err(SessionError::InvalidState);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::BlankName);
        }
        if self.participant_by_name(name).is_some() {
            return Err(SessionError::DuplicateParticipantName);
        }
        self.check_grade(grade)?;
        let participant = Participant::new(name, gender, grade, age_group);
        let id = participant.id;
        self.participants.push(participant);
        Ok(id)
    }

    /// Remove a participant and clear every slot field that referenced them.
    pub fn remove_participant(&mut self, id: ParticipantId) -> Result<(), SessionError> {
        if !self.is_editable() {
            return Err(SessionError::InvalidState);
        }
        let idx = self
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or(SessionError::ParticipantNotFound(id))?;
        self.participants.remove(idx);
        for slot in &mut self.slots {
            slot.clear_participant(id);
        }
        Ok(())
    }

    /// Edit one field of a participant in place.
    pub fn update_participant(&mut self, id: ParticipantId, update: ParticipantUpdate) -> Result<(), SessionError> {
        if !self.is_editable() {
            return Err(SessionError::InvalidState);
        }
        if let ParticipantUpdate::Grade(grade) = update {
            self.check_grade(grade)?;
        }
        let p = self
            .participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SessionError::ParticipantNotFound(id))?;
        match update {
            ParticipantUpdate::Gender(g) => p.gender = g,
            ParticipantUpdate::Grade(g) => p.grade = g,
            ParticipantUpdate::AgeGroup(a) => p.age_group = a,
        }
        Ok(())
    }

    /// Change title, counts and grade type (CreateBasics only).
    ///
    /// Counts take effect on the matrix when matchup editing is entered.
    pub fn set_basics(
        &mut self,
        title: &str,
        court_count: u32,
        round_count: u32,
        grade_type: GradeType,
    ) -> Result<(), SessionError> {
        if self.step != CreationStep::CreateBasics {
            return Err(SessionError::InvalidState);
        }
        validate_counts(court_count, round_count)?;
        if let Some(p) = self.participants.iter().find(|p| p.grade.grade_type() != grade_type) {
            return Err(SessionError::GradeScopeMismatch {
                expected: grade_type,
                found: p.grade.grade_type(),
            });
        }
        self.title = title.trim().to_string();
        self.court_count = court_count;
        self.round_count = round_count;
        self.grade_type = grade_type;
        Ok(())
    }

    pub fn slot(&self, round: u32, court: u32) -> Option<&MatchSlot> {
        self.slots
            .iter()
            .find(|s| s.round_number == round && s.court_number == court)
    }

    pub fn slot_mut(&mut self, round: u32, court: u32) -> Option<&mut MatchSlot> {
        self.slots
            .iter_mut()
            .find(|s| s.round_number == round && s.court_number == court)
    }

    /// Slots of one round, in court order.
    pub fn round_slots(&self, round: u32) -> impl Iterator<Item = &MatchSlot> {
        self.slots.iter().filter(move |s| s.round_number == round)
    }

    pub fn is_complete(&self) -> bool {
        self.step == CreationStep::Complete
    }
}
