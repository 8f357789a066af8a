//! Data structures for the court manager: participants, match slots, sessions, submitted games.

mod participant;
mod projection;
mod session;
mod slot;

pub use participant::{
    AgeGroup, Gender, Grade, GradeError, GradeType, Participant, ParticipantId, ParticipantUpdate,
    SkillTier,
};
pub use projection::{
    CourtMatch, GameId, GameProjection, GameStatus, MatchRecordMode, MatchResult,
    ProjectedParticipant,
};
pub use session::{
    validate_counts, CreationStep, GameSession, SessionError, SessionId, SubmittedGame, MAX_COURTS,
    MAX_ROUNDS,
};
pub use slot::{Classification, GameType, MatchSlot, PlayerField};
