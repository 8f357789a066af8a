//! Badminton court manager: library with the session model, matchup logic and submission adapters.

pub mod auth;
pub mod config;
pub mod logic;
pub mod models;
pub mod regions;
pub mod submission;

pub use auth::AuthContext;
pub use config::{BackendKind, Config, ConfigError};
pub use logic::{
    add_round, available_participants, back_to_basics, begin_submission, classify, classify_slot,
    complete_submission, count_games_for, initialize_matrix, is_available, proceed_to_matchup,
    remove_round, set_slot_field, submission_failed, RoundRemoval,
};
pub use models::{
    validate_counts, AgeGroup, Classification, CourtMatch, CreationStep, GameId, GameProjection,
    GameSession, GameStatus, GameType, Gender, Grade, GradeError, GradeType, MatchRecordMode,
    MatchResult, MatchSlot, Participant, ParticipantId, ParticipantUpdate, PlayerField,
    ProjectedParticipant, SessionError, SessionId, SkillTier, SubmittedGame, MAX_COURTS, MAX_ROUNDS,
};
pub use submission::{
    build_create_request, share_url, spawn_submission, submit_session, ApiResponse,
    CreateGameRequest, GameAdmin, GameUpdate, HttpBackend, LocalStore, NewCourtMatch,
    NewParticipant, SubmissionAdapter, SubmissionError,
};
