//! Submission of a finished session to whoever owns games afterwards: the remote
//! backend or the local JSON store. Both sit behind [`SubmissionAdapter`] for creation
//! and [`GameAdmin`] for managing a game once it exists.

mod http;
mod storage;

pub use http::HttpBackend;
pub use storage::{LocalStore, STORAGE_KEY};

use crate::logic::{begin_submission, complete_submission, submission_failed};
use crate::models::{
    validate_counts, AgeGroup, CourtMatch, GameId, GameProjection, GameSession, GameStatus, Gender,
    GradeType, MatchRecordMode, MatchResult, ParticipantId, ProjectedParticipant, SessionError,
    SkillTier, SubmittedGame,
};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Envelope the backend wraps every response in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            code: "OK".to_string(),
            message: String::new(),
            data: Some(data),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Participant as sent on creation: no id, the backend assigns canonical ones.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameParticipant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    pub original_name: String,
    pub gender: Gender,
    pub grade: SkillTier,
    pub age_group: AgeGroup,
}

/// One slot of the matrix; players are referenced by their original names.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtMatchRequest {
    pub round_number: u32,
    pub court_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player4: Option<String>,
}

impl CourtMatchRequest {
    pub fn players(&self) -> [Option<&str>; 4] {
        [
            self.player1.as_deref(),
            self.player2.as_deref(),
            self.player3.as_deref(),
            self.player4.as_deref(),
        ]
    }
}

/// Body of `POST /free-games`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub title: String,
    pub court_count: u32,
    pub round_count: u32,
    pub grade_type: GradeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_record_mode: Option<MatchRecordMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_ids: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<CreateGameParticipant>>,
    pub court_matches: Vec<CourtMatchRequest>,
    /// Only the local store looks at this.
    #[serde(skip)]
    pub is_private: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub game_id: GameId,
}

/// Body of `POST /games/{id}/participants`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParticipant {
    pub name: String,
    pub gender: Gender,
    pub grade: SkillTier,
    pub age_group: AgeGroup,
}

/// One match of a round added to an existing game. Players are participant ids of
/// that game; empty means unassigned.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourtMatch {
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
}

/// Partial edit of a game's settings (`PATCH /games/{id}`); absent fields are unchanged.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_count: Option<u32>,
}

/// Errors surfaced by submission and read-back. `Display` is the user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Backend answered with an error message (or an unsuccessful envelope).
    #[error("{0}")]
    Backend(String),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Game {0} not found")]
    GameNotFound(GameId),
    #[error("Match {0} not found")]
    MatchNotFound(String),
}

/// Where a finished game goes. Implementations are picked once at start-up.
#[async_trait]
pub trait SubmissionAdapter: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    /// Create the game; returns the id the owner assigned.
    async fn create_game(&self, request: &CreateGameRequest) -> Result<GameId, SubmissionError>;

    /// Read a created game back. `Ok(None)` when no such game exists.
    async fn fetch_game(&self, game_id: GameId) -> Result<Option<GameProjection>, SubmissionError>;
}

/// Operations on a game after creation: lookups by share link, settings, rounds, courts,
/// results, statuses and late participants.
#[async_trait]
pub trait GameAdmin: SubmissionAdapter {
    /// Read a game by its share link. `Ok(None)` when no game has that link.
    async fn fetch_game_by_share_link(&self, share_link: &str) -> Result<Option<GameProjection>, SubmissionError>;

    async fn update_game(&self, game_id: GameId, update: &GameUpdate) -> Result<(), SubmissionError>;

    /// Append a round; returns the matches as stored.
    async fn add_round(&self, game_id: GameId, matches: &[NewCourtMatch]) -> Result<Vec<CourtMatch>, SubmissionError>;

    async fn add_court(&self, game_id: GameId) -> Result<(), SubmissionError>;

    /// Record (`Some`) or clear (`None`) the result of one match.
    async fn update_match_result(
        &self,
        game_id: GameId,
        match_id: &str,
        result: Option<MatchResult>,
    ) -> Result<(), SubmissionError>;

    async fn update_game_status(&self, game_id: GameId, status: GameStatus) -> Result<(), SubmissionError>;

    /// Set every match of the game to `status`.
    async fn update_all_match_status(&self, game_id: GameId, status: GameStatus) -> Result<(), SubmissionError>;

    /// Register a participant on an existing game; returns it with its assigned id.
    async fn add_participant(
        &self,
        game_id: GameId,
        participant: &NewParticipant,
    ) -> Result<ProjectedParticipant, SubmissionError>;
}

/// Shareable link of a created game.
pub fn share_url(origin: &str, game_id: GameId) -> String {
    format!("{}/court_manager/game/{}", origin.trim_end_matches('/'), game_id)
}

/// Translate a session into the create-game request.
pub fn build_create_request(session: &GameSession) -> Result<CreateGameRequest, SubmissionError> {
    let title = session.title.trim();
    if title.is_empty() {
        return Err(SubmissionError::Invalid("Title must not be empty".to_string()));
    }
    validate_counts(session.court_count, session.round_count)
        .map_err(|e| SubmissionError::Invalid(e.to_string()))?;

    let participants: Vec<_> = session
        .participants
        .iter()
        .map(|p| CreateGameParticipant {
            user_id: None,
            original_name: p.name.clone(),
            gender: p.gender,
            grade: p.grade.tier(),
            age_group: p.age_group,
        })
        .collect();

    let name_of = |id: Option<ParticipantId>| {
        id.and_then(|id| session.participant(id))
            .map(|p| p.name.clone())
    };
    let court_matches = session
        .slots
        .iter()
        .map(|s| CourtMatchRequest {
            round_number: s.round_number,
            court_number: s.court_number,
            player1: name_of(s.players[0]),
            player2: name_of(s.players[1]),
            player3: name_of(s.players[2]),
            player4: name_of(s.players[3]),
        })
        .collect();

    Ok(CreateGameRequest {
        title: title.to_string(),
        court_count: session.court_count,
        round_count: session.round_count,
        grade_type: session.grade_type,
        match_record_mode: session.match_record_mode,
        manager_ids: None,
        participants: (!participants.is_empty()).then_some(participants),
        court_matches,
        is_private: session.is_private,
    })
}

/// Run a session through Submitting. On success the session is Complete;
/// on failure it is back in MatchupEditing and must be resubmitted whole.
pub async fn submit_session<A>(
    session: &mut GameSession,
    adapter: &A,
    origin: &str,
) -> Result<SubmittedGame, SubmissionError>
where
    A: SubmissionAdapter + ?Sized,
{
    let request = build_create_request(session)?;
    begin_submission(session)?;

    match adapter.create_game(&request).await {
        Ok(game_id) => {
            let submitted = SubmittedGame {
                game_id,
                share_url: share_url(origin, game_id),
            };
            complete_submission(session, submitted.clone())?;
            info!(
                "Submitted session {} as game {} ({})",
                session.id,
                game_id,
                adapter.backend_tag()
            );
            Ok(submitted)
        }
        Err(e) => {
            warn!("Submitting session {} failed: {}", session.id, e);
            submission_failed(session)?;
            Err(e)
        }
    }
}

/// Submit on a background task. `record` receives the session once it has left Submitting
/// (Complete or back in MatchupEditing), even if nobody awaits the returned handle.
pub fn spawn_submission<A, F>(
    mut session: GameSession,
    adapter: Arc<A>,
    origin: String,
    record: F,
) -> JoinHandle<(GameSession, Result<SubmittedGame, SubmissionError>)>
where
    A: SubmissionAdapter + ?Sized,
    F: FnOnce(&GameSession) + Send + 'static,
{
    tokio::spawn(async move {
        let result = submit_session(&mut session, adapter.as_ref(), &origin).await;
        record(&session);
        (session, result)
    })
}
