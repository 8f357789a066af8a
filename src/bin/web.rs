//! Single binary web server: court manager editing sessions over REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Configuration comes from the environment
//! (HOST, PORT, API_URL, PUBLIC_ORIGIN, BACKEND, STORAGE_DIR, ACCESS_TOKEN).

use actix_web::{
    delete, get, patch, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use court_manager::{
    add_round, available_participants, back_to_basics, begin_submission, classify_slot,
    count_games_for, proceed_to_matchup, remove_round, set_slot_field, spawn_submission, AgeGroup,
    AuthContext, BackendKind, Classification, Config, GameAdmin, GameId, GameProjection,
    GameSession, GameStatus, GameUpdate, Gender, Grade, GradeType, HttpBackend, LocalStore,
    MatchRecordMode, MatchResult, NewCourtMatch, NewParticipant, ParticipantId, ParticipantUpdate,
    PlayerField, RoundRemoval, SessionError, SessionId, SubmissionError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Per-session entry: session data + last activity time (for auto-cleanup).
struct SessionEntry {
    session: GameSession,
    last_activity: Instant,
}

/// In-memory state: editing sessions by id. Entries are removed after 12h inactivity.
type AppState = Data<RwLock<HashMap<SessionId, SessionEntry>>>;

/// Inactivity threshold: sessions not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    backend: &'static str,
}

fn default_count() -> u32 {
    1
}

#[derive(Deserialize)]
struct CreateSessionBody {
    #[serde(default)]
    title: String,
    #[serde(default = "default_count")]
    court_count: u32,
    #[serde(default = "default_count")]
    round_count: u32,
    #[serde(default)]
    grade_type: GradeType,
    #[serde(default)]
    match_record_mode: Option<MatchRecordMode>,
    #[serde(default)]
    is_private: bool,
}

#[derive(Deserialize)]
struct BasicsBody {
    title: String,
    court_count: u32,
    round_count: u32,
    grade_type: GradeType,
}

/// Grade may arrive as `local_grade`, `national_grade` or a bare `grade`; resolved once here.
#[derive(Deserialize)]
struct AddParticipantBody {
    name: String,
    gender: Gender,
    #[serde(default)]
    local_grade: Option<String>,
    #[serde(default)]
    national_grade: Option<String>,
    #[serde(default)]
    grade: Option<String>,
    age_group: AgeGroup,
}

#[derive(Deserialize)]
struct SetSlotBody {
    round: u32,
    court: u32,
    field: PlayerField,
    #[serde(default)]
    participant_id: Option<ParticipantId>,
}

#[derive(Deserialize)]
struct SessionPath {
    id: SessionId,
}

#[derive(Deserialize)]
struct ParticipantPath {
    id: SessionId,
    participant_id: ParticipantId,
}

#[derive(Deserialize)]
struct RoundPath {
    id: SessionId,
    round: u32,
}

/// Field is the 1-based player position (1-2 team A, 3-4 team B).
#[derive(Deserialize)]
struct SlotFieldPath {
    id: SessionId,
    round: u32,
    court: u32,
    field: u8,
}

#[derive(Deserialize)]
struct GamePath {
    game_id: GameId,
}

#[derive(Deserialize)]
struct ShareLinkPath {
    share_link: String,
}

#[derive(Deserialize)]
struct MatchPath {
    game_id: GameId,
    match_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddRoundBody {
    court_matches: Vec<NewCourtMatch>,
}

/// `result: null` clears a recorded result.
#[derive(Deserialize)]
struct MatchResultBody {
    #[serde(default)]
    result: Option<MatchResult>,
}

#[derive(Deserialize)]
struct StatusBody {
    status: GameStatus,
}

#[derive(Serialize)]
struct SlotView {
    round_number: u32,
    court_number: u32,
    #[serde(flatten)]
    classification: Classification,
}

/// Session plus the values the editor derives on read: game types and games per participant.
#[derive(Serialize)]
struct SessionView<'a> {
    #[serde(flatten)]
    session: &'a GameSession,
    classifications: Vec<SlotView>,
    game_counts: HashMap<ParticipantId, usize>,
}

impl<'a> SessionView<'a> {
    fn new(session: &'a GameSession) -> Self {
        let classifications = session
            .slots
            .iter()
            .map(|s| SlotView {
                round_number: s.round_number,
                court_number: s.court_number,
                classification: classify_slot(session, s),
            })
            .collect();
        let game_counts = session
            .participants
            .iter()
            .map(|p| (p.id, count_games_for(session, p.id)))
            .collect();
        Self {
            session,
            classifications,
            game_counts,
        }
    }
}

fn not_found(what: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": format!("No {what}") }))
}

fn bad_request(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

fn bad_gateway(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadGateway().json(serde_json::json!({ "error": e.to_string() }))
}

/// Status for a failed game operation: 404 for unknown games or matches, 400 for rejected
/// input, 502 for everything the backend or store got wrong.
fn game_error(e: SubmissionError) -> HttpResponse {
    match e {
        SubmissionError::GameNotFound(_) | SubmissionError::MatchNotFound(_) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": e.to_string() }))
        }
        SubmissionError::Invalid(_) | SubmissionError::Session(_) => bad_request(e),
        e => {
            log::error!("Game operation failed: {}", e);
            bad_gateway(e)
        }
    }
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

/// Run `f` on a session and answer with the updated view (404 if missing, 400 on domain errors).
fn with_session<T>(
    state: &AppState,
    id: SessionId,
    f: impl FnOnce(&mut GameSession) -> Result<T, SessionError>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let entry = match g.get_mut(&id) {
        Some(e) => e,
        None => return not_found("session"),
    };
    entry.last_activity = Instant::now();
    match f(&mut entry.session) {
        Ok(_) => HttpResponse::Ok().json(SessionView::new(&entry.session)),
        Err(e) => bad_request(e),
    }
}

#[get("/api/health")]
async fn api_health(adapter: Data<dyn GameAdmin>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "court-manager",
        backend: adapter.backend_tag(),
    })
}

/// Create a new editing session (client keeps the id for subsequent requests).
#[post("/api/sessions")]
async fn api_create_session(state: AppState, body: Json<CreateSessionBody>) -> HttpResponse {
    let body = body.into_inner();
    let mut session =
        match GameSession::new(body.title.trim(), body.court_count, body.round_count, body.grade_type) {
            Ok(s) => s,
            Err(e) => return bad_request(e),
        };
    session.match_record_mode = body.match_record_mode;
    session.is_private = body.is_private;
    let id = session.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let entry = g.entry(id).or_insert(SessionEntry {
        session,
        last_activity: Instant::now(),
    });
    log::info!("Created session {}", id);
    HttpResponse::Ok().json(SessionView::new(&entry.session))
}

/// Get a session by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/sessions/{id}")]
async fn api_get_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |_| Ok(()))
}

/// Delete the entire game (the confirmed form of removing its last round).
#[delete("/api/sessions/{id}")]
async fn api_delete_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.remove(&path.id) {
        Some(_) => {
            log::info!("Deleted session {}", path.id);
            HttpResponse::NoContent().finish()
        }
        None => not_found("session"),
    }
}

#[put("/api/sessions/{id}/basics")]
async fn api_set_basics(state: AppState, path: Path<SessionPath>, body: Json<BasicsBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        s.set_basics(&body.title, body.court_count, body.round_count, body.grade_type)
    })
}

#[post("/api/sessions/{id}/participants")]
async fn api_add_participant(
    state: AppState,
    path: Path<SessionPath>,
    body: Json<AddParticipantBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found("session"),
    };
    entry.last_activity = Instant::now();
    let s = &mut entry.session;
    let grade = match Grade::resolve(
        body.local_grade.as_deref(),
        body.national_grade.as_deref(),
        body.grade.as_deref(),
        s.grade_type,
    ) {
        Ok(g) => g,
        Err(e) => return bad_request(e),
    };
    match s.add_participant(&body.name, body.gender, grade, body.age_group) {
        Ok(_) => HttpResponse::Ok().json(SessionView::new(s)),
        Err(e) => bad_request(e),
    }
}

#[put("/api/sessions/{id}/participants/{participant_id}")]
async fn api_update_participant(
    state: AppState,
    path: Path<ParticipantPath>,
    body: Json<ParticipantUpdate>,
) -> HttpResponse {
    with_session(&state, path.id, |s| s.update_participant(path.participant_id, *body))
}

/// Remove a participant; their slot assignments are cleared.
#[delete("/api/sessions/{id}/participants/{participant_id}")]
async fn api_remove_participant(state: AppState, path: Path<ParticipantPath>) -> HttpResponse {
    with_session(&state, path.id, |s| s.remove_participant(path.participant_id))
}

/// CreateBasics -> MatchupEditing (builds the matrix).
#[post("/api/sessions/{id}/matchup")]
async fn api_proceed_to_matchup(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, proceed_to_matchup)
}

/// MatchupEditing -> CreateBasics.
#[post("/api/sessions/{id}/back")]
async fn api_back_to_basics(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, back_to_basics)
}

#[post("/api/sessions/{id}/rounds")]
async fn api_add_round(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, add_round)
}

/// Remove a round. Removing the last one answers 409: delete the whole game instead.
#[delete("/api/sessions/{id}/rounds/{round}")]
async fn api_remove_round(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return not_found("session"),
    };
    entry.last_activity = Instant::now();
    match remove_round(&mut entry.session, path.round) {
        Ok(RoundRemoval::Removed) => HttpResponse::Ok().json(SessionView::new(&entry.session)),
        Ok(RoundRemoval::DeleteGameRequired) => HttpResponse::Conflict().json(serde_json::json!({
            "error": "This is the only round; delete the whole game instead",
            "delete_game_required": true,
        })),
        Err(e) => bad_request(e),
    }
}

#[put("/api/sessions/{id}/slots")]
async fn api_set_slot(state: AppState, path: Path<SessionPath>, body: Json<SetSlotBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        set_slot_field(s, body.round, body.court, body.field, body.participant_id)
    })
}

/// Participants that may be picked for one slot field.
#[get("/api/sessions/{id}/slots/{round}/{court}/{field}/options")]
async fn api_slot_options(state: AppState, path: Path<SlotFieldPath>) -> HttpResponse {
    let Some(field) = PlayerField::from_number(path.field) else {
        return bad_request("Player position must be 1-4");
    };
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let entry = match g.get(&path.id) {
        Some(e) => e,
        None => return not_found("session"),
    };
    let s = &entry.session;
    if s.slot(path.round, path.court).is_none() {
        return bad_request(SessionError::SlotNotFound {
            round: path.round,
            court: path.court,
        });
    }
    HttpResponse::Ok().json(available_participants(s, path.round, path.court, field))
}

/// Submit the session through the configured adapter. The lock is not held while waiting.
/// The submission runs on its own task, so the stored session leaves Submitting even if
/// the client goes away before the backend answers.
#[post("/api/sessions/{id}/submit")]
async fn api_submit(
    state: AppState,
    path: Path<SessionPath>,
    adapter: Data<dyn GameAdmin>,
    config: Data<Config>,
) -> HttpResponse {
    let working = {
        let mut g = match state.write() {
            Ok(guard) => guard,
            Err(_) => return lock_error(),
        };
        let entry = match g.get_mut(&path.id) {
            Some(e) => e,
            None => return not_found("session"),
        };
        entry.last_activity = Instant::now();
        let working = entry.session.clone();
        // Blocks further edits until the submission settles.
        if let Err(e) = begin_submission(&mut entry.session) {
            return bad_request(e);
        }
        working
    };

    let id = path.id;
    let state_record = state.clone();
    let task = spawn_submission(
        working,
        adapter.into_inner(),
        config.public_origin.clone(),
        move |settled| match state_record.write() {
            // The session may have been deleted while the request was in flight.
            Ok(mut g) => {
                if let Some(entry) = g.get_mut(&id) {
                    entry.session = settled.clone();
                    entry.last_activity = Instant::now();
                }
            }
            Err(_) => log::error!("Could not record submission of session {}: lock poisoned", id),
        },
    );

    match task.await {
        Ok((session, Ok(_))) => HttpResponse::Ok().json(SessionView::new(&session)),
        Ok((_, Err(e @ (SubmissionError::Invalid(_) | SubmissionError::Session(_))))) => bad_request(e),
        Ok((_, Err(e))) => bad_gateway(e),
        Err(e) => {
            log::error!("Submission task for session {} failed: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": "Submission failed" }))
        }
    }
}

#[derive(Serialize)]
struct GameView {
    #[serde(flatten)]
    game: GameProjection,
    classifications: Vec<Classification>,
}

fn game_view(game: Option<GameProjection>) -> HttpResponse {
    match game {
        Some(game) => {
            let classifications = game.court_matches.iter().map(|m| game.classify_match(m)).collect();
            HttpResponse::Ok().json(GameView { game, classifications })
        }
        None => not_found("game"),
    }
}

/// Read a created game back from the adapter (404 if it does not exist).
#[get("/api/games/{game_id}")]
async fn api_get_game(path: Path<GamePath>, adapter: Data<dyn GameAdmin>) -> HttpResponse {
    match adapter.fetch_game(path.game_id).await {
        Ok(game) => game_view(game),
        Err(e) => game_error(e),
    }
}

#[get("/api/games/share/{share_link}")]
async fn api_get_game_by_share_link(path: Path<ShareLinkPath>, adapter: Data<dyn GameAdmin>) -> HttpResponse {
    match adapter.fetch_game_by_share_link(&path.share_link).await {
        Ok(game) => game_view(game),
        Err(e) => game_error(e),
    }
}

/// Partial settings edit; absent fields stay as they are.
#[patch("/api/games/{game_id}")]
async fn api_update_game(
    path: Path<GamePath>,
    adapter: Data<dyn GameAdmin>,
    body: Json<GameUpdate>,
) -> HttpResponse {
    match adapter.update_game(path.game_id, &body).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => game_error(e),
    }
}

#[post("/api/games/{game_id}/rounds")]
async fn api_add_game_round(
    path: Path<GamePath>,
    adapter: Data<dyn GameAdmin>,
    body: Json<AddRoundBody>,
) -> HttpResponse {
    match adapter.add_round(path.game_id, &body.court_matches).await {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => game_error(e),
    }
}

#[post("/api/games/{game_id}/courts")]
async fn api_add_game_court(path: Path<GamePath>, adapter: Data<dyn GameAdmin>) -> HttpResponse {
    match adapter.add_court(path.game_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => game_error(e),
    }
}

#[put("/api/games/{game_id}/matches/{match_id}/result")]
async fn api_update_match_result(
    path: Path<MatchPath>,
    adapter: Data<dyn GameAdmin>,
    body: Json<MatchResultBody>,
) -> HttpResponse {
    match adapter
        .update_match_result(path.game_id, &path.match_id, body.result)
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => game_error(e),
    }
}

#[put("/api/games/{game_id}/status")]
async fn api_update_game_status(
    path: Path<GamePath>,
    adapter: Data<dyn GameAdmin>,
    body: Json<StatusBody>,
) -> HttpResponse {
    match adapter.update_game_status(path.game_id, body.status).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => game_error(e),
    }
}

#[put("/api/games/{game_id}/matches/status")]
async fn api_update_all_match_status(
    path: Path<GamePath>,
    adapter: Data<dyn GameAdmin>,
    body: Json<StatusBody>,
) -> HttpResponse {
    match adapter.update_all_match_status(path.game_id, body.status).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => game_error(e),
    }
}

/// Register a late participant on a created game.
#[post("/api/games/{game_id}/participants")]
async fn api_add_game_participant(
    path: Path<GamePath>,
    adapter: Data<dyn GameAdmin>,
    body: Json<NewParticipant>,
) -> HttpResponse {
    match adapter.add_participant(path.game_id, &body).await {
        Ok(participant) => HttpResponse::Ok().json(participant),
        Err(e) => game_error(e),
    }
}

fn build_adapter(config: &Config) -> io::Result<Arc<dyn GameAdmin>> {
    Ok(match config.backend {
        BackendKind::Http => {
            let auth = Arc::new(AuthContext::with_tokens(config.access_token.clone(), None));
            let backend = HttpBackend::new(config.api_url.clone(), auth)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            Arc::new(backend)
        }
        BackendKind::Storage => Arc::new(LocalStore::new(&config.storage_dir, config.public_origin.clone())),
    })
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let adapter = build_adapter(&config)?;
    let bind = (config.host.clone(), config.port);
    log::info!(
        "Starting server at http://{}:{} (backend: {})",
        bind.0,
        bind.1,
        adapter.backend_tag()
    );

    let state = Data::new(RwLock::new(HashMap::<SessionId, SessionEntry>::new()));
    let adapter: Data<dyn GameAdmin> = Data::from(adapter);
    let config = Data::new(config);

    // Background task: every 30 minutes, remove sessions inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive session(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(adapter.clone())
            .app_data(config.clone())
            .service(api_health)
            .service(api_create_session)
            .service(api_get_session)
            .service(api_delete_session)
            .service(api_set_basics)
            .service(api_add_participant)
            .service(api_update_participant)
            .service(api_remove_participant)
            .service(api_proceed_to_matchup)
            .service(api_back_to_basics)
            .service(api_add_round)
            .service(api_remove_round)
            .service(api_set_slot)
            .service(api_slot_options)
            .service(api_submit)
            .service(api_get_game_by_share_link)
            .service(api_get_game)
            .service(api_update_game)
            .service(api_add_game_round)
            .service(api_add_game_court)
            .service(api_update_match_result)
            .service(api_update_game_status)
            .service(api_update_all_match_status)
            .service(api_add_game_participant)
    })
    .bind(bind)?
    .run()
    .await
}
