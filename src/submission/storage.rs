//! Local JSON store: every created game is one record of a single JSON array,
//! read wholesale, appended to and written back wholesale.

use crate::models::{
    validate_counts, CourtMatch, GameId, GameProjection, GameStatus, MatchResult,
    ProjectedParticipant, SessionError, MAX_COURTS,
};
use crate::submission::{
    share_url, CreateGameRequest, GameAdmin, GameUpdate, NewCourtMatch, NewParticipant,
    SubmissionAdapter, SubmissionError,
};
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use rand::Rng;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Name the array is kept under (the file is `{dir}/{STORAGE_KEY}.json`).
pub const STORAGE_KEY: &str = "tournaments";

const INVITE_CODE_LEN: usize = 6;
const INVITE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CHARSET[rng.gen_range(0..INVITE_CHARSET.len())] as char)
        .collect()
}

pub struct LocalStore {
    path: PathBuf,
    origin: String,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Store under `dir`; `origin` is used to build share links.
    pub fn new(dir: impl AsRef<Path>, origin: impl Into<String>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
            origin: origin.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored games, oldest first. A missing file is an empty store.
    pub async fn list(&self) -> Result<Vec<GameProjection>, SubmissionError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, games: &[GameProjection]) -> Result<(), SubmissionError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(games)?;
        tokio::fs::write(&self.path, text).await?;
        Ok(())
    }

    /// Turn a request into a stored record. Participants get ids "1", "2", ... in order
    /// and matches refer to them by those ids.
    fn project(&self, id: GameId, request: &CreateGameRequest, invite_code: Option<String>) -> GameProjection {
        let participants: Vec<ProjectedParticipant> = request
            .participants
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, p)| ProjectedParticipant {
                id: (i + 1).to_string(),
                name: p.original_name.clone(),
                display_name: None,
                gender: p.gender,
                grade: p.grade,
                age_group: p.age_group,
                user_id: p.user_id,
            })
            .collect();
        let ids: HashMap<&str, &str> = participants
            .iter()
            .map(|p| (p.name.as_str(), p.id.as_str()))
            .collect();
        let id_of = |name: Option<&str>| {
            name.and_then(|n| ids.get(n))
                .map(|id| id.to_string())
                .unwrap_or_default()
        };
        let court_matches = request
            .court_matches
            .iter()
            .map(|m| {
                let [p1, p2, p3, p4] = m.players();
                CourtMatch {
                    id: Some(format!("{}-{}", m.round_number, m.court_number)),
                    round_number: m.round_number,
                    court_number: m.court_number,
                    player1_id: id_of(p1),
                    player2_id: id_of(p2),
                    player3_id: id_of(p3),
                    player4_id: id_of(p4),
                    game_type: None,
                    result: None,
                    status: Some(GameStatus::Pending),
                }
            })
            .collect();

        let mut game = GameProjection {
            id,
            title: request.title.clone(),
            court_count: request.court_count,
            round_count: request.round_count,
            grade_type: request.grade_type,
            participants,
            court_matches,
            status: GameStatus::Pending,
            share_link: share_url(&self.origin, id),
            created_at: Utc::now(),
            created_by: 0,
            invite_code,
        };
        reclassify(&mut game);
        game
    }

    /// Read-modify-write one stored game under the write lock.
    async fn modify<T, F>(&self, game_id: GameId, f: F) -> Result<T, SubmissionError>
    where
        F: FnOnce(&mut GameProjection) -> Result<T, SubmissionError> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut games = self.list().await?;
        let game = games
            .iter_mut()
            .find(|g| g.id == game_id)
            .ok_or(SubmissionError::GameNotFound(game_id))?;
        let out = f(game)?;
        reclassify(game);
        self.write_all(&games).await?;
        info!("Updated stored game {}", game_id);
        Ok(out)
    }
}

/// Recompute the stored game type of every match from the current participants.
fn reclassify(game: &mut GameProjection) {
    let game_types: Vec<_> = game
        .court_matches
        .iter()
        .map(|m| game.classify_match(m).game_type)
        .collect();
    for (m, game_type) in game.court_matches.iter_mut().zip(game_types) {
        m.game_type = Some(game_type);
    }
}

fn empty_match(round_number: u32, court_number: u32) -> CourtMatch {
    CourtMatch {
        id: Some(format!("{round_number}-{court_number}")),
        round_number,
        court_number,
        player1_id: String::new(),
        player2_id: String::new(),
        player3_id: String::new(),
        player4_id: String::new(),
        game_type: None,
        result: None,
        status: Some(GameStatus::Pending),
    }
}

#[async_trait]
impl SubmissionAdapter for LocalStore {
    fn backend_tag(&self) -> &'static str {
        "storage"
    }

    async fn create_game(&self, request: &CreateGameRequest) -> Result<GameId, SubmissionError> {
        let invite_code = request.is_private.then(generate_invite_code);
        let _guard = self.write_lock.lock().await;
        let mut games = self.list().await?;
        let id = games.iter().map(|g| g.id).max().unwrap_or(0) + 1;
        games.push(self.project(id, request, invite_code));
        self.write_all(&games).await?;
        info!("Stored game {} in {}", id, self.path.display());
        Ok(id)
    }

    async fn fetch_game(&self, game_id: GameId) -> Result<Option<GameProjection>, SubmissionError> {
        Ok(self.list().await?.into_iter().find(|g| g.id == game_id))
    }
}

#[async_trait]
impl GameAdmin for LocalStore {
    /// Matches the full stored link or its last path segment.
    async fn fetch_game_by_share_link(&self, share_link: &str) -> Result<Option<GameProjection>, SubmissionError> {
        let share_link = share_link.trim_end_matches('/');
        Ok(self.list().await?.into_iter().find(|g| {
            g.share_link == share_link || g.share_link.rsplit('/').next() == Some(share_link)
        }))
    }

    async fn update_game(&self, game_id: GameId, update: &GameUpdate) -> Result<(), SubmissionError> {
        self.modify(game_id, |game| {
            let court_count = update.court_count.unwrap_or(game.court_count);
            let round_count = update.round_count.unwrap_or(game.round_count);
            validate_counts(court_count, round_count)?;
            if let Some(title) = &update.title {
                let title = title.trim();
                if title.is_empty() {
                    return Err(SubmissionError::Invalid("Title must not be empty".to_string()));
                }
                game.title = title.to_string();
            }
            game.court_count = court_count;
            game.round_count = round_count;
            Ok(())
        })
        .await
    }

    /// The round is stored as the next round number whatever numbers the request carries.
    async fn add_round(&self, game_id: GameId, matches: &[NewCourtMatch]) -> Result<Vec<CourtMatch>, SubmissionError> {
        let round = self.modify(game_id, |game| {
            let round = game.court_matches.iter().map(|m| m.round_number).max().unwrap_or(0) + 1;
            validate_counts(game.court_count, round)?;
            let known = |id: &str| id.is_empty() || game.participants.iter().any(|p| p.id == id);
            if let Some(unknown) = matches
                .iter()
                .flat_map(|m| [&m.player1_id, &m.player2_id, &m.player3_id, &m.player4_id])
                .find(|id| !known(id.as_str()))
            {
                return Err(SubmissionError::Invalid(format!("Unknown participant id {unknown}")));
            }
            let added: Vec<CourtMatch> = matches
                .iter()
                .map(|m| CourtMatch {
                    player1_id: m.player1_id.clone(),
                    player2_id: m.player2_id.clone(),
                    player3_id: m.player3_id.clone(),
                    player4_id: m.player4_id.clone(),
                    ..empty_match(round, m.court_number)
                })
                .collect();
            game.court_matches.extend(added);
            game.round_count = game.round_count.max(round);
            Ok(round)
        })
        .await?;

        let game = self
            .fetch_game(game_id)
            .await?
            .ok_or(SubmissionError::GameNotFound(game_id))?;
        Ok(game
            .court_matches
            .into_iter()
            .filter(|m| m.round_number == round)
            .collect())
    }

    /// One more court, with an empty match in every existing round.
    async fn add_court(&self, game_id: GameId) -> Result<(), SubmissionError> {
        self.modify(game_id, |game| {
            if game.court_count >= MAX_COURTS {
                return Err(SubmissionError::Session(SessionError::InvalidCount));
            }
            game.court_count += 1;
            let court = game.court_count;
            let rounds: Vec<u32> = (1..=game.round_count).collect();
            game.court_matches
                .extend(rounds.into_iter().map(|round| empty_match(round, court)));
            Ok(())
        })
        .await
    }

    async fn update_match_result(
        &self,
        game_id: GameId,
        match_id: &str,
        result: Option<MatchResult>,
    ) -> Result<(), SubmissionError> {
        self.modify(game_id, |game| {
            let m = game
                .court_matches
                .iter_mut()
                .find(|m| m.id.as_deref() == Some(match_id))
                .ok_or_else(|| SubmissionError::MatchNotFound(match_id.to_string()))?;
            m.result = result;
            Ok(())
        })
        .await
    }

    async fn update_game_status(&self, game_id: GameId, status: GameStatus) -> Result<(), SubmissionError> {
        self.modify(game_id, |game| {
            game.status = status;
            Ok(())
        })
        .await
    }

    async fn update_all_match_status(&self, game_id: GameId, status: GameStatus) -> Result<(), SubmissionError> {
        self.modify(game_id, |game| {
            for m in &mut game.court_matches {
                m.status = Some(status);
            }
            Ok(())
        })
        .await
    }

    /// New participants get the next numeric id.
    async fn add_participant(
        &self,
        game_id: GameId,
        participant: &NewParticipant,
    ) -> Result<ProjectedParticipant, SubmissionError> {
        self.modify(game_id, |game| {
            let name = participant.name.trim();
            if name.is_empty() {
                return Err(SubmissionError::Invalid("Participant name must not be empty".to_string()));
            }
            if game.participants.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
                return Err(SubmissionError::Invalid(
                    "A participant with this name already exists".to_string(),
                ));
            }
            let next = game
                .participants
                .iter()
                .filter_map(|p| p.id.parse::<u64>().ok())
                .max()
                .unwrap_or(0)
                + 1;
            let added = ProjectedParticipant {
                id: next.to_string(),
                name: name.to_string(),
                display_name: None,
                gender: participant.gender,
                grade: participant.grade,
                age_group: participant.age_group,
                user_id: None,
            };
            game.participants.push(added.clone());
            Ok(added)
        })
        .await
    }
}
