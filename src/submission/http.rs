//! Remote game backend over HTTP.

use crate::auth::AuthContext;
use crate::models::{CourtMatch, GameId, GameProjection, GameStatus, MatchResult, ProjectedParticipant};
use crate::submission::{
    ApiResponse, CreateGameRequest, CreateGameResponse, GameAdmin, GameUpdate, NewCourtMatch,
    NewParticipant, SubmissionAdapter, SubmissionError,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = "CourtManager/0.1";
const TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct ResultBody {
    result: Option<MatchResult>,
}

#[derive(Serialize)]
struct StatusBody {
    status: GameStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddRoundBody<'a> {
    court_matches: &'a [NewCourtMatch],
}

/// Client for the game backend. Authorized calls carry the bearer token of `auth`
/// and are retried once after a token refresh when answered with 401.
pub struct HttpBackend {
    client: Client,
    api_url: String,
    auth: Arc<AuthContext>,
}

impl HttpBackend {
    pub fn new(api_url: impl Into<String>, auth: Arc<AuthContext>) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send_once<B>(&self, method: Method, url: &str, body: Option<&B>) -> Result<reqwest::Response, SubmissionError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut req = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = self.auth.access_token() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        Ok(req.send().await?)
    }

    /// Send with auth; on 401 refresh the token once and retry once.
    async fn send<B>(&self, method: Method, url: &str, body: Option<&B>) -> Result<reqwest::Response, SubmissionError>
    where
        B: Serialize + Sync + ?Sized,
    {
        info!("{} {}", method, url);
        let response = self.send_once(method.clone(), url, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        info!("Access token expired, attempting refresh...");
        match self.auth.refresh(&self.client, &self.api_url).await {
            Some(_) => self.send_once(method, url, body).await,
            None => Ok(response),
        }
    }

    /// Decode an envelope, turning error statuses and unsuccessful envelopes into errors.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<ApiResponse<T>, SubmissionError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiResponse<IgnoredAny>>()
                .await
                .ok()
                .map(|r| r.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("API request failed: {}", status.as_u16()));
            return Err(SubmissionError::Backend(message));
        }
        let envelope: ApiResponse<T> = response.json().await?;
        if !envelope.success {
            return Err(SubmissionError::Backend(envelope.message));
        }
        Ok(envelope)
    }

    /// GET a game; 404 and unsuccessful envelopes read as `None`.
    async fn fetch_optional(&self, path: &str) -> Result<Option<GameProjection>, SubmissionError> {
        let response = self.send::<()>(Method::GET, &self.url(path), None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        match Self::decode::<GameProjection>(response).await {
            Ok(envelope) => Ok(envelope.data),
            Err(SubmissionError::Backend(message)) => {
                warn!("Failed to get game at {}: {}", path, message);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn call<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<ApiResponse<T>, SubmissionError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let response = self.send(method, &self.url(path), body).await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl SubmissionAdapter for HttpBackend {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn create_game(&self, request: &CreateGameRequest) -> Result<GameId, SubmissionError> {
        debug!("Create game request: {:?}", request);
        let envelope = self
            .call::<CreateGameResponse, _>(Method::POST, "/free-games", Some(request))
            .await?;
        let created = envelope.data.ok_or_else(|| {
            let message = if envelope.message.is_empty() {
                "Creating the game failed".to_string()
            } else {
                envelope.message.clone()
            };
            SubmissionError::Backend(message)
        })?;
        info!("Created game {}", created.game_id);
        Ok(created.game_id)
    }

    async fn fetch_game(&self, game_id: GameId) -> Result<Option<GameProjection>, SubmissionError> {
        self.fetch_optional(&format!("/games/{game_id}")).await
    }
}

#[async_trait]
impl GameAdmin for HttpBackend {
    /// `GET /games/share/{share_link}`.
    async fn fetch_game_by_share_link(&self, share_link: &str) -> Result<Option<GameProjection>, SubmissionError> {
        self.fetch_optional(&format!("/games/share/{share_link}")).await
    }

    /// `PATCH /games/{id}`.
    async fn update_game(&self, game_id: GameId, update: &GameUpdate) -> Result<(), SubmissionError> {
        let path = format!("/games/{game_id}");
        self.call::<IgnoredAny, _>(Method::PATCH, &path, Some(update))
            .await?;
        Ok(())
    }

    /// `POST /games/{id}/rounds`.
    async fn add_round(&self, game_id: GameId, matches: &[NewCourtMatch]) -> Result<Vec<CourtMatch>, SubmissionError> {
        let path = format!("/games/{game_id}/rounds");
        let body = AddRoundBody {
            court_matches: matches,
        };
        let envelope = self
            .call::<Vec<CourtMatch>, _>(Method::POST, &path, Some(&body))
            .await?;
        envelope
            .data
            .ok_or_else(|| SubmissionError::Backend("Adding the round failed".to_string()))
    }

    /// `POST /games/{id}/courts` (no body).
    async fn add_court(&self, game_id: GameId) -> Result<(), SubmissionError> {
        let path = format!("/games/{game_id}/courts");
        self.call::<IgnoredAny, ()>(Method::POST, &path, None).await?;
        Ok(())
    }

    /// `PUT /games/{id}/matches/{match_id}/result`.
    async fn update_match_result(
        &self,
        game_id: GameId,
        match_id: &str,
        result: Option<MatchResult>,
    ) -> Result<(), SubmissionError> {
        let path = format!("/games/{game_id}/matches/{match_id}/result");
        self.call::<IgnoredAny, _>(Method::PUT, &path, Some(&ResultBody { result }))
            .await?;
        Ok(())
    }

    /// `PUT /games/{id}/status`.
    async fn update_game_status(&self, game_id: GameId, status: GameStatus) -> Result<(), SubmissionError> {
        let path = format!("/games/{game_id}/status");
        self.call::<IgnoredAny, _>(Method::PUT, &path, Some(&StatusBody { status }))
            .await?;
        Ok(())
    }

    /// `PUT /games/{id}/matches/status`.
    async fn update_all_match_status(&self, game_id: GameId, status: GameStatus) -> Result<(), SubmissionError> {
        let path = format!("/games/{game_id}/matches/status");
        self.call::<IgnoredAny, _>(Method::PUT, &path, Some(&StatusBody { status }))
            .await?;
        Ok(())
    }

    /// `POST /games/{id}/participants`.
    async fn add_participant(
        &self,
        game_id: GameId,
        participant: &NewParticipant,
    ) -> Result<ProjectedParticipant, SubmissionError> {
        let path = format!("/games/{game_id}/participants");
        let envelope = self
            .call::<ProjectedParticipant, _>(Method::POST, &path, Some(participant))
            .await?;
        envelope
            .data
            .ok_or_else(|| SubmissionError::Backend("Adding the participant failed".to_string()))
    }
}
