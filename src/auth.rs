//! Access/refresh token holder for calls to the remote backend.
//!
//! One `AuthContext` is created at session start and shared (behind an `Arc`) by whatever
//! talks to the backend; `clear` tears it down on logout.

use crate::submission::ApiResponse;
use log::{info, warn};
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::RwLock;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenResponse {
    #[serde(default)]
    user_id: Option<u64>,
    access_token: String,
}

#[derive(Debug, Default)]
pub struct AuthContext {
    access_token: RwLock<Option<String>>,
    refresh_token: RwLock<Option<String>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: RwLock::new(access_token),
            refresh_token: RwLock::new(refresh_token),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().ok().and_then(|t| t.clone())
    }

    pub fn set_access_token(&self, token: impl Into<String>) {
        if let Ok(mut t) = self.access_token.write() {
            *t = Some(token.into());
        }
    }

    pub fn remove_access_token(&self) {
        if let Ok(mut t) = self.access_token.write() {
            *t = None;
        }
    }

    /// Forget both tokens (logout).
    pub fn clear(&self) {
        self.remove_access_token();
        if let Ok(mut t) = self.refresh_token.write() {
            *t = None;
        }
    }

    /// Exchange the refresh token for a new access token via `POST {api_url}/auth/refresh`.
    ///
    /// Returns the new token, or None when refreshing is not possible. A 400/500 answer means
    /// the refresh token is missing or expired, so the stale access token is dropped too.
    pub async fn refresh(&self, client: &reqwest::Client, api_url: &str) -> Option<String> {
        let url = format!("{}/auth/refresh", api_url.trim_end_matches('/'));
        info!("POST {} (refreshing access token)", url);

        let mut req = client.post(&url).header(ACCEPT, "application/json");
        let refresh_token = self.refresh_token.read().ok().and_then(|t| t.clone());
        if let Some(token) = refresh_token {
            req = req.header(COOKIE, format!("refresh_token={token}"));
        }

        let response = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Refresh token request failed: {}", e);
                self.remove_access_token();
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Refresh token rejected: {}", status);
            if status == StatusCode::BAD_REQUEST || status == StatusCode::INTERNAL_SERVER_ERROR {
                self.remove_access_token();
            }
            return None;
        }

        match response.json::<ApiResponse<RefreshTokenResponse>>().await {
            Ok(ApiResponse {
                success: true,
                data: Some(data),
                ..
            }) => {
                info!("Access token refreshed (user {:?})", data.user_id);
                self.set_access_token(data.access_token.clone());
                Some(data.access_token)
            }
            Ok(body) => {
                warn!("Refresh response indicates failure: {}", body.message);
                None
            }
            Err(e) => {
                warn!("Refresh response unreadable: {}", e);
                self.remove_access_token();
                None
            }
        }
    }
}
