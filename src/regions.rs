//! Province/district lookups for participant profiles.
//!
//! District lists depend on the selected province. A new selection aborts the lookup still
//! running for the previous one, and a result is only applied while its selection is current,
//! so a slow stale response never replaces a newer one.

use crate::submission::ApiResponse;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Province {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    #[error("Region lookup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Backend(String),
}

/// Where region lists come from.
#[async_trait]
pub trait RegionSource: Send + Sync + 'static {
    async fn provinces(&self) -> Result<Vec<Province>, RegionError>;
    async fn districts(&self, province_id: u64) -> Result<Vec<District>, RegionError>;
}

/// `GET /regions/provinces` and `GET /regions/{province_id}/districts` on the backend.
pub struct RegionClient {
    client: Client,
    api_url: String,
}

impl RegionClient {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_list<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, RegionError> {
        let url = format!("{}{}", self.api_url, path);
        info!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RegionError::Backend(format!(
                "Region request failed: {}",
                response.status().as_u16()
            )));
        }
        let envelope: ApiResponse<Vec<T>> = response.json().await?;
        match envelope {
            ApiResponse {
                success: true,
                data: Some(list),
                ..
            } => Ok(list),
            other => Err(RegionError::Backend(other.message)),
        }
    }
}

#[async_trait]
impl RegionSource for RegionClient {
    async fn provinces(&self) -> Result<Vec<Province>, RegionError> {
        self.get_list("/regions/provinces").await
    }

    async fn districts(&self, province_id: u64) -> Result<Vec<District>, RegionError> {
        self.get_list(&format!("/regions/{province_id}/districts")).await
    }
}

/// District list belonging to the current province selection.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DistrictState {
    pub province_id: Option<u64>,
    /// Bumped on every selection; results tagged with an older value are dropped.
    pub generation: u64,
    pub districts: Vec<District>,
    pub loading: bool,
}

pub struct DistrictSelector<S: RegionSource> {
    source: Arc<S>,
    state: Arc<Mutex<DistrictState>>,
    in_flight: Option<JoinHandle<()>>,
}

impl<S: RegionSource> DistrictSelector<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(DistrictState::default())),
            in_flight: None,
        }
    }

    /// Select a province (or none) and start loading its districts. Must run inside a tokio runtime.
    pub fn select_province(&mut self, province_id: Option<u64>) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }

        let generation = match self.state.lock() {
            Ok(mut state) => {
                state.generation += 1;
                state.province_id = province_id;
                state.districts.clear();
                state.loading = province_id.is_some();
                state.generation
            }
            Err(_) => return,
        };

        let Some(province_id) = province_id else {
            return;
        };
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        self.in_flight = Some(tokio::spawn(async move {
            let result = source.districts(province_id).await;
            let Ok(mut state) = state.lock() else {
                return;
            };
            if state.generation != generation {
                debug!("Dropping stale districts for province {}", province_id);
                return;
            }
            state.districts = result.unwrap_or_else(|e| {
                warn!("Failed to load districts for province {}: {}", province_id, e);
                Vec::new()
            });
            state.loading = false;
        }));
    }

    /// Wait for the current lookup, if any, to finish. A lookup that panicked leaves an
    /// empty, settled list.
    pub async fn settle(&mut self) {
        let Some(task) = self.in_flight.take() else {
            return;
        };
        match task.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => debug!("District lookup was cancelled"),
            Err(e) => {
                warn!("District lookup task failed: {}", e);
                if let Ok(mut state) = self.state.lock() {
                    state.districts.clear();
                    state.loading = false;
                }
            }
        }
    }

    pub fn snapshot(&self) -> DistrictState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}
