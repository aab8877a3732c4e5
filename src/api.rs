use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{ScoutConfig, normalize_base_url};
use crate::error::{ApiError, extract_detail};
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client_with_timeout;
use crate::models::{
    ChanceAnalysis, FullTacticalAnalysis, HealthStatus, HubDetail, MatchesResponse,
    NetworkGraphResponse, NetworkResponse, PatternsResponse, PhasesResponse, PreMatchRequest,
    PreMatchResult, PressingResponse, ReplayResponse, SetPiecesResponse, StandingsResponse,
    TeamAnalysis, TeamInfo, TeamsResponse, VaepSummary, VideoJob, VideoJobRequest,
};
use crate::retry::{RetryPolicy, send_with_retry};

pub const DEFAULT_PATTERN_GAMES: u32 = 5;
pub const DEFAULT_ANALYSIS_GAMES: u32 = 100;
pub const DEFAULT_PRE_MATCH_GAMES: u32 = 5;
pub const DEFAULT_N_TOP_VAEP: u32 = 10;
pub const DEFAULT_N_TOP_SETPIECES: u32 = 2;

/// A decoded GET body. `stale` is set when the backend was unreachable and
/// the payload came from the on-disk cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub stale: bool,
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            stale: self.stale,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoutApi {
    base: String,
    client: Client,
    policy: RetryPolicy,
    cache: bool,
}

impl ScoutApi {
    pub fn new(cfg: &ScoutConfig) -> Result<Self> {
        let client = http_client_with_timeout(cfg.http_timeout)?.clone();
        Ok(Self::with_client(
            &cfg.api_base,
            client,
            RetryPolicy::from_config(cfg),
        ))
    }

    pub fn with_client(base: &str, client: Client, policy: RetryPolicy) -> Self {
        Self {
            base: normalize_base_url(base),
            client,
            policy,
            cache: true,
        }
    }

    /// Skips the conditional-GET disk cache; every GET goes to the network.
    pub fn without_cache(mut self) -> Self {
        self.cache = false;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Fetched<T>> {
        let url = self.url(path);
        let (body, stale) = if self.cache {
            let cached = fetch_json_cached(&self.client, &url, &self.policy)?;
            (cached.body, cached.stale)
        } else {
            let resp = send_with_retry(&self.policy, || self.client.get(&url))
                .map_err(|err| ApiError::Transport(err.to_string()))?;
            (read_success_body(resp)?, false)
        };
        let data = decode(path, &body)?;
        Ok(Fetched { data, stale })
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let resp = send_with_retry(&self.policy, || self.client.post(&url).json(body))
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let text = read_success_body(resp)?;
        Ok(decode(path, &text)?)
    }

    pub fn teams(&self) -> Result<Fetched<TeamsResponse>> {
        self.get("/api/teams/")
    }

    pub fn teams_overview(&self) -> Result<Fetched<StandingsResponse>> {
        self.get("/api/teams/overview")
    }

    pub fn team_info(&self, team_id: u32) -> Result<Fetched<TeamInfo>> {
        self.get(&format!("/api/teams/{team_id}"))
    }

    pub fn team_patterns(
        &self,
        team_id: u32,
        n_games: u32,
        n_patterns: u32,
    ) -> Result<Fetched<PatternsResponse>> {
        self.get(&format!(
            "/api/patterns/{team_id}?n_games={n_games}&n_patterns={n_patterns}"
        ))
    }

    pub fn team_phases(&self, team_id: u32, n_games: u32) -> Result<Fetched<PhasesResponse>> {
        self.get(&format!("/api/patterns/{team_id}/phases?n_games={n_games}"))
    }

    pub fn team_analysis(&self, team_id: u32, n_games: u32) -> Result<Fetched<TeamAnalysis>> {
        self.get(&format!("/api/patterns/{team_id}/analysis?n_games={n_games}"))
    }

    pub fn team_vaep(
        &self,
        team_id: u32,
        n_games: u32,
        n_top: u32,
    ) -> Result<Fetched<VaepSummary>> {
        self.get(&format!(
            "/api/patterns/{team_id}/vaep?n_games={n_games}&n_top={n_top}"
        ))
    }

    pub fn phase_replay(
        &self,
        team_id: u32,
        phase_id: u32,
        n_games: u32,
    ) -> Result<Fetched<ReplayResponse>> {
        self.get(&format!(
            "/api/patterns/{team_id}/phases/{phase_id}/replay?n_games={n_games}"
        ))
    }

    pub fn team_setpieces(
        &self,
        team_id: u32,
        n_games: u32,
        n_top: u32,
    ) -> Result<Fetched<SetPiecesResponse>> {
        self.get(&format!(
            "/api/setpieces/{team_id}?n_games={n_games}&n_top={n_top}"
        ))
    }

    pub fn team_network(
        &self,
        team_id: u32,
        n_games: u32,
        n_hubs: u32,
    ) -> Result<Fetched<NetworkResponse>> {
        self.get(&format!(
            "/api/network/{team_id}?n_games={n_games}&n_hubs={n_hubs}"
        ))
    }

    pub fn network_graph(
        &self,
        team_id: u32,
        n_games: u32,
    ) -> Result<Fetched<NetworkGraphResponse>> {
        self.get(&format!("/api/network/{team_id}/graph?n_games={n_games}"))
    }

    pub fn hub_detail(
        &self,
        team_id: u32,
        player_id: u64,
        n_games: u32,
    ) -> Result<Fetched<HubDetail>> {
        self.get(&format!(
            "/api/network/{team_id}/hubs/{player_id}?n_games={n_games}"
        ))
    }

    pub fn simulate_pressing(
        &self,
        team_id: u32,
        player_id: u64,
        n_games: u32,
    ) -> Result<Fetched<PressingResponse>> {
        self.get(&format!(
            "/api/simulation/{team_id}/pressing/{player_id}?n_games={n_games}"
        ))
    }

    pub fn full_tactical_analysis(
        &self,
        team_id: u32,
        n_games: u32,
    ) -> Result<Fetched<FullTacticalAnalysis>> {
        self.get(&format!(
            "/api/simulation/{team_id}/full-analysis?n_games={n_games}"
        ))
    }

    pub fn pre_match_simulation(
        &self,
        our_team_id: u32,
        opponent_id: u32,
        n_games: u32,
    ) -> Result<PreMatchResult> {
        let body = PreMatchRequest {
            our_team_id,
            opponent_id,
            n_games,
        };
        self.post_json("/api/simulation/pre-match", &body)
    }

    pub fn match_list(&self, team_id: Option<u32>) -> Result<Fetched<MatchesResponse>> {
        match team_id {
            Some(team_id) => self.get(&format!("/api/simulation/matches?team_id={team_id}")),
            None => self.get("/api/simulation/matches"),
        }
    }

    pub fn match_chances(&self, game_id: u64) -> Result<Fetched<ChanceAnalysis>> {
        self.get(&format!("/api/simulation/matches/{game_id}/chances"))
    }

    pub fn start_video_job(&self, url: &str) -> Result<VideoJob> {
        let body = VideoJobRequest {
            url: url.trim().to_string(),
        };
        self.post_json("/api/video/jobs", &body)
    }

    /// Uploads a local clip. The file is read once so retries can resend it.
    pub fn upload_video_job(&self, path: &Path, url: &str) -> Result<VideoJob> {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.mp4".to_string());
        let endpoint = "/api/video/upload";
        let target = self.url(endpoint);
        let resp = send_with_retry(&self.policy, || {
            let part = Part::bytes(bytes.clone()).file_name(file_name.clone());
            let form = Form::new()
                .part("file", part)
                .text("url", url.trim().to_string());
            self.client.post(&target).multipart(form)
        })
        .map_err(|err| ApiError::Transport(err.to_string()))?;
        let text = read_success_body(resp)?;
        Ok(decode(endpoint, &text)?)
    }

    pub fn video_job(&self, job_id: &str) -> Result<VideoJob> {
        let path = format!("/api/video/jobs/{}", job_id.trim());
        let url = self.url(&path);
        // Job status must never come from the cache.
        let resp = send_with_retry(&self.policy, || self.client.get(&url))
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let text = read_success_body(resp)?;
        Ok(decode(&path, &text)?)
    }

    pub fn health(&self) -> Result<HealthStatus> {
        let url = self.url("/health");
        let resp = send_with_retry(&RetryPolicy::none(), || self.client.get(&url))
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let text = read_success_body(resp)?;
        Ok(decode("/health", &text)?)
    }
}

fn read_success_body(resp: Response) -> std::result::Result<String, ApiError> {
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|err| ApiError::Transport(err.to_string()))?;
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail: extract_detail(&body),
        });
    }
    Ok(body)
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> std::result::Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::Decode {
        endpoint: endpoint.split('?').next().unwrap_or(endpoint).to_string(),
        message: err.to_string(),
    })
}

/// Recovers the typed API error from an `anyhow` chain, if there is one.
pub fn api_error(err: &anyhow::Error) -> Option<&ApiError> {
    err.downcast_ref::<ApiError>()
}

/// Text for the console: the backend's detail when present.
pub fn describe_error(err: &anyhow::Error) -> String {
    match api_error(err) {
        Some(api) => api.user_message(),
        None => format!("{err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_the_path_without_query() {
        let err = decode::<TeamsResponse>("/api/patterns/3?n_games=5", "not json")
            .expect_err("invalid json");
        match err {
            ApiError::Decode { endpoint, .. } => assert_eq!(endpoint, "/api/patterns/3"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn describe_prefers_backend_detail() {
        let err: anyhow::Error = ApiError::Status {
            status: 400,
            detail: Some("unsupported file type".to_string()),
        }
        .into();
        assert_eq!(describe_error(&err), "unsupported file type");
        assert_eq!(api_error(&err).and_then(ApiError::status), Some(400));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = crate::http_client::build_client(std::time::Duration::from_secs(1))
            .expect("client");
        let api = ScoutApi::with_client("http://host:8000/", client, RetryPolicy::none());
        assert_eq!(api.base_url(), "http://host:8000");
        assert_eq!(api.url("/health"), "http://host:8000/health");
    }
}
