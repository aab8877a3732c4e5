use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::Result;
use chrono::Utc;
use rayon::prelude::*;
use rusqlite::Connection;

use crate::api::{
    DEFAULT_N_TOP_SETPIECES, DEFAULT_N_TOP_VAEP, DEFAULT_PATTERN_GAMES, DEFAULT_PRE_MATCH_GAMES,
    Fetched, ScoutApi, describe_error,
};
use crate::config::ScoutConfig;
use crate::http_cache::now_secs;
use crate::models::{
    MatchResult, MatchesResponse, NetworkResponse, PatternsResponse, PhasesResponse,
    SetPiecesResponse, TeamAnalysis, TeamInfo, TeamStanding, VaepSummary,
};
use crate::report_export::{self, TeamReport};
use crate::report_store::{self, TeamSnapshot, VideoJobRecord};
use crate::state::{AnalysisSource, Delta, ProviderCommand, TeamBundle, TeamRequest};
use crate::team_analysis::build_team_analysis;
use crate::video::{self, VideoRequest};

pub const BUNDLE_N_PATTERNS: u32 = 5;
pub const BUNDLE_N_HUBS: u32 = 3;

/// Shared by every job the provider runs.
pub struct ProviderContext {
    pub api: ScoutApi,
    pub cfg: ScoutConfig,
    pool: Option<rayon::ThreadPool>,
    store: Option<Mutex<Connection>>,
}

impl ProviderContext {
    /// Opens the snapshot archive when possible; the provider works without it.
    pub fn new(cfg: ScoutConfig, tx: &Sender<Delta>) -> Result<Self> {
        let api = ScoutApi::new(&cfg)?;
        let store = match report_store::open_default_db() {
            Ok(conn) => Some(Mutex::new(conn)),
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Snapshot archive disabled: {err:#}")));
                None
            }
        };
        Ok(Self {
            pool: build_fetch_pool(cfg.fetch_parallelism),
            api,
            cfg,
            store,
        })
    }

    pub fn with_api(api: ScoutApi, cfg: ScoutConfig) -> Self {
        Self {
            pool: build_fetch_pool(cfg.fetch_parallelism),
            api,
            cfg,
            store: None,
        }
    }

    pub fn with_store(mut self, conn: Connection) -> Self {
        self.store = Some(Mutex::new(conn));
        self
    }

    fn with_store_conn<T>(&self, action: impl FnOnce(&Connection) -> Result<T>) -> Option<Result<T>> {
        let store = self.store.as_ref()?;
        let conn = store.lock().expect("snapshot store lock poisoned");
        Some(action(&conn))
    }
}

pub fn spawn_provider(cfg: ScoutConfig, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let ctx = match ProviderContext::new(cfg, &tx) {
            Ok(ctx) => Arc::new(ctx),
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[ALERT] Provider failed to start: {err:#}")));
                return;
            }
        };
        let _ = tx.send(Delta::Log(format!(
            "[INFO] Backend: {}",
            ctx.api.base_url()
        )));
        run_command(&ctx, ProviderCommand::FetchStandings, &tx);

        while let Ok(cmd) = cmd_rx.recv() {
            let job_ctx = ctx.clone();
            let job_tx = tx.clone();
            let job = move || run_command(&job_ctx, cmd, &job_tx);
            if let Some(pool) = ctx.pool.as_ref() {
                pool.spawn(job);
            } else {
                thread::spawn(job);
            }
        }
    });
}

/// Runs one command to completion, reporting through `tx`.
pub fn run_command(ctx: &ProviderContext, cmd: ProviderCommand, tx: &Sender<Delta>) {
    match cmd {
        ProviderCommand::FetchStandings => fetch_standings(ctx, tx),
        ProviderCommand::FetchTeamBundle { team_id } => fetch_team(ctx, team_id, tx),
        ProviderCommand::FetchReplay { team_id, phase_id } => {
            match ctx.api.phase_replay(team_id, phase_id, DEFAULT_PATTERN_GAMES) {
                Ok(resp) => {
                    warn_stale(tx, "replay", resp.stale);
                    let _ = tx.send(Delta::SetReplay {
                        team_id,
                        phase_id,
                        events: resp.data.events,
                    });
                }
                Err(err) => {
                    warn(tx, format!("Replay for phase {phase_id}"), &err);
                    let _ = tx.send(Delta::SetReplay {
                        team_id,
                        phase_id,
                        events: Vec::new(),
                    });
                }
            }
        }
        ProviderCommand::FetchPressing { team_id, player_id } => {
            match ctx.api.simulate_pressing(team_id, player_id, ctx.cfg.n_games) {
                Ok(resp) => {
                    warn_stale(tx, "pressing simulation", resp.stale);
                    let _ = tx.send(Delta::SetPressing {
                        team_id,
                        result: resp.data,
                    });
                }
                Err(err) => {
                    warn(tx, format!("Pressing simulation for player {player_id}"), &err);
                    request_failed(tx, team_id, TeamRequest::Pressing);
                }
            }
        }
        ProviderCommand::RunPreMatch {
            team_id,
            opponent_id,
        } => match ctx
            .api
            .pre_match_simulation(team_id, opponent_id, DEFAULT_PRE_MATCH_GAMES)
        {
            Ok(result) => {
                let _ = tx.send(Delta::SetPreMatch { team_id, result });
            }
            Err(err) => {
                warn(tx, "Pre-match simulation".to_string(), &err);
                request_failed(tx, team_id, TeamRequest::PreMatch);
            }
        },
        ProviderCommand::FetchChances { team_id, game_id } => {
            match ctx.api.match_chances(game_id) {
                Ok(resp) => {
                    warn_stale(tx, "chance analysis", resp.stale);
                    let _ = tx.send(Delta::SetChances {
                        team_id,
                        analysis: resp.data,
                    });
                }
                Err(err) => {
                    warn(tx, format!("Chance analysis for game {game_id}"), &err);
                    request_failed(tx, team_id, TeamRequest::Chances);
                }
            }
        }
        ProviderCommand::StartVideoJob { url } => start_video(ctx, &url, None, tx),
        ProviderCommand::UploadVideo { path, url } => start_video(ctx, &url, Some(&path), tx),
        ProviderCommand::PollVideoJob { job_id } => match ctx.api.video_job(&job_id) {
            Ok(job) => {
                let error = video::job_error(&job);
                if let Some(Err(err)) = ctx.with_store_conn(|conn| {
                    report_store::update_video_status(conn, &job.job_id, &job.status, error.as_deref())
                }) {
                    let _ = tx.send(Delta::Log(format!("[WARN] Video archive: {err:#}")));
                }
                let _ = tx.send(Delta::SetVideoJob(job));
            }
            Err(err) => {
                let _ = tx.send(Delta::VideoFailed(video::friendly_error(&describe_error(&err))));
            }
        },
        ProviderCommand::Export { team_id, path } => export_team(ctx, team_id, &path, tx),
    }
}

fn fetch_standings(ctx: &ProviderContext, tx: &Sender<Delta>) {
    match ctx.api.teams_overview() {
        Ok(resp) => {
            warn_stale(tx, "standings", resp.stale);
            let _ = tx.send(Delta::SetStandings {
                standings: resp.data.standings,
                stale: resp.stale,
            });
        }
        Err(err) => {
            warn(tx, "Standings".to_string(), &err);
            let _ = tx.send(Delta::SetStandings {
                standings: bare_team_list(ctx),
                stale: true,
            });
        }
    }
}

/// Team names without table stats, for when the overview endpoint is down.
fn bare_team_list(ctx: &ProviderContext) -> Vec<TeamStanding> {
    let Ok(resp) = ctx.api.teams() else {
        return Vec::new();
    };
    resp.data
        .teams
        .into_iter()
        .filter(|team| team.team_id != 0)
        .map(|team| TeamStanding {
            team_id: team.team_id,
            team_name: team.team_name,
            ..TeamStanding::default()
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BundlePart {
    Info,
    Patterns,
    Phases,
    SetPieces,
    Network,
    Matches,
}

const BUNDLE_PARTS: [BundlePart; 6] = [
    BundlePart::Info,
    BundlePart::Patterns,
    BundlePart::Phases,
    BundlePart::SetPieces,
    BundlePart::Network,
    BundlePart::Matches,
];

impl BundlePart {
    fn label(self) -> &'static str {
        match self {
            BundlePart::Info => "team info",
            BundlePart::Patterns => "patterns",
            BundlePart::Phases => "phases",
            BundlePart::SetPieces => "set pieces",
            BundlePart::Network => "network",
            BundlePart::Matches => "match list",
        }
    }
}

enum PartData {
    Info(Fetched<TeamInfo>),
    Patterns(Fetched<PatternsResponse>),
    Phases(Fetched<PhasesResponse>),
    SetPieces(Fetched<SetPiecesResponse>),
    Network(Fetched<NetworkResponse>),
    Matches(Fetched<MatchesResponse>),
}

impl PartData {
    fn stale(&self) -> bool {
        match self {
            PartData::Info(f) => f.stale,
            PartData::Patterns(f) => f.stale,
            PartData::Phases(f) => f.stale,
            PartData::SetPieces(f) => f.stale,
            PartData::Network(f) => f.stale,
            PartData::Matches(f) => f.stale,
        }
    }
}

/// Result of the parallel bundle fetch. Failed parts are listed in `errors`
/// and left empty in the bundle.
#[derive(Debug, Clone, Default)]
pub struct BundleFetch {
    pub bundle: TeamBundle,
    pub matches: Vec<MatchResult>,
    pub stale_parts: Vec<&'static str>,
    pub errors: Vec<String>,
}

impl BundleFetch {
    pub fn all_failed(&self) -> bool {
        self.errors.len() == BUNDLE_PARTS.len()
    }
}

pub fn fetch_bundle(ctx: &ProviderContext, team_id: u32) -> BundleFetch {
    let api = &ctx.api;
    let n_games = ctx.cfg.n_games;
    let results: Vec<(BundlePart, Result<PartData>)> = with_fetch_pool(&ctx.pool, || {
        BUNDLE_PARTS
            .par_iter()
            .map(|part| {
                let data = match part {
                    BundlePart::Info => api.team_info(team_id).map(PartData::Info),
                    BundlePart::Patterns => api
                        .team_patterns(team_id, n_games, BUNDLE_N_PATTERNS)
                        .map(PartData::Patterns),
                    BundlePart::Phases => api.team_phases(team_id, n_games).map(PartData::Phases),
                    BundlePart::SetPieces => api
                        .team_setpieces(team_id, n_games, DEFAULT_N_TOP_SETPIECES)
                        .map(PartData::SetPieces),
                    BundlePart::Network => api
                        .team_network(team_id, n_games, BUNDLE_N_HUBS)
                        .map(PartData::Network),
                    BundlePart::Matches => {
                        api.match_list(Some(team_id)).map(PartData::Matches)
                    }
                };
                (*part, data)
            })
            .collect()
    });

    let mut out = BundleFetch {
        bundle: TeamBundle::new(team_id),
        ..BundleFetch::default()
    };
    let bundle = &mut out.bundle;
    for (part, result) in results {
        let data = match result {
            Ok(data) => data,
            Err(err) => {
                out.errors
                    .push(format!("{}: {}", part.label(), describe_error(&err)));
                continue;
            }
        };
        if data.stale() {
            out.stale_parts.push(part.label());
        }
        match data {
            PartData::Info(f) => bundle.info = Some(f.data),
            PartData::Patterns(f) => {
                bundle.total_events = f.data.total_events;
                bundle.n_games_analyzed = bundle.n_games_analyzed.max(f.data.n_games_analyzed);
                bundle.patterns = f.data.patterns;
            }
            PartData::Phases(f) => bundle.phases = f.data.phases,
            PartData::SetPieces(f) => {
                bundle.setpiece_counts = f.data.setpiece_counts;
                bundle.setpieces = f.data.routines;
            }
            PartData::Network(f) => {
                bundle.network_stats = f.data.network_stats;
                bundle.hubs = f.data.hubs;
            }
            PartData::Matches(f) => out.matches = f.data.matches,
        }
    }
    bundle.stale = !out.stale_parts.is_empty();
    bundle.fetched_at = now_secs();
    out
}

/// Backend report when available, otherwise the client-side one.
pub fn resolve_analysis(
    ctx: &ProviderContext,
    bundle: &TeamBundle,
) -> (TeamAnalysis, AnalysisSource, Option<String>) {
    match ctx.api.team_analysis(bundle.team_id, ctx.cfg.n_games) {
        Ok(resp) => (resp.data, AnalysisSource::Backend, None),
        Err(err) => (
            build_team_analysis(bundle.team_id, &bundle.patterns, &bundle.setpieces, &bundle.hubs),
            AnalysisSource::Client,
            Some(describe_error(&err)),
        ),
    }
}

fn fetch_team(ctx: &ProviderContext, team_id: u32, tx: &Sender<Delta>) {
    let fetched = fetch_bundle(ctx, team_id);
    for err in &fetched.errors {
        let _ = tx.send(Delta::Log(format!("[WARN] Team {team_id} {err}")));
    }
    if !fetched.stale_parts.is_empty() {
        let _ = tx.send(Delta::Log(format!(
            "[WARN] Team {team_id}: backend unreachable, cached {}",
            fetched.stale_parts.join(", ")
        )));
    }
    if fetched.all_failed() {
        let _ = tx.send(Delta::BundleFailed {
            team_id,
            message: "Could not load team data".to_string(),
        });
        return;
    }

    let BundleFetch {
        bundle, matches, ..
    } = fetched;
    let _ = tx.send(Delta::SetTeamBundle {
        team_id,
        bundle: bundle.clone(),
    });
    let _ = tx.send(Delta::SetMatches { team_id, matches });

    let n_games = ctx.cfg.n_games;
    let ((analysis, source, analysis_err), (graph, vaep)) = rayon::join(
        || resolve_analysis(ctx, &bundle),
        || {
            rayon::join(
                || ctx.api.network_graph(team_id, n_games),
                || ctx.api.team_vaep(team_id, n_games, DEFAULT_N_TOP_VAEP),
            )
        },
    );

    if let Some(err) = analysis_err {
        let _ = tx.send(Delta::Log(format!(
            "[INFO] Team {team_id}: using local analysis ({err})"
        )));
    }
    archive_snapshot(ctx, team_id, &bundle, &analysis, tx);
    let _ = tx.send(Delta::SetTeamAnalysis {
        team_id,
        analysis,
        source,
    });

    match graph {
        Ok(resp) => {
            let _ = tx.send(Delta::SetNetworkGraph {
                team_id,
                graph: resp.data.graph,
            });
        }
        Err(err) => warn(tx, format!("Team {team_id} network graph"), &err),
    }
    match vaep {
        Ok(resp) => {
            let _ = tx.send(Delta::SetVaep {
                team_id,
                vaep: resp.data,
            });
        }
        Err(err) => warn(tx, format!("Team {team_id} VAEP"), &err),
    }
}

fn archive_snapshot(
    ctx: &ProviderContext,
    team_id: u32,
    bundle: &TeamBundle,
    analysis: &TeamAnalysis,
    tx: &Sender<Delta>,
) {
    if bundle.stale {
        return;
    }
    let name = bundle
        .info
        .as_ref()
        .map(|info| info.team_name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("Team {team_id}"));
    let snapshot = TeamSnapshot::from_bundle(&name, bundle, analysis);
    if let Some(Err(err)) = ctx.with_store_conn(|conn| report_store::upsert_snapshot(conn, &snapshot))
    {
        let _ = tx.send(Delta::Log(format!("[WARN] Snapshot archive: {err:#}")));
    }
}

fn start_video(ctx: &ProviderContext, url: &str, file: Option<&Path>, tx: &Sender<Delta>) {
    let request = match video::validate_request(url, file) {
        Ok(request) => request,
        Err(err) => {
            let _ = tx.send(Delta::VideoFailed(err.to_string()));
            return;
        }
    };
    let (result, source, sha256) = match &request {
        VideoRequest::Link(link) => (ctx.api.start_video_job(link), link.clone(), None),
        VideoRequest::Upload { path, url } => {
            let sha256 = match video::file_sha256(path) {
                Ok(hash) => Some(hash),
                Err(err) => {
                    let _ = tx.send(Delta::VideoFailed(format!("{err:#}")));
                    return;
                }
            };
            if let Some(hash) = sha256.as_deref()
                && let Some(Ok(Some(prev))) =
                    ctx.with_store_conn(|conn| report_store::find_video_by_sha(conn, hash))
            {
                let _ = tx.send(Delta::Log(format!(
                    "[INFO] Same file analysed before as job {} ({})",
                    prev.job_id, prev.status
                )));
            }
            (
                ctx.api.upload_video_job(path, url),
                path.display().to_string(),
                sha256,
            )
        }
    };

    match result {
        Ok(job) => {
            let record = VideoJobRecord {
                job_id: job.job_id.clone(),
                source,
                sha256,
                status: job.status.clone(),
                error: job.error.clone(),
                updated_at: Utc::now().to_rfc3339(),
            };
            if let Some(Err(err)) =
                ctx.with_store_conn(|conn| report_store::record_video_job(conn, &record))
            {
                let _ = tx.send(Delta::Log(format!("[WARN] Video archive: {err:#}")));
            }
            let _ = tx.send(Delta::Log(format!("[INFO] Video job {} queued", job.job_id)));
            let _ = tx.send(Delta::SetVideoJob(job));
        }
        Err(err) => {
            let _ = tx.send(Delta::VideoFailed(video::friendly_error(&describe_error(&err))));
        }
    }
}

/// Everything the workbook and the text report need for one team.
pub fn gather_team_report(ctx: &ProviderContext, team_id: u32) -> Result<TeamReport> {
    let standings: Vec<TeamStanding> = ctx
        .api
        .teams_overview()
        .map(|resp| resp.data.standings)
        .unwrap_or_default();
    let fetched = fetch_bundle(ctx, team_id);
    if fetched.all_failed() {
        anyhow::bail!("no data for team {team_id}: {}", fetched.errors.join("; "));
    }
    let (analysis, source, _) = resolve_analysis(ctx, &fetched.bundle);
    let vaep: Option<VaepSummary> = ctx
        .api
        .team_vaep(team_id, ctx.cfg.n_games, DEFAULT_N_TOP_VAEP)
        .ok()
        .map(|resp| resp.data);
    let pressing_targets = ctx
        .api
        .full_tactical_analysis(team_id, ctx.cfg.n_games)
        .map(|resp| resp.data.pressing_targets)
        .unwrap_or_default();
    let team_name = standings
        .iter()
        .find(|s| s.team_id == team_id)
        .map(|s| s.team_name.clone())
        .or_else(|| fetched.bundle.info.as_ref().map(|i| i.team_name.clone()))
        .unwrap_or_else(|| format!("Team {team_id}"));
    Ok(TeamReport {
        team_id,
        team_name,
        standings,
        bundle: fetched.bundle,
        matches: fetched.matches,
        analysis,
        analysis_source: source,
        vaep,
        pressing_targets,
        fetch_errors: fetched.errors,
    })
}

fn export_team(ctx: &ProviderContext, team_id: u32, path: &str, tx: &Sender<Delta>) {
    let _ = tx.send(Delta::ExportStarted {
        path: path.to_string(),
        total: report_export::SHEET_COUNT,
    });

    let report = match gather_team_report(ctx, team_id) {
        Ok(report) => report,
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Export failed: {err:#}")));
            let _ = tx.send(Delta::ExportFinished {
                path: path.to_string(),
                sheets: 0,
                rows: 0,
                errors: 1,
            });
            return;
        }
    };

    let progress_tx = tx.clone();
    let written = report_export::write_team_workbook(Path::new(path), &report, |progress| {
        let _ = progress_tx.send(Delta::ExportProgress {
            current: progress.current,
            total: progress.total,
            message: progress.message,
        });
    });

    match written {
        Ok(summary) => {
            let _ = tx.send(Delta::ExportFinished {
                path: path.to_string(),
                sheets: summary.sheets,
                rows: summary.rows,
                errors: report.fetch_errors.len(),
            });
        }
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Export failed: {err:#}")));
            let _ = tx.send(Delta::ExportFinished {
                path: path.to_string(),
                sheets: 0,
                rows: 0,
                errors: 1,
            });
        }
    }
}

fn warn(tx: &Sender<Delta>, what: String, err: &anyhow::Error) {
    let _ = tx.send(Delta::Log(format!("[WARN] {what}: {}", describe_error(err))));
}

fn request_failed(tx: &Sender<Delta>, team_id: u32, request: TeamRequest) {
    let _ = tx.send(Delta::RequestFailed { team_id, request });
}

fn warn_stale(tx: &Sender<Delta>, what: &str, stale: bool) {
    if stale {
        let _ = tx.send(Delta::Log(format!(
            "[WARN] Backend unreachable, showing cached {what}"
        )));
    }
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.clamp(2, 32))
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
