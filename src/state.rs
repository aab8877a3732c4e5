use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::models::{
    ChanceAnalysis, Hub, MatchResult, NetworkGraph, NetworkStats, Pattern, Phase,
    PreMatchResult, PressingResponse, ReplayEvent, SetPieceCounts, SetPieceRoutine,
    TeamAnalysis, TeamInfo, TeamStanding, VaepSummary, VideoJob,
};
use crate::replay::ReplayPlayer;
use crate::video;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Standings,
    Team,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamTab {
    Overview,
    Patterns,
    SetPieces,
    Network,
    Simulation,
    Matches,
    Video,
}

impl TeamTab {
    pub const ALL: [TeamTab; 7] = [
        TeamTab::Overview,
        TeamTab::Patterns,
        TeamTab::SetPieces,
        TeamTab::Network,
        TeamTab::Simulation,
        TeamTab::Matches,
        TeamTab::Video,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TeamTab::Overview => "Overview",
            TeamTab::Patterns => "Patterns",
            TeamTab::SetPieces => "Set pieces",
            TeamTab::Network => "Network",
            TeamTab::Simulation => "Simulation",
            TeamTab::Matches => "Matches",
            TeamTab::Video => "Video",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisSource {
    Backend,
    Client,
}

/// Everything fetched in one go when a team is opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamBundle {
    pub team_id: u32,
    pub info: Option<TeamInfo>,
    pub n_games_analyzed: u32,
    pub total_events: u64,
    pub patterns: Vec<Pattern>,
    pub phases: Vec<Phase>,
    pub setpiece_counts: SetPieceCounts,
    pub setpieces: Vec<SetPieceRoutine>,
    pub hubs: Vec<Hub>,
    pub network_stats: NetworkStats,
    pub fetched_at: Option<u64>,
    pub stale: bool,
}

impl TeamBundle {
    pub fn new(team_id: u32) -> Self {
        Self {
            team_id,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_none()
            && self.patterns.is_empty()
            && self.phases.is_empty()
            && self.setpieces.is_empty()
            && self.hubs.is_empty()
    }

    /// Takes every non-empty section of `newer`; empty sections keep what
    /// was already there.
    pub fn merge(&mut self, newer: TeamBundle) {
        if newer.info.is_some() {
            self.info = newer.info;
        }
        if !newer.patterns.is_empty() {
            self.patterns = newer.patterns;
            self.total_events = newer.total_events;
        }
        if !newer.phases.is_empty() {
            self.phases = newer.phases;
        }
        if !newer.setpieces.is_empty() {
            self.setpieces = newer.setpieces;
            self.setpiece_counts = newer.setpiece_counts;
        }
        if !newer.hubs.is_empty() {
            self.hubs = newer.hubs;
            self.network_stats = newer.network_stats;
        }
        if newer.n_games_analyzed > 0 {
            self.n_games_analyzed = newer.n_games_analyzed;
        }
        if newer.fetched_at.is_some() {
            self.fetched_at = newer.fetched_at;
        }
        self.stale = newer.stale;
    }
}

/// Per-team results that are not part of the bundle. Reset whenever another
/// team is opened.
#[derive(Debug, Clone, Default)]
pub struct TeamView {
    pub loading: bool,
    pub analysis: Option<TeamAnalysis>,
    pub analysis_source: Option<AnalysisSource>,
    pub graph: Option<NetworkGraph>,
    pub vaep: Option<VaepSummary>,
    pub pressing: Option<PressingResponse>,
    pub pressing_loading: bool,
    pub pre_match: Option<PreMatchResult>,
    pub pre_match_loading: bool,
    pub matches: Vec<MatchResult>,
    pub chances: Option<ChanceAnalysis>,
    pub chances_loading: bool,
    pub replay_phase: Option<u32>,
    pub replay_loading: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoField {
    Url,
    File,
}

#[derive(Debug, Clone, Default)]
pub struct VideoState {
    pub url_input: String,
    pub file_input: String,
    pub editing: Option<VideoField>,
    pub busy: bool,
    pub job: Option<VideoJob>,
    pub error: Option<String>,
    pub moment_selected: usize,
    pub seek: Option<f64>,
    pub next_poll: Option<Instant>,
    pub poll_stopped: bool,
}

impl VideoState {
    pub fn working(&self) -> bool {
        self.job.as_ref().is_some_and(video::should_poll)
    }

    /// Returns the job id when a poll is due and schedules the next one.
    pub fn poll_due(&mut self, now: Instant, interval: Duration) -> Option<String> {
        if !self.working() || self.poll_stopped {
            self.next_poll = None;
            return None;
        }
        match self.next_poll {
            Some(at) if at > now => None,
            _ => {
                self.next_poll = Some(now + interval);
                self.job.as_ref().map(|job| job.job_id.clone())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub tab: TeamTab,
    pub standings: Vec<TeamStanding>,
    pub standings_stale: bool,
    pub standings_loading: bool,
    pub selected: usize,
    pub team_id: Option<u32>,
    pub bundles: HashMap<u32, TeamBundle>,
    pub team: TeamView,
    pub pattern_selected: usize,
    pub phase_selected: usize,
    pub setpiece_selected: usize,
    pub hub_selected: usize,
    pub network_focus: Option<usize>,
    pub opponent_selected: usize,
    pub match_selected: usize,
    pub moment_selected: usize,
    pub replay: ReplayPlayer,
    pub video: VideoState,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export: ExportState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Standings,
            tab: TeamTab::Overview,
            standings: Vec::new(),
            standings_stale: false,
            standings_loading: true,
            selected: 0,
            team_id: None,
            bundles: HashMap::new(),
            team: TeamView::default(),
            pattern_selected: 0,
            phase_selected: 0,
            setpiece_selected: 0,
            hub_selected: 0,
            network_focus: None,
            opponent_selected: 0,
            match_selected: 0,
            moment_selected: 0,
            replay: ReplayPlayer::default(),
            video: VideoState::default(),
            logs: VecDeque::new(),
            help_overlay: false,
            export: ExportState::new(),
        }
    }

    pub fn maybe_clear_export(&mut self, now: Instant) {
        self.export.clear_if_done_for(now, 8);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn selected_standing(&self) -> Option<&TeamStanding> {
        self.standings.get(self.selected)
    }

    pub fn current_standing(&self) -> Option<&TeamStanding> {
        let team_id = self.team_id?;
        self.standings.iter().find(|s| s.team_id == team_id)
    }

    pub fn team_name(&self, team_id: u32) -> String {
        self.standings
            .iter()
            .find(|s| s.team_id == team_id)
            .map(|s| s.team_name.clone())
            .or_else(|| {
                self.bundles
                    .get(&team_id)
                    .and_then(|b| b.info.as_ref())
                    .map(|i| i.team_name.clone())
            })
            .unwrap_or_else(|| format!("Team {team_id}"))
    }

    pub fn current_bundle(&self) -> Option<&TeamBundle> {
        self.bundles.get(&self.team_id?)
    }

    pub fn select_next(&mut self) {
        self.selected = wrap_next(self.selected, self.standings.len());
    }

    pub fn select_prev(&mut self) {
        self.selected = wrap_prev(self.selected, self.standings.len());
    }

    pub fn clamp_selection(&mut self) {
        self.selected = clamp_index(self.selected, self.standings.len());
        let (patterns, phases, setpieces, hubs) = self
            .current_bundle()
            .map(|b| (b.patterns.len(), b.phases.len(), b.setpieces.len(), b.hubs.len()))
            .unwrap_or_default();
        self.pattern_selected = clamp_index(self.pattern_selected, patterns);
        self.phase_selected = clamp_index(self.phase_selected, phases);
        self.setpiece_selected = clamp_index(self.setpiece_selected, setpieces);
        self.hub_selected = clamp_index(self.hub_selected, hubs);
        let nodes = self.team.graph.as_ref().map(|g| g.nodes.len()).unwrap_or(0);
        self.network_focus = self.network_focus.filter(|i| *i < nodes);
        self.opponent_selected = clamp_index(self.opponent_selected, self.opponents().len());
        self.match_selected = clamp_index(self.match_selected, self.reviewable_matches().len());
        let moments = self.chance_moments().len();
        self.moment_selected = clamp_index(self.moment_selected, moments);
    }

    /// Opens the highlighted team. Returns its id when the bundle needs to be
    /// fetched.
    pub fn open_selected_team(&mut self) -> Option<u32> {
        let team_id = self.selected_standing()?.team_id;
        Some(self.open_team(team_id))
    }

    pub fn open_team(&mut self, team_id: u32) -> u32 {
        if self.team_id != Some(team_id) {
            self.team = TeamView::default();
            self.replay.load(Vec::new());
            self.pattern_selected = 0;
            self.phase_selected = 0;
            self.setpiece_selected = 0;
            self.hub_selected = 0;
            self.network_focus = None;
            self.opponent_selected = 0;
            self.match_selected = 0;
            self.moment_selected = 0;
        }
        self.team_id = Some(team_id);
        self.team.loading = true;
        self.screen = Screen::Team;
        if let Some(idx) = self.standings.iter().position(|s| s.team_id == team_id) {
            self.selected = idx;
        }
        team_id
    }

    pub fn back(&mut self) {
        self.replay.pause();
        self.screen = Screen::Standings;
    }

    pub fn cycle_tab(&mut self) {
        self.tab = self.tab.next();
    }

    pub fn cycle_tab_back(&mut self) {
        self.tab = self.tab.prev();
    }

    /// Moves the cursor of the list shown on the current tab.
    pub fn tab_select_next(&mut self) {
        self.tab_select(true);
    }

    pub fn tab_select_prev(&mut self) {
        self.tab_select(false);
    }

    fn tab_select(&mut self, forward: bool) {
        let step = |idx: usize, len: usize| {
            if forward {
                wrap_next(idx, len)
            } else {
                wrap_prev(idx, len)
            }
        };
        match self.tab {
            TeamTab::Overview => {}
            TeamTab::Patterns => {
                let len = self.bundle_len(|b| b.phases.len());
                self.phase_selected = step(self.phase_selected, len);
            }
            TeamTab::SetPieces => {
                let len = self.bundle_len(|b| b.setpieces.len());
                self.setpiece_selected = step(self.setpiece_selected, len);
            }
            TeamTab::Network => {
                let len = self.team.graph.as_ref().map(|g| g.nodes.len()).unwrap_or(0);
                if len == 0 {
                    self.network_focus = None;
                } else {
                    self.network_focus = Some(match self.network_focus {
                        None if forward => 0,
                        None => len - 1,
                        Some(idx) => step(idx, len),
                    });
                }
            }
            TeamTab::Simulation => {
                let len = self.bundle_len(|b| b.hubs.len());
                self.hub_selected = step(self.hub_selected, len);
            }
            TeamTab::Matches => {
                if self.team.chances.is_some() {
                    let len = self.chance_moments().len();
                    self.moment_selected = step(self.moment_selected, len);
                } else {
                    let len = self.reviewable_matches().len();
                    self.match_selected = step(self.match_selected, len);
                }
            }
            TeamTab::Video => {
                let len = self
                    .video
                    .job
                    .as_ref()
                    .and_then(|j| j.report.as_ref())
                    .map(|r| r.moments.len())
                    .unwrap_or(0);
                self.video.moment_selected = step(self.video.moment_selected, len);
            }
        }
    }

    fn bundle_len(&self, len: fn(&TeamBundle) -> usize) -> usize {
        self.current_bundle().map(len).unwrap_or(0)
    }

    pub fn cycle_opponent(&mut self) {
        self.opponent_selected = wrap_next(self.opponent_selected, self.opponents().len());
    }

    /// Every other team in the table, in table order.
    pub fn opponents(&self) -> Vec<&TeamStanding> {
        self.standings
            .iter()
            .filter(|s| Some(s.team_id) != self.team_id)
            .collect()
    }

    pub fn selected_opponent(&self) -> Option<&TeamStanding> {
        self.opponents().get(self.opponent_selected).copied()
    }

    pub fn reviewable_matches(&self) -> Vec<&MatchResult> {
        crate::match_review::missed_chance_matches(&self.team.matches, self.team_id)
    }

    pub fn selected_match(&self) -> Option<&MatchResult> {
        self.reviewable_matches().get(self.match_selected).copied()
    }

    /// Key moments of the opened team in the loaded chance analysis.
    pub fn chance_moments(&self) -> Vec<&crate::models::KeyMoment> {
        let (Some(analysis), Some(team_id)) = (self.team.chances.as_ref(), self.team_id) else {
            return Vec::new();
        };
        crate::match_review::chances_for(analysis, team_id)
            .map(|c| c.key_moments.iter().collect())
            .unwrap_or_default()
    }

    pub fn selected_phase(&self) -> Option<&Phase> {
        self.current_bundle()?.phases.get(self.phase_selected)
    }

    pub fn selected_hub(&self) -> Option<&Hub> {
        self.current_bundle()?.hubs.get(self.hub_selected)
    }

    pub fn focused_node_id(&self) -> Option<&str> {
        let graph = self.team.graph.as_ref()?;
        graph
            .nodes
            .get(self.network_focus?)
            .map(|node| node.id.as_str())
    }

    pub fn video_file_path(&self) -> Option<PathBuf> {
        let raw = self.video.file_input.trim();
        if raw.is_empty() {
            None
        } else {
            Some(PathBuf::from(raw))
        }
    }
}

pub fn wrap_next(idx: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (idx + 1) % len }
}

pub fn wrap_prev(idx: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else if idx == 0 || idx >= len {
        len - 1
    } else {
        idx - 1
    }
}

pub fn clamp_index(idx: usize, len: usize) -> usize {
    if len == 0 { 0 } else { idx.min(len - 1) }
}

#[derive(Debug, Clone)]
pub struct ExportState {
    pub active: bool,
    pub done: bool,
    pub path: Option<String>,
    pub current: usize,
    pub total: usize,
    pub message: String,
    pub error_count: usize,
    pub last_updated: Option<Instant>,
}

impl Default for ExportState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportState {
    pub fn new() -> Self {
        Self {
            active: false,
            done: false,
            path: None,
            current: 0,
            total: 0,
            message: String::new(),
            error_count: 0,
            last_updated: None,
        }
    }

    pub fn clear_if_done_for(&mut self, now: Instant, keep_secs: u64) {
        if !self.active || !self.done {
            return;
        }
        let Some(last) = self.last_updated else {
            return;
        };
        if now.duration_since(last).as_secs() >= keep_secs {
            *self = Self::new();
        }
    }
}

/// On-demand team requests that show a loading marker while in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamRequest {
    Pressing,
    PreMatch,
    Chances,
}

#[derive(Debug, Clone)]
pub enum Delta {
    Log(String),
    SetStandings {
        standings: Vec<TeamStanding>,
        stale: bool,
    },
    SetTeamBundle {
        team_id: u32,
        bundle: TeamBundle,
    },
    BundleFailed {
        team_id: u32,
        message: String,
    },
    SetTeamAnalysis {
        team_id: u32,
        analysis: TeamAnalysis,
        source: AnalysisSource,
    },
    SetNetworkGraph {
        team_id: u32,
        graph: NetworkGraph,
    },
    SetVaep {
        team_id: u32,
        vaep: VaepSummary,
    },
    SetReplay {
        team_id: u32,
        phase_id: u32,
        events: Vec<ReplayEvent>,
    },
    SetPressing {
        team_id: u32,
        result: PressingResponse,
    },
    SetPreMatch {
        team_id: u32,
        result: PreMatchResult,
    },
    SetMatches {
        team_id: u32,
        matches: Vec<MatchResult>,
    },
    SetChances {
        team_id: u32,
        analysis: ChanceAnalysis,
    },
    /// A pressing, pre-match or chance request ended without a result.
    RequestFailed {
        team_id: u32,
        request: TeamRequest,
    },
    SetVideoJob(VideoJob),
    VideoFailed(String),
    ExportStarted {
        path: String,
        total: usize,
    },
    ExportProgress {
        current: usize,
        total: usize,
        message: String,
    },
    ExportFinished {
        path: String,
        sheets: usize,
        rows: usize,
        errors: usize,
    },
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchStandings,
    FetchTeamBundle { team_id: u32 },
    FetchReplay { team_id: u32, phase_id: u32 },
    FetchPressing { team_id: u32, player_id: u64 },
    RunPreMatch { team_id: u32, opponent_id: u32 },
    FetchChances { team_id: u32, game_id: u64 },
    StartVideoJob { url: String },
    UploadVideo { path: PathBuf, url: String },
    PollVideoJob { job_id: String },
    Export { team_id: u32, path: String },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Log(msg) => state.push_log(msg),
        Delta::SetStandings { standings, stale } => {
            state.standings_loading = false;
            // A bare team list never replaces a table that has stats.
            let bare = standings.iter().all(|s| s.played == 0);
            if (standings.is_empty() || bare && stale) && !state.standings.is_empty() {
                return;
            }
            let keep_id = state.selected_standing().map(|s| s.team_id);
            state.standings = standings;
            state.standings.sort_by_key(|s| (s.rank == 0, s.rank));
            state.standings_stale = stale;
            if let Some(id) = keep_id
                && let Some(idx) = state.standings.iter().position(|s| s.team_id == id)
            {
                state.selected = idx;
            }
            state.clamp_selection();
        }
        Delta::SetTeamBundle { team_id, bundle } => {
            let entry = state
                .bundles
                .entry(team_id)
                .or_insert_with(|| TeamBundle::new(team_id));
            entry.merge(bundle);
            if state.team_id == Some(team_id) {
                state.team.loading = false;
                state.clamp_selection();
            }
        }
        Delta::BundleFailed { team_id, message } => {
            if state.team_id == Some(team_id) {
                state.team.loading = false;
                state.team.last_error = Some(message.clone());
            }
            state.push_log(format!("[WARN] Team {team_id}: {message}"));
        }
        Delta::SetTeamAnalysis {
            team_id,
            analysis,
            source,
        } => {
            if state.team_id != Some(team_id) {
                return;
            }
            // A backend report always beats the client fallback.
            if source == AnalysisSource::Client
                && state.team.analysis_source == Some(AnalysisSource::Backend)
            {
                return;
            }
            state.team.analysis = Some(analysis);
            state.team.analysis_source = Some(source);
        }
        Delta::SetNetworkGraph { team_id, graph } => {
            if state.team_id != Some(team_id) {
                return;
            }
            if graph.nodes.is_empty() && state.team.graph.is_some() {
                return;
            }
            state.team.graph = Some(graph);
            state.clamp_selection();
        }
        Delta::SetVaep { team_id, vaep } => {
            if state.team_id != Some(team_id) {
                return;
            }
            if vaep.top_players.is_empty() && state.team.vaep.is_some() {
                return;
            }
            state.team.vaep = Some(vaep);
        }
        Delta::SetReplay {
            team_id,
            phase_id,
            events,
        } => {
            if state.team_id != Some(team_id) {
                return;
            }
            state.team.replay_loading = false;
            if events.is_empty() {
                state.push_log(format!("[INFO] Phase {phase_id} has no replayable events"));
                return;
            }
            state.team.replay_phase = Some(phase_id);
            state.replay.load(events);
            state.replay.toggle();
        }
        Delta::SetPressing { team_id, result } => {
            if state.team_id != Some(team_id) {
                return;
            }
            state.team.pressing_loading = false;
            state.team.pressing = Some(result);
        }
        Delta::SetPreMatch { team_id, result } => {
            if state.team_id != Some(team_id) {
                return;
            }
            state.team.pre_match_loading = false;
            state.team.pre_match = Some(result);
        }
        Delta::SetMatches { team_id, matches } => {
            if state.team_id != Some(team_id) {
                return;
            }
            if matches.is_empty() && !state.team.matches.is_empty() {
                return;
            }
            state.team.matches = matches;
            state.clamp_selection();
        }
        Delta::SetChances { team_id, analysis } => {
            if state.team_id != Some(team_id) {
                return;
            }
            state.team.chances_loading = false;
            state.team.chances = Some(analysis);
            state.moment_selected = 0;
        }
        Delta::RequestFailed { team_id, request } => {
            if state.team_id != Some(team_id) {
                return;
            }
            match request {
                TeamRequest::Pressing => state.team.pressing_loading = false,
                TeamRequest::PreMatch => state.team.pre_match_loading = false,
                TeamRequest::Chances => state.team.chances_loading = false,
            }
        }
        Delta::SetVideoJob(job) => {
            state.video.busy = false;
            let same_job = state
                .video
                .job
                .as_ref()
                .is_some_and(|current| current.job_id == job.job_id);
            if !same_job {
                state.video.moment_selected = 0;
                state.video.seek = None;
                state.video.next_poll = None;
                state.video.poll_stopped = false;
            }
            let failure = video::job_error(&job);
            if let Some(err) = &failure {
                state.push_log(format!("[WARN] Video job {}: {err}", job.job_id));
            }
            state.video.error = failure;
            state.video.job = Some(job);
        }
        Delta::VideoFailed(message) => {
            state.video.busy = false;
            state.video.next_poll = None;
            state.video.poll_stopped = true;
            state.push_log(format!("[WARN] Video: {message}"));
            state.video.error = Some(message);
        }
        Delta::ExportStarted { path, total } => {
            state.export.active = true;
            state.export.path = Some(path);
            state.export.total = total;
            state.export.current = 0;
            state.export.message = "Starting export".to_string();
            state.export.done = false;
            state.export.error_count = 0;
            state.export.last_updated = Some(Instant::now());
        }
        Delta::ExportProgress {
            current,
            total,
            message,
        } => {
            state.export.active = true;
            state.export.total = total;
            state.export.current = current;
            state.export.message = message;
            state.export.last_updated = Some(Instant::now());
        }
        Delta::ExportFinished {
            path,
            sheets,
            rows,
            errors,
        } => {
            state.export.active = true;
            state.export.path = Some(path.clone());
            state.export.current = state.export.total;
            state.export.message = format!("Done: {sheets} sheets, {rows} rows ({errors} errors)");
            state.export.done = true;
            state.export.error_count = errors;
            state.export.last_updated = Some(Instant::now());
            state.push_log(format!("[INFO] Export written to {path} ({errors} errors)"));
        }
    }
}
