//! Response shapes of the Matchday Scout backend.
//!
//! The backend is a pandas pipeline, so any numeric field can arrive as
//! `null`, a string or a float where an int was expected. Every field here
//! deserializes leniently and falls back to its default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "text")]
    pub team_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamsResponse {
    #[serde(deserialize_with = "list")]
    pub teams: Vec<Team>,
    #[serde(deserialize_with = "int")]
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamStanding {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "text")]
    pub team_name: String,
    #[serde(deserialize_with = "int")]
    pub rank: u32,
    #[serde(deserialize_with = "int")]
    pub played: u32,
    #[serde(deserialize_with = "int")]
    pub wins: u32,
    #[serde(deserialize_with = "int")]
    pub draws: u32,
    #[serde(deserialize_with = "int")]
    pub losses: u32,
    #[serde(deserialize_with = "int")]
    pub goals_for: i32,
    #[serde(deserialize_with = "int")]
    pub goals_against: i32,
    #[serde(deserialize_with = "int")]
    pub goal_diff: i32,
    #[serde(deserialize_with = "int")]
    pub points: u32,
    #[serde(deserialize_with = "list")]
    pub form: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandingsResponse {
    #[serde(deserialize_with = "list")]
    pub standings: Vec<TeamStanding>,
    #[serde(deserialize_with = "int")]
    pub total_teams: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentMatch {
    #[serde(deserialize_with = "int")]
    pub game_id: u64,
    #[serde(deserialize_with = "text")]
    pub date: String,
    #[serde(deserialize_with = "text")]
    pub opponent: String,
    #[serde(deserialize_with = "text")]
    pub venue: String,
    #[serde(deserialize_with = "text")]
    pub score: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamInfo {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "text")]
    pub team_name: String,
    #[serde(deserialize_with = "int")]
    pub total_matches: u32,
    #[serde(deserialize_with = "list")]
    pub recent_matches: Vec<RecentMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pattern {
    #[serde(deserialize_with = "int")]
    pub cluster_id: i64,
    #[serde(deserialize_with = "int")]
    pub frequency: u32,
    #[serde(deserialize_with = "num")]
    pub shot_conversion_rate: f64,
    #[serde(deserialize_with = "num")]
    pub avg_duration: f64,
    #[serde(deserialize_with = "num")]
    pub avg_passes: f64,
    #[serde(deserialize_with = "num")]
    pub avg_forward_progress: f64,
    #[serde(deserialize_with = "text")]
    pub avg_start_zone: String,
    #[serde(deserialize_with = "text")]
    pub avg_end_zone: String,
    #[serde(deserialize_with = "list")]
    pub common_sequences: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsResponse {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub n_games_analyzed: u32,
    #[serde(deserialize_with = "int")]
    pub total_events: u64,
    #[serde(deserialize_with = "list")]
    pub patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase {
    #[serde(deserialize_with = "int")]
    pub phase_id: u32,
    #[serde(deserialize_with = "int")]
    pub length: u32,
    #[serde(deserialize_with = "num")]
    pub duration: f64,
    #[serde(deserialize_with = "flag")]
    pub has_shot: bool,
    #[serde(deserialize_with = "int")]
    pub passes: u32,
    #[serde(deserialize_with = "text")]
    pub start_zone: String,
    #[serde(deserialize_with = "text")]
    pub event_sequence: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasesResponse {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub n_games_analyzed: u32,
    #[serde(deserialize_with = "int")]
    pub total_phases: u32,
    #[serde(deserialize_with = "list")]
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoredItem {
    #[serde(deserialize_with = "text")]
    pub category: String,
    #[serde(deserialize_with = "text")]
    pub title: String,
    #[serde(deserialize_with = "text")]
    pub description: String,
    #[serde(deserialize_with = "int")]
    pub score: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamAnalysis {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub overall_score: i32,
    #[serde(deserialize_with = "list")]
    pub strengths: Vec<ScoredItem>,
    #[serde(deserialize_with = "list")]
    pub weaknesses: Vec<ScoredItem>,
    #[serde(deserialize_with = "list")]
    pub insights: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaepPlayer {
    #[serde(deserialize_with = "int")]
    pub player_id: u64,
    #[serde(deserialize_with = "text")]
    pub player_name: String,
    #[serde(deserialize_with = "text")]
    pub position: String,
    #[serde(deserialize_with = "num")]
    pub total_vaep: f64,
    #[serde(deserialize_with = "num")]
    pub avg_vaep: f64,
    #[serde(deserialize_with = "int")]
    pub actions: u32,
    #[serde(deserialize_with = "num")]
    pub offensive_vaep: f64,
    #[serde(deserialize_with = "num")]
    pub defensive_vaep: f64,
    #[serde(deserialize_with = "num")]
    pub passing_vaep: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaepSummary {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub n_games_analyzed: u32,
    #[serde(deserialize_with = "num")]
    pub team_total_vaep: f64,
    #[serde(deserialize_with = "list")]
    pub top_players: Vec<VaepPlayer>,
    #[serde(deserialize_with = "list")]
    pub top_offensive: Vec<VaepPlayer>,
    #[serde(deserialize_with = "list")]
    pub top_defensive: Vec<VaepPlayer>,
    #[serde(deserialize_with = "text")]
    pub methodology: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayEvent {
    #[serde(deserialize_with = "num")]
    pub time: f64,
    #[serde(rename = "type", deserialize_with = "text")]
    pub kind: String,
    #[serde(deserialize_with = "text")]
    pub player: String,
    #[serde(deserialize_with = "text")]
    pub player_id: String,
    #[serde(deserialize_with = "text")]
    pub position: String,
    #[serde(deserialize_with = "num")]
    pub start_x: f64,
    #[serde(deserialize_with = "num")]
    pub start_y: f64,
    #[serde(deserialize_with = "num")]
    pub end_x: f64,
    #[serde(deserialize_with = "num")]
    pub end_y: f64,
    #[serde(deserialize_with = "text")]
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayResponse {
    #[serde(deserialize_with = "int")]
    pub phase_id: u32,
    #[serde(deserialize_with = "list")]
    pub events: Vec<ReplayEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetPieceRoutine {
    #[serde(rename = "type", deserialize_with = "text")]
    pub kind: String,
    #[serde(deserialize_with = "int")]
    pub cluster_id: i64,
    #[serde(deserialize_with = "int")]
    pub frequency: u32,
    #[serde(deserialize_with = "num")]
    pub shot_rate: f64,
    #[serde(deserialize_with = "text")]
    pub primary_zone: String,
    #[serde(deserialize_with = "text")]
    pub swing_type: String,
    #[serde(deserialize_with = "opt_num")]
    pub avg_target_x: Option<f64>,
    #[serde(deserialize_with = "opt_num")]
    pub avg_target_y: Option<f64>,
    #[serde(deserialize_with = "text")]
    pub defense_suggestion: String,
}

impl SetPieceRoutine {
    pub fn is_corner(&self) -> bool {
        self.kind.contains("Corner")
    }

    pub fn is_freekick(&self) -> bool {
        self.kind.contains("Freekick")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetPieceCounts {
    #[serde(deserialize_with = "int")]
    pub corners: u32,
    #[serde(deserialize_with = "int")]
    pub freekicks: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetPiecesResponse {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub n_games_analyzed: u32,
    #[serde(deserialize_with = "or_default")]
    pub setpiece_counts: SetPieceCounts,
    #[serde(deserialize_with = "list")]
    pub routines: Vec<SetPieceRoutine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    PassesTo,
    ReceivesFrom,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    #[serde(rename = "type", deserialize_with = "or_default")]
    pub kind: ConnectionKind,
    #[serde(deserialize_with = "text")]
    pub player_name: String,
    #[serde(deserialize_with = "text")]
    pub position: String,
    #[serde(deserialize_with = "int")]
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisruptionImpact {
    #[serde(deserialize_with = "num")]
    pub impact_score: f64,
    #[serde(deserialize_with = "int")]
    pub edges_removed: u32,
    #[serde(deserialize_with = "int")]
    pub component_change: i32,
    #[serde(deserialize_with = "text")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hub {
    #[serde(deserialize_with = "int")]
    pub player_id: u64,
    #[serde(deserialize_with = "text")]
    pub player_name: String,
    #[serde(deserialize_with = "text")]
    pub position: String,
    #[serde(deserialize_with = "text")]
    pub main_position: String,
    #[serde(deserialize_with = "num")]
    pub hub_score: f64,
    #[serde(deserialize_with = "num")]
    pub betweenness: f64,
    #[serde(deserialize_with = "num")]
    pub pagerank: f64,
    #[serde(deserialize_with = "int")]
    pub passes_received: u32,
    #[serde(deserialize_with = "int")]
    pub passes_made: u32,
    #[serde(deserialize_with = "list")]
    pub key_connections: Vec<Connection>,
    #[serde(deserialize_with = "or_default")]
    pub disruption_impact: DisruptionImpact,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkStats {
    #[serde(deserialize_with = "int")]
    pub nodes: u32,
    #[serde(deserialize_with = "int")]
    pub edges: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkResponse {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub n_games_analyzed: u32,
    #[serde(deserialize_with = "list")]
    pub hubs: Vec<Hub>,
    #[serde(deserialize_with = "or_default")]
    pub network_stats: NetworkStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkNode {
    #[serde(deserialize_with = "text")]
    pub id: String,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub position: String,
    #[serde(deserialize_with = "num")]
    pub hub_score: f64,
    #[serde(deserialize_with = "int")]
    pub passes_total: u32,
    #[serde(deserialize_with = "opt_num")]
    pub avg_x: Option<f64>,
    #[serde(deserialize_with = "opt_num")]
    pub avg_y: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkEdge {
    #[serde(deserialize_with = "text")]
    pub source: String,
    #[serde(deserialize_with = "text")]
    pub target: String,
    #[serde(deserialize_with = "num")]
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkGraph {
    #[serde(deserialize_with = "list")]
    pub nodes: Vec<NetworkNode>,
    #[serde(deserialize_with = "list")]
    pub edges: Vec<NetworkEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkGraphResponse {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub n_games_analyzed: u32,
    #[serde(deserialize_with = "or_default")]
    pub graph: NetworkGraph,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubDetail {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub player_id: u64,
    #[serde(deserialize_with = "text")]
    pub player_name: String,
    #[serde(deserialize_with = "text")]
    pub position: String,
    pub stats: Value,
    #[serde(deserialize_with = "list")]
    pub key_connections: Vec<Connection>,
    #[serde(deserialize_with = "or_default")]
    pub disruption_impact: DisruptionImpact,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainStep {
    #[serde(deserialize_with = "text")]
    pub action: String,
    #[serde(deserialize_with = "text")]
    pub expected_result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilityChain {
    pub step1: ChainStep,
    pub step2: ChainStep,
    pub step3: ChainStep,
}

impl VulnerabilityChain {
    pub fn steps(&self) -> [&ChainStep; 3] {
        [&self.step1, &self.step2, &self.step3]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "num")]
    pub pass_success_rate: f64,
    #[serde(deserialize_with = "num")]
    pub pass_failure_rate: f64,
    #[serde(deserialize_with = "text")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressingSimulation {
    #[serde(deserialize_with = "int")]
    pub player_id: u64,
    #[serde(deserialize_with = "int")]
    pub total_passes: u32,
    #[serde(deserialize_with = "or_default")]
    pub scenario_a: Scenario,
    #[serde(deserialize_with = "or_default")]
    pub scenario_b: Scenario,
    #[serde(deserialize_with = "num_map")]
    pub on_failure_followups: BTreeMap<String, f64>,
    #[serde(deserialize_with = "text")]
    pub recommendation: String,
}

impl PressingSimulation {
    /// Percentage-point change in pass success when the target is pressed.
    pub fn success_drop_pp(&self) -> f64 {
        (self.scenario_a.pass_success_rate - self.scenario_b.pass_success_rate) * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilityReport {
    #[serde(deserialize_with = "int")]
    pub player_id: u64,
    #[serde(deserialize_with = "or_default")]
    pub vulnerability_chain: VulnerabilityChain,
    #[serde(deserialize_with = "text")]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressingResponse {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub target_player_id: u64,
    #[serde(deserialize_with = "int")]
    pub n_games_analyzed: u32,
    #[serde(deserialize_with = "or_default")]
    pub pressing_simulation: PressingSimulation,
    #[serde(deserialize_with = "or_default")]
    pub vulnerability_chain: VulnerabilityReport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressingTarget {
    #[serde(deserialize_with = "or_default")]
    pub hub: Hub,
    #[serde(deserialize_with = "or_default")]
    pub pressing_simulation: PressingSimulation,
    #[serde(deserialize_with = "or_default")]
    pub vulnerability_chain: VulnerabilityChain,
    #[serde(deserialize_with = "text")]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullTacticalAnalysis {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "int")]
    pub n_games_analyzed: u32,
    #[serde(deserialize_with = "list")]
    pub pressing_targets: Vec<PressingTarget>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prediction {
    #[serde(deserialize_with = "num")]
    pub win: f64,
    #[serde(deserialize_with = "num")]
    pub draw: f64,
    #[serde(deserialize_with = "num")]
    pub lose: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticalSuggestion {
    #[serde(deserialize_with = "int")]
    pub priority: u32,
    #[serde(deserialize_with = "text")]
    pub tactic: String,
    #[serde(deserialize_with = "text")]
    pub reason: String,
    #[serde(deserialize_with = "text")]
    pub expected_effect: String,
    #[serde(deserialize_with = "text")]
    pub win_prob_change: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimScenario {
    #[serde(deserialize_with = "text")]
    pub scenario: String,
    #[serde(deserialize_with = "text")]
    pub description: String,
    #[serde(deserialize_with = "or_default")]
    pub before: Prediction,
    #[serde(deserialize_with = "or_default")]
    pub after: Prediction,
    #[serde(deserialize_with = "num")]
    pub win_change: f64,
    #[serde(deserialize_with = "text")]
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreMatchResult {
    #[serde(deserialize_with = "int")]
    pub our_team_id: u32,
    #[serde(deserialize_with = "int")]
    pub opponent_id: u32,
    #[serde(deserialize_with = "or_default")]
    pub base_prediction: Prediction,
    #[serde(deserialize_with = "or_default")]
    pub optimal_prediction: Prediction,
    #[serde(deserialize_with = "num")]
    pub win_improvement: f64,
    #[serde(deserialize_with = "list")]
    pub tactical_suggestions: Vec<TacticalSuggestion>,
    #[serde(deserialize_with = "list")]
    pub scenarios: Vec<SimScenario>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreMatchRequest {
    pub our_team_id: u32,
    pub opponent_id: u32,
    pub n_games: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    HomeWin,
    AwayWin,
    Draw,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchResult {
    #[serde(deserialize_with = "int")]
    pub game_id: u64,
    #[serde(deserialize_with = "text")]
    pub date: String,
    #[serde(deserialize_with = "text")]
    pub home_team: String,
    #[serde(deserialize_with = "text")]
    pub away_team: String,
    #[serde(deserialize_with = "int")]
    pub home_team_id: u32,
    #[serde(deserialize_with = "int")]
    pub away_team_id: u32,
    #[serde(deserialize_with = "text")]
    pub score: String,
    #[serde(deserialize_with = "or_default")]
    pub result: MatchOutcome,
    #[serde(deserialize_with = "text")]
    pub result_text: String,
    #[serde(deserialize_with = "text")]
    pub venue: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchesResponse {
    #[serde(deserialize_with = "list")]
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchPoint {
    #[serde(deserialize_with = "opt_num")]
    pub x: Option<f64>,
    #[serde(deserialize_with = "opt_num")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginalSituation {
    #[serde(deserialize_with = "text")]
    pub description: String,
    #[serde(deserialize_with = "or_default")]
    pub position: PitchPoint,
    #[serde(deserialize_with = "num")]
    pub distance_to_goal: f64,
    #[serde(deserialize_with = "text")]
    pub zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureAnalysis {
    #[serde(deserialize_with = "list")]
    pub reasons: Vec<String>,
    #[serde(deserialize_with = "num")]
    pub xg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Suggestion {
    #[serde(rename = "type", deserialize_with = "text")]
    pub kind: String,
    #[serde(deserialize_with = "opt_num")]
    pub target_x: Option<f64>,
    #[serde(deserialize_with = "opt_num")]
    pub target_y: Option<f64>,
    pub target_position: Option<PitchPoint>,
    #[serde(deserialize_with = "text")]
    pub description: String,
    #[serde(deserialize_with = "list")]
    pub reasons: Vec<String>,
    #[serde(deserialize_with = "opt_num")]
    pub expected_xg: Option<f64>,
    #[serde(deserialize_with = "opt_text")]
    pub xg_improvement: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayStep {
    #[serde(deserialize_with = "num")]
    pub time: f64,
    #[serde(deserialize_with = "text")]
    pub player: String,
    #[serde(deserialize_with = "text")]
    pub position: String,
    #[serde(deserialize_with = "text")]
    pub action: String,
    #[serde(deserialize_with = "text")]
    pub result: String,
    #[serde(deserialize_with = "num")]
    pub start_x: f64,
    #[serde(deserialize_with = "num")]
    pub start_y: f64,
    #[serde(deserialize_with = "num")]
    pub end_x: f64,
    #[serde(deserialize_with = "num")]
    pub end_y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupPlay {
    #[serde(deserialize_with = "text")]
    pub player: String,
    #[serde(deserialize_with = "text")]
    pub action: String,
    #[serde(deserialize_with = "opt_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "num")]
    pub from_x: f64,
    #[serde(deserialize_with = "num")]
    pub from_y: f64,
    #[serde(deserialize_with = "num")]
    pub to_x: f64,
    #[serde(deserialize_with = "num")]
    pub to_y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMoment {
    #[serde(deserialize_with = "num")]
    pub time: f64,
    #[serde(deserialize_with = "opt_text")]
    pub time_display: Option<String>,
    #[serde(deserialize_with = "int")]
    pub period: u32,
    #[serde(deserialize_with = "text")]
    pub player: String,
    #[serde(deserialize_with = "opt_text")]
    pub player_position: Option<String>,
    #[serde(deserialize_with = "text")]
    pub action: String,
    #[serde(deserialize_with = "text")]
    pub result: String,
    #[serde(deserialize_with = "or_default")]
    pub position: PitchPoint,
    pub original_situation: Option<OriginalSituation>,
    pub failure_analysis: Option<FailureAnalysis>,
    #[serde(deserialize_with = "or_default")]
    pub suggestion: Suggestion,
    #[serde(deserialize_with = "list")]
    pub play_sequence: Vec<PlayStep>,
    pub setup_play: Option<SetupPlay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreLine {
    #[serde(deserialize_with = "int")]
    pub id: u32,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "int")]
    pub score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamChances {
    #[serde(deserialize_with = "int")]
    pub team_id: u32,
    #[serde(deserialize_with = "text")]
    pub team_name: String,
    #[serde(deserialize_with = "list")]
    pub key_moments: Vec<KeyMoment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChanceAnalysis {
    #[serde(deserialize_with = "int")]
    pub game_id: u64,
    #[serde(deserialize_with = "text")]
    pub date: String,
    #[serde(deserialize_with = "or_default")]
    pub home_team: ScoreLine,
    #[serde(deserialize_with = "or_default")]
    pub away_team: ScoreLine,
    #[serde(deserialize_with = "text")]
    pub result: String,
    #[serde(deserialize_with = "text")]
    pub score: String,
    #[serde(deserialize_with = "text")]
    pub summary: String,
    #[serde(deserialize_with = "list")]
    pub chances: Vec<TeamChances>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoClip {
    #[serde(deserialize_with = "text")]
    pub url: String,
    #[serde(deserialize_with = "text")]
    pub video_id: String,
    #[serde(deserialize_with = "num")]
    pub start: f64,
    #[serde(deserialize_with = "opt_num")]
    pub fps: Option<f64>,
    #[serde(deserialize_with = "opt_num")]
    pub width: Option<f64>,
    #[serde(deserialize_with = "opt_num")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coord {
    #[serde(deserialize_with = "num")]
    pub x: f64,
    #[serde(deserialize_with = "num")]
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMoment {
    #[serde(deserialize_with = "num")]
    pub ts: f64,
    #[serde(deserialize_with = "text")]
    pub label: String,
    #[serde(deserialize_with = "or_default")]
    pub actual: Coord,
    #[serde(deserialize_with = "or_default")]
    pub suggest: Coord,
    #[serde(deserialize_with = "num")]
    pub delta: f64,
    #[serde(deserialize_with = "text")]
    pub note: String,
    #[serde(deserialize_with = "num")]
    pub conf: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoReport {
    #[serde(deserialize_with = "text")]
    pub job_id: String,
    #[serde(deserialize_with = "text")]
    pub status: String,
    #[serde(deserialize_with = "or_default")]
    pub clip: VideoClip,
    #[serde(deserialize_with = "list")]
    pub moments: Vec<VideoMoment>,
    #[serde(deserialize_with = "list")]
    pub notes: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoJob {
    #[serde(deserialize_with = "text")]
    pub job_id: String,
    #[serde(deserialize_with = "text")]
    pub status: String,
    #[serde(deserialize_with = "opt_num")]
    pub created: Option<f64>,
    #[serde(deserialize_with = "opt_num")]
    pub updated: Option<f64>,
    pub report: Option<VideoReport>,
    #[serde(deserialize_with = "opt_text")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoJobRequest {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    #[serde(deserialize_with = "text")]
    pub status: String,
}

fn num<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value).unwrap_or(0.0))
}

fn opt_num<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

fn int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: TryFrom<i64> + Default,
{
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    Ok(raw.and_then(|v| T::try_from(v).ok()).unwrap_or_default())
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let rendered = value_to_text(&value);
    Ok(if rendered.is_empty() { None } else { Some(rendered) })
}

fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

fn num_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .map(|(key, val)| (key, value_to_f64(&val).unwrap_or(0.0)))
        .collect())
}

/// `null` becomes the field's default; anything else decodes as usual.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

fn value_to_f64(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|f| f.is_finite())
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if matches!(
                trimmed.to_ascii_lowercase().as_str(),
                "nan" | "none" | "null"
            ) {
                String::new()
            } else {
                s.clone()
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_tolerate_nulls_strings_and_floats() {
        let raw = r#"{
            "cluster_id": "3",
            "frequency": 41.0,
            "shot_conversion_rate": null,
            "avg_duration": "12.5",
            "avg_start_zone": "NaN",
            "common_sequences": null
        }"#;
        let pattern: Pattern = serde_json::from_str(raw).expect("lenient pattern");
        assert_eq!(pattern.cluster_id, 3);
        assert_eq!(pattern.frequency, 41);
        assert_eq!(pattern.shot_conversion_rate, 0.0);
        assert_eq!(pattern.avg_duration, 12.5);
        assert!(pattern.avg_start_zone.is_empty());
        assert!(pattern.common_sequences.is_empty());
    }

    #[test]
    fn unknown_enum_values_fall_back() {
        let conn: Connection =
            serde_json::from_str(r#"{"type":"sideways","player_name":"A","count":2}"#)
                .expect("connection");
        assert_eq!(conn.kind, ConnectionKind::Unknown);

        let m: MatchResult =
            serde_json::from_str(r#"{"game_id":1,"result":"abandoned"}"#).expect("match");
        assert_eq!(m.result, MatchOutcome::Unknown);
    }

    #[test]
    fn negative_int_for_unsigned_field_defaults() {
        let team: Team = serde_json::from_str(r#"{"team_id":-1,"team_name":7}"#).expect("team");
        assert_eq!(team.team_id, 0);
        assert_eq!(team.team_name, "7");
    }
}
