use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::http_cache::now_secs;
use crate::models::{
    ChainStep, ChanceAnalysis, Connection, ConnectionKind, Coord, DisruptionImpact,
    FailureAnalysis, Hub, KeyMoment, MatchOutcome, MatchResult, NetworkEdge, NetworkGraph,
    NetworkNode, NetworkStats, OriginalSituation, Pattern, Phase, PitchPoint, Prediction,
    PreMatchResult, PressingResponse, PressingSimulation, ReplayEvent, Scenario, ScoreLine,
    SetPieceCounts, SetPieceRoutine, SimScenario, Suggestion, TacticalSuggestion, TeamChances,
    TeamInfo, TeamStanding, VaepPlayer, VaepSummary, VideoClip, VideoJob, VideoMoment,
    VideoReport, VulnerabilityChain, VulnerabilityReport,
};
use crate::report_export::{self, TeamReport};
use crate::state::{AnalysisSource, Delta, ProviderCommand, TeamBundle};
use crate::team_analysis::build_team_analysis;
use crate::video::{self, VideoRequest};

pub const DEMO_TEAMS: [&str; 12] = [
    "Ulsan HD",
    "Pohang Steelers",
    "Jeonbuk Hyundai",
    "FC Seoul",
    "Suwon FC",
    "Gangwon FC",
    "Daegu FC",
    "Incheon United",
    "Gwangju FC",
    "Daejeon Citizen",
    "Jeju United",
    "Gimcheon Sangmu",
];

const SQUAD: [(&str, &str); 11] = [
    ("Jo Hyeon-woo", "GK"),
    ("Kim Young-gwon", "CB"),
    ("Park Jin-seop", "CB"),
    ("Seol Young-woo", "RB"),
    ("Lee Myung-jae", "LB"),
    ("Park Yong-woo", "DM"),
    ("Lee Chung-yong", "CM"),
    ("Eom Won-sang", "RW"),
    ("Jeong Seung-hyun", "LW"),
    ("Joo Min-kyu", "CF"),
    ("Ko Seung-beom", "AM"),
];

const ZONES: [&str; 4] = ["defensive_third", "middle_third", "final_third", "left_wing"];
const DEMO_GAMES: u32 = 38;

fn team_seed(team_id: u32) -> StdRng {
    StdRng::seed_from_u64(0x5C0u64 ^ u64::from(team_id).wrapping_mul(7919))
}

fn team_name(team_id: u32) -> String {
    team_id
        .checked_sub(1)
        .and_then(|idx| DEMO_TEAMS.get(idx as usize))
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Team {team_id}"))
}

fn player_id(team_id: u32, idx: usize) -> u64 {
    u64::from(team_id) * 1_000 + idx as u64 + 1
}

/// League table for the demo teams, ranked by points then goal difference.
pub fn demo_standings() -> Vec<TeamStanding> {
    let mut rows: Vec<TeamStanding> = (1..=DEMO_TEAMS.len() as u32)
        .map(|team_id| {
            let mut rng = team_seed(team_id);
            let wins: u32 = rng.gen_range(6..22);
            let draws: u32 = rng.gen_range(3..10);
            let losses = DEMO_GAMES - wins - draws;
            let goals_for = wins as i32 * 2 + rng.gen_range(0..10);
            let goals_against = losses as i32 * 2 + rng.gen_range(0..8);
            let form = (0..5)
                .map(|_| match rng.gen_range(0..3) {
                    0 => "W",
                    1 => "D",
                    _ => "L",
                })
                .map(str::to_string)
                .collect();
            TeamStanding {
                team_id,
                team_name: team_name(team_id),
                rank: 0,
                played: DEMO_GAMES,
                wins,
                draws,
                losses,
                goals_for,
                goals_against,
                goal_diff: goals_for - goals_against,
                points: wins * 3 + draws,
                form,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_diff.cmp(&a.goal_diff))
            .then(a.team_id.cmp(&b.team_id))
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx as u32 + 1;
    }
    rows
}

pub fn demo_bundle(team_id: u32) -> TeamBundle {
    let mut rng = team_seed(team_id);
    let patterns: Vec<Pattern> = (0..5)
        .map(|cluster| Pattern {
            cluster_id: cluster,
            frequency: rng.gen_range(8..60),
            shot_conversion_rate: rng.gen_range(0.02..0.3),
            avg_duration: rng.gen_range(6.0..30.0),
            avg_passes: rng.gen_range(2.0..9.0),
            avg_forward_progress: rng.gen_range(10.0..55.0),
            avg_start_zone: ZONES[rng.gen_range(0..2)].to_string(),
            avg_end_zone: ZONES[rng.gen_range(2..4)].to_string(),
            common_sequences: vec![
                "Pass_Pass_Carry_Shot".to_string(),
                "Pass_Cross_Header".to_string(),
            ],
        })
        .collect();
    let phases = (1..=8)
        .map(|phase_id| Phase {
            phase_id,
            length: rng.gen_range(4..14),
            duration: rng.gen_range(5.0..40.0),
            has_shot: rng.gen_bool(0.4),
            passes: rng.gen_range(2..10),
            start_zone: ZONES[rng.gen_range(0..3)].to_string(),
            event_sequence: "Pass_Pass_Dribble_Shot".to_string(),
        })
        .collect();
    let setpieces: Vec<SetPieceRoutine> = ["Corner", "Corner", "Freekick", "Freekick"]
        .iter()
        .enumerate()
        .map(|(idx, kind)| {
            let corner = *kind == "Corner";
            SetPieceRoutine {
                kind: kind.to_string(),
                cluster_id: idx as i64,
                frequency: rng.gen_range(4..30),
                shot_rate: rng.gen_range(0.05..0.4),
                primary_zone: ["near_post", "far_post", "central", "edge_of_box"]
                    [rng.gen_range(0..4)]
                .to_string(),
                swing_type: if rng.gen_bool(0.5) { "inswing" } else { "outswing" }.to_string(),
                avg_target_x: Some(if corner {
                    rng.gen_range(92.0..102.0)
                } else {
                    rng.gen_range(80.0..98.0)
                }),
                avg_target_y: Some(rng.gen_range(24.0..44.0)),
                defense_suggestion: "Put a tall marker on the near post".to_string(),
            }
        })
        .collect();
    let corners = setpieces.iter().filter(|r| r.is_corner()).count() as u32;
    let hubs = demo_hubs(team_id, &mut rng);
    let total_events: u64 = patterns.iter().map(|p| u64::from(p.frequency) * 12).sum();

    TeamBundle {
        team_id,
        info: Some(TeamInfo {
            team_id,
            team_name: team_name(team_id),
            total_matches: DEMO_GAMES,
            recent_matches: Vec::new(),
        }),
        n_games_analyzed: DEMO_GAMES,
        total_events,
        patterns,
        phases,
        setpiece_counts: SetPieceCounts {
            corners: corners * 20,
            freekicks: (setpieces.len() as u32 - corners) * 25,
        },
        setpieces,
        network_stats: NetworkStats {
            nodes: SQUAD.len() as u32,
            edges: 42,
        },
        hubs,
        fetched_at: now_secs(),
        stale: false,
    }
}

fn demo_hubs(team_id: u32, rng: &mut StdRng) -> Vec<Hub> {
    [5usize, 6, 10]
        .iter()
        .map(|&idx| {
            let (name, position) = SQUAD[idx];
            let connection = |kind, other: usize, rng: &mut StdRng| Connection {
                kind,
                player_name: SQUAD[other].0.to_string(),
                position: SQUAD[other].1.to_string(),
                count: rng.gen_range(20..120),
            };
            let impact = rng.gen_range(25.0..90.0);
            Hub {
                player_id: player_id(team_id, idx),
                player_name: name.to_string(),
                position: position.to_string(),
                main_position: position.to_string(),
                hub_score: rng.gen_range(0.2..0.9),
                betweenness: rng.gen_range(0.05..0.4),
                pagerank: rng.gen_range(0.05..0.2),
                passes_received: rng.gen_range(150..600),
                passes_made: rng.gen_range(150..650),
                key_connections: vec![
                    connection(ConnectionKind::PassesTo, 9, rng),
                    connection(ConnectionKind::ReceivesFrom, 2, rng),
                ],
                disruption_impact: DisruptionImpact {
                    impact_score: impact,
                    edges_removed: rng.gen_range(4..12),
                    component_change: 0,
                    description: format!("Pressing {name} cuts the build-up"),
                },
            }
        })
        .collect()
}

pub fn demo_graph(team_id: u32) -> NetworkGraph {
    let mut rng = team_seed(team_id.wrapping_add(101));
    let nodes: Vec<NetworkNode> = SQUAD
        .iter()
        .enumerate()
        .map(|(idx, (name, position))| NetworkNode {
            id: player_id(team_id, idx).to_string(),
            name: name.to_string(),
            position: position.to_string(),
            hub_score: rng.gen_range(0.05..0.9),
            passes_total: rng.gen_range(40..700),
            avg_x: None,
            avg_y: None,
        })
        .collect();
    let mut edges = Vec::new();
    for source in 0..nodes.len() {
        for target in 0..nodes.len() {
            if source != target && rng.gen_bool(0.3) {
                edges.push(NetworkEdge {
                    source: nodes[source].id.clone(),
                    target: nodes[target].id.clone(),
                    weight: f64::from(rng.gen_range(3u32..80)),
                });
            }
        }
    }
    NetworkGraph { nodes, edges }
}

pub fn demo_vaep(team_id: u32) -> VaepSummary {
    let mut rng = team_seed(team_id.wrapping_add(202));
    let mut players: Vec<VaepPlayer> = SQUAD
        .iter()
        .enumerate()
        .map(|(idx, (name, position))| {
            let offensive: f64 = rng.gen_range(0.0..6.0);
            let defensive: f64 = rng.gen_range(0.0..2.5);
            let actions: u32 = rng.gen_range(300..1500);
            let total = offensive + defensive;
            VaepPlayer {
                player_id: player_id(team_id, idx),
                player_name: name.to_string(),
                position: position.to_string(),
                total_vaep: total,
                avg_vaep: total / f64::from(actions),
                actions,
                offensive_vaep: offensive,
                defensive_vaep: defensive,
                passing_vaep: offensive * 0.4,
            }
        })
        .collect();
    players.sort_by(|a, b| b.total_vaep.total_cmp(&a.total_vaep));
    let mut offensive = players.clone();
    offensive.sort_by(|a, b| b.offensive_vaep.total_cmp(&a.offensive_vaep));
    let mut defensive = players.clone();
    defensive.sort_by(|a, b| b.defensive_vaep.total_cmp(&a.defensive_vaep));
    VaepSummary {
        team_id,
        n_games_analyzed: DEMO_GAMES,
        team_total_vaep: players.iter().map(|p| p.total_vaep).sum(),
        top_offensive: offensive.into_iter().take(5).collect(),
        top_defensive: defensive.into_iter().take(5).collect(),
        top_players: players,
        methodology: "demo data".to_string(),
    }
}

pub fn demo_replay(team_id: u32, phase_id: u32) -> Vec<ReplayEvent> {
    let mut rng = team_seed(team_id.wrapping_mul(31).wrapping_add(phase_id));
    let steps = rng.gen_range(4..9);
    let mut x: f64 = rng.gen_range(20.0..45.0);
    let mut y: f64 = rng.gen_range(10.0..58.0);
    let mut time: f64 = rng.gen_range(60.0..5_000.0);
    (0..steps)
        .map(|step| {
            let idx = rng.gen_range(1..SQUAD.len());
            let last = step + 1 == steps;
            let end_x: f64 = if last { 105.0 } else { (x + rng.gen_range(4.0..18.0)).min(100.0) };
            let end_y: f64 = if last { 34.0 } else { (y + rng.gen_range(-12.0..12.0)).clamp(2.0, 66.0) };
            let event = ReplayEvent {
                time,
                kind: if last { "Shot" } else { "Pass" }.to_string(),
                player: SQUAD[idx].0.to_string(),
                player_id: player_id(team_id, idx).to_string(),
                position: SQUAD[idx].1.to_string(),
                start_x: x,
                start_y: y,
                end_x,
                end_y,
                result: if last { "Off Target" } else { "Successful" }.to_string(),
            };
            x = end_x;
            y = end_y;
            time += rng.gen_range(1.0..4.0);
            event
        })
        .collect()
}

pub fn demo_matches(team_id: u32) -> Vec<MatchResult> {
    let mut rng = team_seed(team_id.wrapping_add(303));
    let teams = DEMO_TEAMS.len() as u32;
    (0..10u32)
        .map(|round| {
            let other = (team_id + round) % teams + 1;
            let other = if other == team_id { other % teams + 1 } else { other };
            let home = round % 2 == 0;
            let (home_id, away_id) = if home { (team_id, other) } else { (other, team_id) };
            let hg: u32 = rng.gen_range(0..4);
            let ag: u32 = rng.gen_range(0..4);
            let result = match hg.cmp(&ag) {
                std::cmp::Ordering::Greater => MatchOutcome::HomeWin,
                std::cmp::Ordering::Less => MatchOutcome::AwayWin,
                std::cmp::Ordering::Equal => MatchOutcome::Draw,
            };
            MatchResult {
                game_id: u64::from(team_id) * 100 + u64::from(round),
                date: format!("2024-{:02}-{:02}", 3 + round / 4, 1 + (round * 7) % 28),
                home_team: team_name(home_id),
                away_team: team_name(away_id),
                home_team_id: home_id,
                away_team_id: away_id,
                score: format!("{hg}-{ag}"),
                result,
                result_text: String::new(),
                venue: format!("{} Stadium", team_name(home_id)),
            }
        })
        .collect()
}

pub fn demo_chances(m: &MatchResult) -> ChanceAnalysis {
    let mut rng = StdRng::seed_from_u64(m.game_id);
    let mut goals = m.score.split('-').map(|g| g.trim().parse::<u32>().unwrap_or(0));
    let (hg, ag) = (goals.next().unwrap_or(0), goals.next().unwrap_or(0));
    let chances = [(m.home_team_id, &m.home_team), (m.away_team_id, &m.away_team)]
        .into_iter()
        .map(|(team_id, name)| TeamChances {
            team_id,
            team_name: name.clone(),
            key_moments: (0..rng.gen_range(1..4))
                .map(|_| demo_moment(&mut rng))
                .collect(),
        })
        .collect();
    ChanceAnalysis {
        game_id: m.game_id,
        date: m.date.clone(),
        home_team: ScoreLine {
            id: m.home_team_id,
            name: m.home_team.clone(),
            score: hg,
        },
        away_team: ScoreLine {
            id: m.away_team_id,
            name: m.away_team.clone(),
            score: ag,
        },
        result: m.result_text.clone(),
        score: m.score.clone(),
        summary: "Demo chance review".to_string(),
        chances,
    }
}

fn demo_moment(rng: &mut StdRng) -> KeyMoment {
    let idx = rng.gen_range(7..SQUAD.len());
    let x: f64 = rng.gen_range(78.0..100.0);
    let y: f64 = rng.gen_range(18.0..50.0);
    let minute: u32 = rng.gen_range(1..90);
    let xg: f64 = rng.gen_range(0.02..0.15);
    KeyMoment {
        time: f64::from(minute) * 60.0,
        time_display: Some(format!("{minute}'")),
        period: if minute > 45 { 2 } else { 1 },
        player: SQUAD[idx].0.to_string(),
        player_position: Some(SQUAD[idx].1.to_string()),
        action: "Shot".to_string(),
        result: "Off Target".to_string(),
        position: PitchPoint {
            x: Some(x),
            y: Some(y),
        },
        original_situation: Some(OriginalSituation {
            description: "Shot from a tight angle".to_string(),
            position: PitchPoint {
                x: Some(x),
                y: Some(y),
            },
            distance_to_goal: ((105.0 - x).powi(2) + (34.0 - y).powi(2)).sqrt(),
            zone: if y < 34.0 { "left" } else { "right" }.to_string(),
        }),
        failure_analysis: Some(FailureAnalysis {
            reasons: vec!["Tight angle".to_string(), "Two defenders closing".to_string()],
            xg,
        }),
        suggestion: Suggestion {
            kind: "pass".to_string(),
            target_x: Some(rng.gen_range(92.0..100.0)),
            target_y: Some(rng.gen_range(28.0..40.0)),
            target_position: None,
            description: "Square it to the runner at the penalty spot".to_string(),
            reasons: vec!["Unmarked teammate".to_string()],
            expected_xg: Some(xg + rng.gen_range(0.05..0.25)),
            xg_improvement: None,
        },
        play_sequence: Vec::new(),
        setup_play: None,
    }
}

pub fn demo_pressing(team_id: u32, target: u64) -> PressingResponse {
    let mut rng = StdRng::seed_from_u64(target);
    let normal: f64 = rng.gen_range(0.78..0.92);
    let pressed = normal - rng.gen_range(0.08..0.25);
    let step = |action: &str, expected: &str| ChainStep {
        action: action.to_string(),
        expected_result: expected.to_string(),
    };
    let mut followups = BTreeMap::new();
    followups.insert("Ball recovery".to_string(), 0.45);
    followups.insert("Foul".to_string(), 0.2);
    PressingResponse {
        team_id,
        target_player_id: target,
        n_games_analyzed: DEMO_GAMES,
        pressing_simulation: PressingSimulation {
            player_id: target,
            total_passes: rng.gen_range(200..700),
            scenario_a: Scenario {
                name: "Normal".to_string(),
                pass_success_rate: normal,
                pass_failure_rate: 1.0 - normal,
                description: "No pressure on the hub".to_string(),
            },
            scenario_b: Scenario {
                name: "Pressed".to_string(),
                pass_success_rate: pressed,
                pass_failure_rate: 1.0 - pressed,
                description: "Two players press the hub".to_string(),
            },
            on_failure_followups: followups,
            recommendation: "Press on the first touch".to_string(),
        },
        vulnerability_chain: VulnerabilityReport {
            player_id: target,
            vulnerability_chain: VulnerabilityChain {
                step1: step("Press the hub", "Rushed pass"),
                step2: step("Intercept in midfield", "Turnover"),
                step3: step("Quick vertical attack", "Shot on goal"),
            },
            summary: "Pressing the hub opens a three-step turnover chain".to_string(),
        },
    }
}

pub fn demo_pre_match(team_id: u32, opponent_id: u32) -> PreMatchResult {
    let mut rng = StdRng::seed_from_u64(u64::from(team_id) << 16 | u64::from(opponent_id));
    let win: f64 = rng.gen_range(25.0..55.0);
    let draw: f64 = rng.gen_range(20.0..30.0);
    let base = Prediction {
        win,
        draw,
        lose: 100.0 - win - draw,
    };
    let gain: f64 = rng.gen_range(2.0..9.0);
    let optimal = Prediction {
        win: base.win + gain,
        draw: base.draw,
        lose: base.lose - gain,
    };
    PreMatchResult {
        our_team_id: team_id,
        opponent_id,
        base_prediction: base.clone(),
        optimal_prediction: optimal.clone(),
        win_improvement: gain,
        tactical_suggestions: vec![
            TacticalSuggestion {
                priority: 1,
                tactic: "High press on their pivot".to_string(),
                reason: format!("{} builds through one midfielder", team_name(opponent_id)),
                expected_effect: "More turnovers in the final third".to_string(),
                win_prob_change: format!("+{gain:.1}%"),
            },
            TacticalSuggestion {
                priority: 2,
                tactic: "Overload the left flank".to_string(),
                reason: "Their right back pushes high".to_string(),
                expected_effect: "Crossing chances".to_string(),
                win_prob_change: "+1.5%".to_string(),
            },
        ],
        scenarios: vec![SimScenario {
            scenario: "Press the pivot".to_string(),
            description: "Mark the holding midfielder man to man".to_string(),
            before: base,
            after: optimal,
            win_change: gain,
            recommendation: "Recommended".to_string(),
        }],
    }
}

fn demo_video_job(job_id: &str, source: &str, polls: u32) -> VideoJob {
    let status = match polls {
        0 => "queued",
        1 | 2 => "run",
        _ => "ok",
    };
    let report = (status == "ok").then(|| {
        let video_id = video::pick_youtube_id(source);
        VideoReport {
            job_id: job_id.to_string(),
            status: "ok".to_string(),
            clip: VideoClip {
                url: source.to_string(),
                video_id,
                start: 0.0,
                fps: Some(25.0),
                width: Some(1280.0),
                height: Some(720.0),
            },
            moments: (0..3u32)
                .map(|i| VideoMoment {
                    ts: 12.0 + f64::from(i) * 21.5,
                    label: format!("Moment {}", i + 1),
                    actual: Coord {
                        x: 80.0 + f64::from(i) * 4.0,
                        y: 20.0 + f64::from(i) * 10.0,
                    },
                    suggest: Coord { x: 94.0, y: 34.0 },
                    delta: 0.06 + f64::from(i) * 0.03,
                    note: "Cut back instead of shooting".to_string(),
                    conf: 0.7,
                })
                .collect(),
            notes: vec!["Demo analysis".to_string()],
            mode: "demo".to_string(),
        }
    });
    VideoJob {
        job_id: job_id.to_string(),
        status: status.to_string(),
        created: None,
        updated: None,
        report,
        error: None,
    }
}

/// Answers provider commands from synthetic data.
#[derive(Debug, Default)]
pub struct DemoProvider {
    video_jobs: HashMap<String, (String, u32)>,
    next_job: u32,
}

impl DemoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, cmd: ProviderCommand, tx: &Sender<Delta>) {
        match cmd {
            ProviderCommand::FetchStandings => {
                let _ = tx.send(Delta::SetStandings {
                    standings: demo_standings(),
                    stale: false,
                });
            }
            ProviderCommand::FetchTeamBundle { team_id } => {
                let bundle = demo_bundle(team_id);
                let analysis =
                    build_team_analysis(team_id, &bundle.patterns, &bundle.setpieces, &bundle.hubs);
                let _ = tx.send(Delta::SetTeamBundle {
                    team_id,
                    bundle,
                });
                let _ = tx.send(Delta::SetMatches {
                    team_id,
                    matches: demo_matches(team_id),
                });
                let _ = tx.send(Delta::SetTeamAnalysis {
                    team_id,
                    analysis,
                    source: AnalysisSource::Client,
                });
                let _ = tx.send(Delta::SetNetworkGraph {
                    team_id,
                    graph: demo_graph(team_id),
                });
                let _ = tx.send(Delta::SetVaep {
                    team_id,
                    vaep: demo_vaep(team_id),
                });
            }
            ProviderCommand::FetchReplay { team_id, phase_id } => {
                let _ = tx.send(Delta::SetReplay {
                    team_id,
                    phase_id,
                    events: demo_replay(team_id, phase_id),
                });
            }
            ProviderCommand::FetchPressing { team_id, player_id } => {
                let _ = tx.send(Delta::SetPressing {
                    team_id,
                    result: demo_pressing(team_id, player_id),
                });
            }
            ProviderCommand::RunPreMatch {
                team_id,
                opponent_id,
            } => {
                let _ = tx.send(Delta::SetPreMatch {
                    team_id,
                    result: demo_pre_match(team_id, opponent_id),
                });
            }
            ProviderCommand::FetchChances { team_id, game_id } => {
                match demo_matches(team_id).iter().find(|m| m.game_id == game_id) {
                    Some(m) => {
                        let _ = tx.send(Delta::SetChances {
                            team_id,
                            analysis: demo_chances(m),
                        });
                    }
                    None => {
                        let _ = tx.send(Delta::Log(format!(
                            "[WARN] Chance analysis for game {game_id}: API Error: 404"
                        )));
                    }
                }
            }
            ProviderCommand::StartVideoJob { url } => self.start_video(&url, None, tx),
            ProviderCommand::UploadVideo { path, url } => self.start_video(&url, Some(&path), tx),
            ProviderCommand::PollVideoJob { job_id } => {
                let Some((source, polls)) = self.video_jobs.get_mut(&job_id) else {
                    let _ = tx.send(Delta::VideoFailed("Job not found".to_string()));
                    return;
                };
                *polls += 1;
                let _ = tx.send(Delta::SetVideoJob(demo_video_job(&job_id, source, *polls)));
            }
            ProviderCommand::Export { team_id, path } => self.export(team_id, &path, tx),
        }
    }

    fn start_video(&mut self, url: &str, file: Option<&Path>, tx: &Sender<Delta>) {
        let source = match video::validate_request(url, file) {
            Ok(VideoRequest::Link(link)) => link,
            Ok(VideoRequest::Upload { path, url }) => {
                if url.is_empty() {
                    path.display().to_string()
                } else {
                    url
                }
            }
            Err(err) => {
                let _ = tx.send(Delta::VideoFailed(err.to_string()));
                return;
            }
        };
        self.next_job += 1;
        let job_id = format!("demo-{:04}", self.next_job);
        let job = demo_video_job(&job_id, &source, 0);
        self.video_jobs.insert(job_id, (source, 0));
        let _ = tx.send(Delta::SetVideoJob(job));
    }

    fn export(&self, team_id: u32, path: &str, tx: &Sender<Delta>) {
        let _ = tx.send(Delta::ExportStarted {
            path: path.to_string(),
            total: report_export::SHEET_COUNT,
        });
        let bundle = demo_bundle(team_id);
        let report = TeamReport {
            team_id,
            team_name: team_name(team_id),
            standings: demo_standings(),
            analysis: build_team_analysis(team_id, &bundle.patterns, &bundle.setpieces, &bundle.hubs),
            analysis_source: AnalysisSource::Client,
            matches: demo_matches(team_id),
            vaep: Some(demo_vaep(team_id)),
            bundle,
            pressing_targets: Vec::new(),
            fetch_errors: Vec::new(),
        };
        let progress_tx = tx.clone();
        let written = report_export::write_team_workbook(Path::new(path), &report, |progress| {
            let _ = progress_tx.send(Delta::ExportProgress {
                current: progress.current,
                total: progress.total,
                message: progress.message,
            });
        });
        let (sheets, rows, errors) = match written {
            Ok(summary) => (summary.sheets, summary.rows, 0),
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Export failed: {err:#}")));
                (0, 0, 1)
            }
        };
        let _ = tx.send(Delta::ExportFinished {
            path: path.to_string(),
            sheets,
            rows,
            errors,
        });
    }
}

pub fn spawn_demo_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let mut provider = DemoProvider::new();
        let _ = tx.send(Delta::Log("[INFO] Demo mode: synthetic data".to_string()));
        provider.handle(ProviderCommand::FetchStandings, &tx);
        while let Ok(cmd) = cmd_rx.recv() {
            // Enough latency for the loading states to show.
            thread::sleep(Duration::from_millis(120));
            provider.handle(cmd, &tx);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn standings_are_ranked_and_complete() {
        let table = demo_standings();
        assert_eq!(table.len(), DEMO_TEAMS.len());
        for (idx, row) in table.iter().enumerate() {
            assert_eq!(row.rank, idx as u32 + 1);
            assert_eq!(row.wins + row.draws + row.losses, DEMO_GAMES);
        }
        assert!(table.windows(2).all(|w| w[0].points >= w[1].points));
    }

    #[test]
    fn demo_data_is_deterministic() {
        assert_eq!(demo_bundle(3).patterns, demo_bundle(3).patterns);
        assert_eq!(demo_bundle(3).hubs, demo_bundle(3).hubs);
        assert_eq!(demo_replay(3, 2), demo_replay(3, 2));
        assert_eq!(demo_graph(5).nodes.len(), SQUAD.len());
    }

    #[test]
    fn replay_ends_with_a_shot() {
        let events = demo_replay(1, 4);
        assert!(events.len() >= 4);
        assert_eq!(events.last().map(|e| e.kind.as_str()), Some("Shot"));
        assert!(events.windows(2).all(|w| w[0].end_x == w[1].start_x));
    }

    #[test]
    fn video_job_progresses_to_done() {
        let (tx, rx) = mpsc::channel();
        let mut provider = DemoProvider::new();
        provider.handle(
            ProviderCommand::StartVideoJob {
                url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            },
            &tx,
        );
        let mut statuses = Vec::new();
        let mut job_id = String::new();
        if let Ok(Delta::SetVideoJob(job)) = rx.try_recv() {
            statuses.push(job.status.clone());
            job_id = job.job_id;
        }
        for _ in 0..3 {
            provider.handle(
                ProviderCommand::PollVideoJob {
                    job_id: job_id.clone(),
                },
                &tx,
            );
            if let Ok(Delta::SetVideoJob(job)) = rx.try_recv() {
                statuses.push(job.status.clone());
                if job.status == "ok" {
                    let report = job.report.expect("report when done");
                    assert_eq!(report.clip.video_id, "dQw4w9WgXcQ");
                    assert_eq!(report.moments.len(), 3);
                }
            }
        }
        assert_eq!(statuses, vec!["queued", "run", "run", "ok"]);
    }

    #[test]
    fn invalid_video_link_fails_fast() {
        let (tx, rx) = mpsc::channel();
        DemoProvider::new().handle(
            ProviderCommand::StartVideoJob {
                url: "https://vimeo.com/1".to_string(),
            },
            &tx,
        );
        assert!(matches!(rx.try_recv(), Ok(Delta::VideoFailed(_))));
    }
}
