mod common;

use std::fs;
use std::sync::mpsc::{self, Receiver};

use common::{MockBackend, fixture, temp_dir};
use matchday_scout::config::ScoutConfig;
use matchday_scout::demo_feed::DemoProvider;
use matchday_scout::feed::{ProviderContext, run_command};
use matchday_scout::report_store;
use matchday_scout::state::{
    AnalysisSource, AppState, Delta, ProviderCommand, Screen, TeamTab, apply_delta,
};

const TEAM_INFO: &str = r#"{"team_id": 1, "team_name": "Ulsan", "total_matches": 38, "recent_matches": []}"#;
const PHASES: &str = r#"{"team_id": 1, "n_games_analyzed": 5, "total_phases": 1,
    "phases": [{"phase_id": 3, "length": 6, "duration": 18.5, "has_shot": true, "passes": 4,
                "start_zone": "middle_center", "event_sequence": "Pass → Pass → Shot"}]}"#;
const NETWORK: &str = r#"{"team_id": 1, "n_games_analyzed": 5,
    "hubs": [{"player_id": 103, "player_name": "Park", "position": "CM", "main_position": "CM",
              "hub_score": 0.91, "passes_received": 180, "passes_made": 222,
              "key_connections": [{"type": "passes_to", "player_name": "Choi", "position": "ST", "count": 31}],
              "disruption_impact": {"impact_score": 64.0, "edges_removed": 9, "component_change": 1,
                                    "description": "Splits the midfield"}}],
    "network_stats": {"nodes": 4, "edges": 3}}"#;
const MATCHES: &str = r#"{"matches": [
    {"game_id": 126283, "date": "2024-05-11", "home_team": "Ulsan", "away_team": "Jeonbuk",
     "home_team_id": 1, "away_team_id": 4, "score": "1-1", "result": "draw"}]}"#;

fn config(base: &str) -> ScoutConfig {
    ScoutConfig {
        api_base: base.to_string(),
        ..ScoutConfig::default()
    }
}

/// Serves a healthy backend except for `/analysis` (always 500) and VAEP
/// (404), so the local analysis fallback kicks in.
fn team_backend() -> MockBackend {
    MockBackend::start(|_, path| {
        let route = path.split('?').next().unwrap_or_default();
        match route {
            "/api/teams/overview" => (200, fixture("standings.json")),
            "/api/teams/1" => (200, TEAM_INFO.to_string()),
            "/api/patterns/1" => (200, fixture("patterns.json")),
            "/api/patterns/1/phases" => (200, PHASES.to_string()),
            "/api/setpieces/1" => (200, fixture("setpieces.json")),
            "/api/network/1" => (200, NETWORK.to_string()),
            "/api/network/1/graph" => (200, fixture("network_graph.json")),
            "/api/simulation/matches" => (200, MATCHES.to_string()),
            "/api/patterns/1/analysis" => (500, r#"{"detail":"model not loaded"}"#.to_string()),
            _ => (404, r#"{"detail":"Not Found"}"#.to_string()),
        }
    })
}

fn drain(rx: &Receiver<Delta>) -> Vec<Delta> {
    rx.try_iter().collect()
}

fn logs(deltas: &[Delta]) -> Vec<&str> {
    deltas
        .iter()
        .filter_map(|d| match d {
            Delta::Log(msg) => Some(msg.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn team_fetch_falls_back_to_local_analysis_and_archives_snapshot() {
    let backend = team_backend();
    let dir = temp_dir("team_fetch");
    let db_path = dir.join("snapshots.sqlite");
    let conn = report_store::open_db(&db_path).expect("open db");
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base)).with_store(conn);

    let (tx, rx) = mpsc::channel();
    run_command(&ctx, ProviderCommand::FetchTeamBundle { team_id: 1 }, &tx);
    let deltas = drain(&rx);

    let bundle = deltas
        .iter()
        .find_map(|d| match d {
            Delta::SetTeamBundle { bundle, .. } => Some(bundle),
            _ => None,
        })
        .expect("bundle delta");
    assert_eq!(bundle.patterns.len(), 2);
    assert_eq!(bundle.phases.len(), 1);
    assert_eq!(bundle.setpieces.len(), 2);
    assert_eq!(bundle.hubs.len(), 1);
    assert_eq!(bundle.info.as_ref().map(|i| i.team_name.as_str()), Some("Ulsan"));
    assert!(!bundle.stale);

    assert!(deltas.iter().any(|d| matches!(
        d,
        Delta::SetTeamAnalysis {
            team_id: 1,
            source: AnalysisSource::Client,
            ..
        }
    )));
    assert!(deltas.iter().any(|d| matches!(
        d,
        Delta::SetNetworkGraph { graph, .. } if graph.nodes.len() == 4
    )));
    assert!(deltas.iter().any(|d| matches!(d, Delta::SetMatches { matches, .. } if matches.len() == 1)));
    assert!(!deltas.iter().any(|d| matches!(d, Delta::SetVaep { .. })));

    let log_lines = logs(&deltas);
    assert!(log_lines.iter().any(|l| l.starts_with("[INFO] Team 1: using local analysis")));
    assert!(log_lines.iter().any(|l| l.starts_with("[WARN]") && l.contains("VAEP")));
    assert_eq!(backend.hits("GET /api/patterns/1/analysis"), 3);

    drop(ctx);
    let conn = report_store::open_db(&db_path).expect("reopen db");
    let history = report_store::snapshot_history(&conn, 1, 10).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].team_name, "Ulsan");
    assert_eq!(history[0].patterns, 2);
    assert!(history[0].analysis().is_some());

    drop(conn);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn team_fetch_reports_failure_when_every_part_fails() {
    let backend = MockBackend::start(|_, _| (404, r#"{"detail":"Team not found"}"#.to_string()));
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base));
    let (tx, rx) = mpsc::channel();
    run_command(&ctx, ProviderCommand::FetchTeamBundle { team_id: 9 }, &tx);
    let deltas = drain(&rx);

    assert!(deltas.iter().any(|d| matches!(d, Delta::BundleFailed { team_id: 9, .. })));
    assert!(!deltas.iter().any(|d| matches!(d, Delta::SetTeamBundle { .. })));
    assert!(!deltas.iter().any(|d| matches!(d, Delta::SetTeamAnalysis { .. })));
    assert_eq!(logs(&deltas).len(), 6);
}

#[test]
fn standings_failure_sends_empty_stale_table() {
    let backend = MockBackend::start(|_, _| (503, String::new()));
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base));
    let (tx, rx) = mpsc::channel();
    run_command(&ctx, ProviderCommand::FetchStandings, &tx);
    let deltas = drain(&rx);

    assert!(deltas.iter().any(|d| matches!(
        d,
        Delta::SetStandings { standings, stale: true } if standings.is_empty()
    )));
    assert!(logs(&deltas).iter().any(|l| l.starts_with("[WARN] Standings")));

    let mut state = AppState::new();
    for delta in deltas {
        apply_delta(&mut state, delta);
    }
    assert!(!state.standings_loading);
}

#[test]
fn standings_outage_falls_back_to_bare_team_list() {
    let backend = MockBackend::start(|_, path| match path {
        "/api/teams/" => (
            200,
            r#"{"teams": [{"team_id": 1, "team_name": "Ulsan"}, {"team_id": null, "team_name": "?"}], "count": 2}"#
                .to_string(),
        ),
        _ => (503, String::new()),
    });
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base));
    let (tx, rx) = mpsc::channel();
    run_command(&ctx, ProviderCommand::FetchStandings, &tx);

    let mut state = AppState::new();
    for delta in drain(&rx) {
        apply_delta(&mut state, delta);
    }
    assert_eq!(state.standings.len(), 1);
    assert_eq!(state.standings[0].team_name, "Ulsan");
    assert_eq!(state.standings[0].rank, 0);
    assert!(state.standings_stale);
    assert_eq!(backend.hits("GET /api/teams/overview"), 3);
}

#[test]
fn failed_simulations_and_chance_analysis_stop_loading() {
    let backend = MockBackend::start(|_, _| (404, r#"{"detail":"Not Found"}"#.to_string()));
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base));
    let (tx, rx) = mpsc::channel();
    let mut state = AppState::new();
    state.open_team(1);
    state.team.pressing_loading = true;
    state.team.pre_match_loading = true;
    state.team.chances_loading = true;

    for cmd in [
        ProviderCommand::FetchPressing {
            team_id: 1,
            player_id: 103,
        },
        ProviderCommand::RunPreMatch {
            team_id: 1,
            opponent_id: 4,
        },
        ProviderCommand::FetchChances {
            team_id: 1,
            game_id: 126283,
        },
    ] {
        run_command(&ctx, cmd, &tx);
    }
    let deltas = drain(&rx);
    assert_eq!(logs(&deltas).iter().filter(|l| l.starts_with("[WARN]")).count(), 3);
    for delta in deltas {
        apply_delta(&mut state, delta);
    }

    assert!(!state.team.pressing_loading);
    assert!(!state.team.pre_match_loading);
    assert!(!state.team.chances_loading);
    assert!(state.team.pressing.is_none());
    assert!(state.team.pre_match.is_none());
}

#[test]
fn pre_match_posts_five_game_window() {
    let backend = MockBackend::start(|_, _| {
        (
            200,
            r#"{"our_team_id": 1, "opponent_id": 4, "win_improvement": 4.5}"#.to_string(),
        )
    });
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base));
    let (tx, rx) = mpsc::channel();
    run_command(
        &ctx,
        ProviderCommand::RunPreMatch {
            team_id: 1,
            opponent_id: 4,
        },
        &tx,
    );

    assert!(drain(&rx).iter().any(|d| matches!(d, Delta::SetPreMatch { team_id: 1, .. })));
    let posted = backend.received();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].line(), "POST /api/simulation/pre-match");
    let body: serde_json::Value = serde_json::from_str(&posted[0].body).expect("json body");
    assert_eq!(body["n_games"], 5);
    assert_eq!(body["our_team_id"], 1);
    assert_eq!(body["opponent_id"], 4);
    assert_eq!(ctx.cfg.n_games, 100);
}

#[test]
fn video_poll_failure_stops_with_message() {
    let backend = MockBackend::start(|_, _| (404, r#"{"detail":"job not found"}"#.to_string()));
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base));
    let (tx, rx) = mpsc::channel();
    run_command(
        &ctx,
        ProviderCommand::PollVideoJob {
            job_id: "gone".to_string(),
        },
        &tx,
    );
    let deltas = drain(&rx);
    assert!(deltas.iter().any(|d| matches!(d, Delta::VideoFailed(msg) if msg == "job not found")));
}

#[test]
fn repeated_upload_of_same_file_is_noticed() {
    let backend = MockBackend::start(|_, _| (200, r#"{"job_id":"u1","status":"queued"}"#.to_string()));
    let dir = temp_dir("upload_dedupe");
    let clip = dir.join("derby.mov");
    fs::write(&clip, b"not really a movie").expect("clip");
    let conn = report_store::open_db(&dir.join("store.sqlite")).expect("db");
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base)).with_store(conn);

    let (tx, rx) = mpsc::channel();
    let upload = || ProviderCommand::UploadVideo {
        path: clip.clone(),
        url: String::new(),
    };
    run_command(&ctx, upload(), &tx);
    let first = drain(&rx);
    assert!(first.iter().any(|d| matches!(d, Delta::SetVideoJob(job) if job.job_id == "u1")));
    assert!(!logs(&first).iter().any(|l| l.contains("analysed before")));

    run_command(&ctx, upload(), &tx);
    let second = drain(&rx);
    assert!(
        logs(&second)
            .iter()
            .any(|l| l.contains("Same file analysed before as job u1"))
    );

    drop(ctx);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn invalid_video_link_never_reaches_backend() {
    let backend = MockBackend::start(|_, _| (200, "{}".to_string()));
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base));
    let (tx, rx) = mpsc::channel();
    run_command(
        &ctx,
        ProviderCommand::StartVideoJob {
            url: "https://youtu.be/short".to_string(),
        },
        &tx,
    );
    assert!(drain(&rx).iter().any(|d| matches!(d, Delta::VideoFailed(_))));
    assert!(backend.requests().is_empty());
}

#[test]
fn export_writes_workbook_and_reports_progress() {
    let backend = team_backend();
    let dir = temp_dir("export");
    let path = dir.join("ulsan.xlsx");
    let ctx = ProviderContext::with_api(backend.api(), config(&backend.base));
    let (tx, rx) = mpsc::channel();
    run_command(
        &ctx,
        ProviderCommand::Export {
            team_id: 1,
            path: path.display().to_string(),
        },
        &tx,
    );
    let deltas = drain(&rx);

    let progress = deltas
        .iter()
        .filter(|d| matches!(d, Delta::ExportProgress { .. }))
        .count();
    assert_eq!(progress, 6);
    assert!(deltas.iter().any(|d| matches!(
        d,
        Delta::ExportFinished { sheets: 6, errors: 0, .. }
    )));
    assert!(path.exists());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn demo_session_walkthrough() {
    let mut provider = DemoProvider::new();
    let mut state = AppState::new();
    let (tx, rx) = mpsc::channel();
    let mut run = |state: &mut AppState, cmd: ProviderCommand| {
        provider.handle(cmd, &tx);
        for delta in rx.try_iter() {
            apply_delta(state, delta);
        }
    };

    run(&mut state, ProviderCommand::FetchStandings);
    assert_eq!(state.standings.len(), 12);

    let team_id = state.open_selected_team().expect("team to open");
    assert_eq!(state.screen, Screen::Team);
    run(&mut state, ProviderCommand::FetchTeamBundle { team_id });
    assert!(!state.team.loading);
    assert_eq!(state.team.analysis_source, Some(AnalysisSource::Client));
    assert!(state.team.graph.is_some());
    assert!(state.team.vaep.is_some());

    state.tab = TeamTab::Patterns;
    let phase_id = state.selected_phase().map(|p| p.phase_id).expect("phase");
    run(&mut state, ProviderCommand::FetchReplay { team_id, phase_id });
    assert!(state.replay.is_playing());
    assert_eq!(state.team.replay_phase, Some(phase_id));

    state.tab = TeamTab::Simulation;
    let player_id = state.selected_hub().map(|h| h.player_id).expect("hub");
    run(&mut state, ProviderCommand::FetchPressing { team_id, player_id });
    assert!(state.team.pressing.is_some());

    let opponent_id = state.selected_opponent().map(|s| s.team_id).expect("opponent");
    assert_ne!(opponent_id, team_id);
    run(
        &mut state,
        ProviderCommand::RunPreMatch {
            team_id,
            opponent_id,
        },
    );
    assert!(state.team.pre_match.is_some());

    state.tab = TeamTab::Matches;
    if let Some(game_id) = state.selected_match().map(|m| m.game_id) {
        run(&mut state, ProviderCommand::FetchChances { team_id, game_id });
        assert!(state.team.chances.is_some());
    }

    run(
        &mut state,
        ProviderCommand::StartVideoJob {
            url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
        },
    );
    let job_id = state.video.job.as_ref().map(|j| j.job_id.clone()).expect("job");
    for _ in 0..3 {
        run(
            &mut state,
            ProviderCommand::PollVideoJob {
                job_id: job_id.clone(),
            },
        );
    }
    assert!(!state.video.working());
    assert!(
        state
            .video
            .job
            .as_ref()
            .and_then(|j| j.report.as_ref())
            .is_some_and(|r| !r.moments.is_empty())
    );
}
