mod common;

use std::fs;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{MockBackend, fixture, temp_dir};
use matchday_scout::api::{ScoutApi, api_error, describe_error};
use matchday_scout::error::ApiError;
use matchday_scout::http_client::build_client;
use matchday_scout::retry::RetryPolicy;

const PRE_MATCH: &str = r#"{
    "our_team_id": 1,
    "opponent_id": 4,
    "base_prediction": {"win": 40.0, "draw": 30.0, "lose": 30.0},
    "optimal_prediction": {"win": 48.5, "draw": 27.0, "lose": 24.5},
    "win_improvement": 8.5,
    "tactical_suggestions": [
        {"priority": 1, "tactic": "Press the pivot", "reason": "Hub of their build-up",
         "expected_effect": "Fewer entries", "win_prob_change": "+5.0%"}
    ],
    "scenarios": []
}"#;

/// Fails the first `failures` requests with `status`, then serves `body`.
fn flaky(failures: usize, status: u16, body: String) -> MockBackend {
    let count = AtomicUsize::new(0);
    MockBackend::start(move |_, _| {
        if count.fetch_add(1, Ordering::SeqCst) < failures {
            (status, r#"{"detail":"upstream hiccup"}"#.to_string())
        } else {
            (200, body.clone())
        }
    })
}

#[test]
fn gateway_errors_are_retried_until_success() {
    let backend = flaky(2, 503, fixture("standings.json"));
    let resp = backend.api().teams_overview().expect("standings after retries");
    assert!(!resp.stale);
    assert_eq!(resp.data.standings.len(), 3);
    assert_eq!(backend.hits("GET /api/teams/overview"), 3);
}

#[test]
fn retry_budget_is_bounded() {
    let backend = MockBackend::start(|_, _| (502, String::new()));
    let err = backend.api().team_patterns(1, 5, 3).expect_err("always 502");
    assert_eq!(api_error(&err).and_then(ApiError::status), Some(502));
    assert_eq!(describe_error(&err), "API Error: 502");
    assert_eq!(backend.hits("GET /api/patterns/1?n_games=5&n_patterns=3"), 3);
}

#[test]
fn client_errors_are_final_and_carry_backend_detail() {
    let backend = MockBackend::start(|_, _| (404, r#"{"detail":"Team 99 not found"}"#.to_string()));
    let err = backend.api().team_info(99).expect_err("404");
    assert_eq!(describe_error(&err), "Team 99 not found");
    assert_eq!(backend.requests().len(), 1);
}

#[test]
fn not_implemented_is_not_retried() {
    let backend = MockBackend::start(|_, _| (501, String::new()));
    assert!(backend.api().match_list(Some(1)).is_err());
    assert_eq!(backend.hits("GET /api/simulation/matches?team_id=1"), 1);
}

#[test]
fn pre_match_post_is_retried() {
    let backend = flaky(1, 500, PRE_MATCH.to_string());
    let result = backend
        .api()
        .pre_match_simulation(1, 4, 100)
        .expect("pre-match after retry");
    assert_eq!(result.win_improvement, 8.5);
    assert_eq!(result.tactical_suggestions[0].tactic, "Press the pivot");
    assert_eq!(backend.hits("POST /api/simulation/pre-match"), 2);
}

#[test]
fn upload_resends_the_file_on_retry() {
    let dir = temp_dir("upload_retry");
    let clip = dir.join("clip.mp4");
    fs::write(&clip, vec![7u8; 64 * 1024]).expect("write clip");

    let backend = flaky(1, 504, r#"{"job_id":"u1","status":"queued"}"#.to_string());
    let job = backend
        .api()
        .upload_video_job(&clip, "https://youtu.be/dQw4w9WgXcQ")
        .expect("upload after retry");
    assert_eq!(job.job_id, "u1");
    assert_eq!(backend.hits("POST /api/video/upload"), 2);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn invalid_json_names_the_endpoint() {
    let backend = MockBackend::start(|_, _| (200, "<html>proxy</html>".to_string()));
    let err = backend.api().teams_overview().expect_err("not json");
    match api_error(&err) {
        Some(ApiError::Decode { endpoint, .. }) => assert_eq!(endpoint, "/api/teams/overview"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let client = build_client(Duration::from_secs(2)).expect("client");
    let api = ScoutApi::with_client(&format!("http://127.0.0.1:{port}"), client, RetryPolicy::none())
        .without_cache();
    let err = api.health().expect_err("nothing listening");
    assert!(matches!(api_error(&err), Some(ApiError::Transport(_))));
    assert!(describe_error(&err).starts_with("request failed"));
}

#[test]
fn video_job_ids_are_trimmed_into_the_path() {
    let backend = MockBackend::start(|_, path| {
        let id = path.rsplit('/').next().unwrap_or_default();
        (200, format!(r#"{{"job_id":"{id}","status":"run"}}"#))
    });
    let job = backend.api().video_job(" abc123 ").expect("job");
    assert_eq!(job.job_id, "abc123");
    assert_eq!(backend.requests(), vec!["GET /api/video/jobs/abc123".to_string()]);
}
