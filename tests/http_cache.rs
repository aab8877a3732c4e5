mod common;

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{MockBackend, Reply, fixture, temp_dir};
use matchday_scout::http_cache::app_cache_dir;

const ETAG: &str = "\"standings-v1\"";

const WARM: usize = 0;
const UNCHANGED: usize = 1;
const FAILING: usize = 2;
const GONE: usize = 3;

// The body store is process-wide and read once, so this binary holds a single
// test that points the cache directory somewhere private before first use.
#[test]
fn cached_get_revalidates_and_falls_back_when_backend_fails() {
    let dir = temp_dir("http_cache");
    unsafe { std::env::set_var("XDG_CACHE_HOME", &dir) };
    assert_eq!(app_cache_dir(), Some(dir.join("matchday_scout")));

    let phase = Arc::new(AtomicUsize::new(WARM));
    let backend = {
        let phase = phase.clone();
        MockBackend::start_with(move |_| match phase.load(Ordering::SeqCst) {
            WARM => Reply::new(200, fixture("standings.json")).header("ETag", ETAG),
            UNCHANGED => Reply::new(304, ""),
            FAILING => Reply::new(503, r#"{"detail":"maintenance"}"#),
            _ => Reply::hang_up(),
        })
    };
    let api = backend.cached_api();

    let fresh = api.teams_overview().expect("first fetch");
    assert!(!fresh.stale);
    assert!(!fresh.data.standings.is_empty());
    let expected = fresh.data.clone();
    assert!(backend.received()[0].header("if-none-match").is_none());
    assert!(dir.join("matchday_scout").join("http_cache.json").exists());

    phase.store(UNCHANGED, Ordering::SeqCst);
    let revalidated = api.teams_overview().expect("304 reuse");
    assert!(!revalidated.stale);
    assert_eq!(revalidated.data, expected);
    assert_eq!(backend.received()[1].header("if-none-match"), Some(ETAG));

    phase.store(FAILING, Ordering::SeqCst);
    let served = api.teams_overview().expect("stale after 5xx");
    assert!(served.stale);
    assert_eq!(served.data, expected);
    assert_eq!(backend.hits("GET /api/teams/overview"), 5);
    assert!(
        backend.received()[2..]
            .iter()
            .all(|req| req.header("if-none-match") == Some(ETAG))
    );

    phase.store(GONE, Ordering::SeqCst);
    let served = api.teams_overview().expect("stale after dropped connection");
    assert!(served.stale);
    assert_eq!(served.data, expected);

    let err = api.teams().expect_err("nothing cached for this url");
    assert!(!err.to_string().is_empty());

    let _ = fs::remove_dir_all(dir);
}
