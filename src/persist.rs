use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::http_cache::{app_cache_dir, now_secs};
use crate::models::TeamStanding;
use crate::state::{AppState, TeamBundle};

const SESSION_FILE: &str = "session.json";
const SESSION_VERSION: u32 = 1;
const MAX_BUNDLES: usize = 24;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SessionFile {
    version: u32,
    #[serde(default)]
    saved_at: Option<u64>,
    #[serde(default)]
    standings: Vec<TeamStanding>,
    #[serde(default)]
    bundles: HashMap<u32, TeamBundle>,
    #[serde(default)]
    last_team_id: Option<u32>,
    #[serde(default)]
    video_url: String,
}

pub fn load_into_state(state: &mut AppState) {
    if let Some(path) = session_path() {
        load_from(&path, state);
    }
}

pub fn save_from_state(state: &AppState) {
    if let Some(path) = session_path() {
        save_to(&path, state);
    }
}

/// Restores the last session. Restored bundles are marked stale until the
/// backend answers again.
pub fn load_from(path: &Path, state: &mut AppState) -> bool {
    let Some(session) = load_session_file(path) else {
        return false;
    };
    if session.version != SESSION_VERSION {
        return false;
    }

    if !session.standings.is_empty() {
        state.standings = session.standings;
        state.standings.sort_by_key(|s| (s.rank == 0, s.rank));
        state.standings_stale = true;
    }
    for (team_id, mut bundle) in session.bundles {
        bundle.team_id = team_id;
        bundle.stale = true;
        state.bundles.insert(team_id, bundle);
    }
    if let Some(team_id) = session.last_team_id
        && let Some(idx) = state.standings.iter().position(|s| s.team_id == team_id)
    {
        state.selected = idx;
    }
    if state.video.url_input.is_empty() {
        state.video.url_input = session.video_url;
    }
    true
}

pub fn save_to(path: &Path, state: &AppState) {
    let Some(dir) = path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);

    let mut bundles: Vec<(&u32, &TeamBundle)> = state
        .bundles
        .iter()
        .filter(|(_, bundle)| !bundle.is_empty())
        .collect();
    bundles.sort_by_key(|(_, bundle)| std::cmp::Reverse(bundle.fetched_at.unwrap_or(0)));
    bundles.truncate(MAX_BUNDLES);

    let session = SessionFile {
        version: SESSION_VERSION,
        saved_at: now_secs(),
        standings: state.standings.clone(),
        bundles: bundles
            .into_iter()
            .map(|(id, bundle)| (*id, bundle.clone()))
            .collect(),
        last_team_id: state.team_id.or_else(|| state.selected_standing().map(|s| s.team_id)),
        video_url: state.video.url_input.trim().to_string(),
    };

    if let Ok(json) = serde_json::to_string(&session) {
        let tmp = path.with_extension("json.tmp");
        if fs::write(&tmp, json).is_ok() {
            let _ = fs::rename(&tmp, path);
        }
    }
}

fn load_session_file(path: &Path) -> Option<SessionFile> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str::<SessionFile>(&raw).ok()
}

fn session_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(SESSION_FILE))
}
