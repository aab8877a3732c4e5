use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{
    ETAG, HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, extract_detail};
use crate::retry::{RetryPolicy, send_with_retry};

const STORE_VERSION: u32 = 2;
const APP_DIR: &str = "matchday_scout";
const STORE_FILE: &str = "http_cache.json";
const MAX_ENTRIES: usize = 400;

static STORE: Mutex<Option<BodyStore>> = Mutex::new(None);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BodyStore {
    version: u32,
    bodies: HashMap<String, StoredBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredBody {
    text: String,
    #[serde(default)]
    validators: Validators,
    saved_at: u64,
}

/// Conditional-GET validators echoed back on the next request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Validators {
    etag: Option<String>,
    last_modified: Option<String>,
}

impl Validators {
    fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            etag: read(ETAG),
            last_modified: read(LAST_MODIFIED),
        }
    }

    fn apply(&self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(etag) = &self.etag {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(stamp) = &self.last_modified {
            req = req.header(IF_MODIFIED_SINCE, stamp);
        }
        req
    }
}

impl BodyStore {
    fn insert(&mut self, url: &str, body: StoredBody) {
        self.version = STORE_VERSION;
        self.bodies.insert(url.to_string(), body);
        while self.bodies.len() > MAX_ENTRIES {
            let Some(oldest) = self
                .bodies
                .iter()
                .min_by_key(|(_, b)| b.saved_at)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            self.bodies.remove(&oldest);
        }
    }
}

/// Body of a cached GET. `stale` means the backend could not be reached (or
/// kept failing) and the last good copy was served instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBody {
    pub body: String,
    pub stale: bool,
    pub fetched_at: Option<u64>,
}

impl CachedBody {
    fn fallback(stored: StoredBody) -> Self {
        Self {
            body: stored.text,
            stale: true,
            fetched_at: Some(stored.saved_at),
        }
    }
}

/// Conditional GET through the on-disk body store. Transport failures and
/// final 5xx answers fall back to the stored copy when there is one.
pub fn fetch_json_cached(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
) -> std::result::Result<CachedBody, ApiError> {
    let previous = with_store(|store| store.bodies.get(url).cloned());

    let sent = send_with_retry(policy, || match &previous {
        Some(stored) => stored.validators.apply(client.get(url)),
        None => client.get(url),
    });
    let resp = match sent {
        Ok(resp) => resp,
        Err(err) => return fallback_or(previous, ApiError::Transport(err.to_string())),
    };

    let status = resp.status();
    let validators = Validators::from_headers(resp.headers());

    if status == StatusCode::NOT_MODIFIED {
        let Some(stored) = previous else {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: Some("received 304 without cache body".to_string()),
            });
        };
        let now = now_secs();
        let body = stored.text.clone();
        remember(
            url,
            StoredBody {
                saved_at: now.unwrap_or(stored.saved_at),
                ..stored
            },
        );
        return Ok(CachedBody {
            body,
            stale: false,
            fetched_at: now,
        });
    }

    let text = match resp.text() {
        Ok(text) => text,
        Err(err) => return fallback_or(previous, ApiError::Transport(err.to_string())),
    };

    if !status.is_success() {
        if status.is_server_error()
            && let Some(stored) = previous
        {
            return Ok(CachedBody::fallback(stored));
        }
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail: extract_detail(&text),
        });
    }

    let now = now_secs();
    remember(
        url,
        StoredBody {
            text: text.clone(),
            validators,
            saved_at: now.unwrap_or_default(),
        },
    );
    Ok(CachedBody {
        body: text,
        stale: false,
        fetched_at: now,
    })
}

fn fallback_or(
    previous: Option<StoredBody>,
    err: ApiError,
) -> std::result::Result<CachedBody, ApiError> {
    previous.map(CachedBody::fallback).ok_or(err)
}

fn with_store<T>(f: impl FnOnce(&mut BodyStore) -> T) -> T {
    let mut guard = STORE.lock().expect("http cache lock poisoned");
    f(guard.get_or_insert_with(read_store))
}

fn remember(url: &str, body: StoredBody) {
    with_store(|store| {
        store.insert(url, body);
        let _ = write_store(store);
    });
}

fn read_store() -> BodyStore {
    let Some(raw) = store_path().and_then(|path| fs::read_to_string(path).ok()) else {
        return BodyStore::default();
    };
    match serde_json::from_str::<BodyStore>(&raw) {
        Ok(store) if store.version == STORE_VERSION => store,
        _ => BodyStore::default(),
    }
}

fn write_store(store: &BodyStore) -> Result<()> {
    let Some(path) = store_path() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(store).context("serialize http cache")?;
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, &path).context("swap http cache")?;
    Ok(())
}

fn store_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(STORE_FILE))
}

/// `$XDG_CACHE_HOME/matchday_scout`, else `~/.cache/matchday_scout`.
pub fn app_cache_dir() -> Option<PathBuf> {
    let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
    if let Some(base) = non_empty("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    non_empty("HOME").map(|home| PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn now_secs() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}
