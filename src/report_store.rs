use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::http_cache::app_cache_dir;
use crate::models::TeamAnalysis;
use crate::state::TeamBundle;

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSnapshot {
    pub team_id: u32,
    pub team_name: String,
    pub snapshot_date: String,
    pub taken_at: String,
    pub overall_score: i32,
    pub n_games: u32,
    pub patterns: usize,
    pub setpieces: usize,
    pub hubs: usize,
    pub analysis_json: String,
}

impl TeamSnapshot {
    pub fn from_bundle(team_name: &str, bundle: &TeamBundle, analysis: &TeamAnalysis) -> Self {
        let now = Utc::now();
        Self {
            team_id: bundle.team_id,
            team_name: team_name.to_string(),
            snapshot_date: now.format("%Y-%m-%d").to_string(),
            taken_at: now.to_rfc3339(),
            overall_score: analysis.overall_score,
            n_games: bundle.n_games_analyzed,
            patterns: bundle.patterns.len(),
            setpieces: bundle.setpieces.len(),
            hubs: bundle.hubs.len(),
            analysis_json: serde_json::to_string(analysis).unwrap_or_default(),
        }
    }

    pub fn analysis(&self) -> Option<TeamAnalysis> {
        serde_json::from_str(&self.analysis_json).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJobRecord {
    pub job_id: String,
    pub source: String,
    pub sha256: Option<String>,
    pub status: String,
    pub error: Option<String>,
    pub updated_at: String,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("scout_snapshots.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_default_db() -> Result<Connection> {
    let path = default_db_path().context("no cache directory (HOME unset)")?;
    open_db(&path)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS team_snapshots (
            team_id INTEGER NOT NULL,
            snapshot_date TEXT NOT NULL,
            team_name TEXT NOT NULL,
            taken_at TEXT NOT NULL,
            overall_score INTEGER NOT NULL,
            n_games INTEGER NOT NULL,
            patterns INTEGER NOT NULL,
            setpieces INTEGER NOT NULL,
            hubs INTEGER NOT NULL,
            analysis_json TEXT NOT NULL,
            PRIMARY KEY (team_id, snapshot_date)
        );
        CREATE INDEX IF NOT EXISTS idx_snapshots_taken ON team_snapshots(taken_at);

        CREATE TABLE IF NOT EXISTS video_jobs (
            job_id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            sha256 TEXT NULL,
            status TEXT NOT NULL,
            error TEXT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// One snapshot per team per day; a later run the same day replaces it.
pub fn upsert_snapshot(conn: &Connection, snap: &TeamSnapshot) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO team_snapshots (
            team_id, snapshot_date, team_name, taken_at, overall_score,
            n_games, patterns, setpieces, hubs, analysis_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(team_id, snapshot_date) DO UPDATE SET
            team_name = excluded.team_name,
            taken_at = excluded.taken_at,
            overall_score = excluded.overall_score,
            n_games = excluded.n_games,
            patterns = excluded.patterns,
            setpieces = excluded.setpieces,
            hubs = excluded.hubs,
            analysis_json = excluded.analysis_json
        "#,
        params![
            snap.team_id as i64,
            snap.snapshot_date,
            snap.team_name,
            snap.taken_at,
            snap.overall_score as i64,
            snap.n_games as i64,
            snap.patterns as i64,
            snap.setpieces as i64,
            snap.hubs as i64,
            snap.analysis_json,
        ],
    )
    .context("upsert team snapshot")?;
    Ok(())
}

/// Newest first.
pub fn snapshot_history(conn: &Connection, team_id: u32, limit: usize) -> Result<Vec<TeamSnapshot>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT team_id, team_name, snapshot_date, taken_at, overall_score,
                   n_games, patterns, setpieces, hubs, analysis_json
            FROM team_snapshots
            WHERE team_id = ?1
            ORDER BY snapshot_date DESC
            LIMIT ?2
            "#,
        )
        .context("prepare snapshot history query")?;
    let rows = stmt
        .query_map(params![team_id as i64, limit as i64], read_snapshot)
        .context("query snapshot history")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode snapshot row")?);
    }
    Ok(out)
}

/// Latest snapshot of every team, best score first.
pub fn latest_snapshots(conn: &Connection) -> Result<Vec<TeamSnapshot>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT s.team_id, s.team_name, s.snapshot_date, s.taken_at, s.overall_score,
                   s.n_games, s.patterns, s.setpieces, s.hubs, s.analysis_json
            FROM team_snapshots s
            JOIN (
                SELECT team_id, MAX(snapshot_date) AS latest
                FROM team_snapshots
                GROUP BY team_id
            ) m ON m.team_id = s.team_id AND m.latest = s.snapshot_date
            ORDER BY s.overall_score DESC, s.team_name ASC
            "#,
        )
        .context("prepare latest snapshots query")?;
    let rows = stmt
        .query_map([], read_snapshot)
        .context("query latest snapshots")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode snapshot row")?);
    }
    Ok(out)
}

fn read_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeamSnapshot> {
    Ok(TeamSnapshot {
        team_id: row.get::<_, u32>(0)?,
        team_name: row.get(1)?,
        snapshot_date: row.get(2)?,
        taken_at: row.get(3)?,
        overall_score: row.get::<_, i32>(4)?,
        n_games: row.get::<_, u32>(5)?,
        patterns: row.get::<_, i64>(6)? as usize,
        setpieces: row.get::<_, i64>(7)? as usize,
        hubs: row.get::<_, i64>(8)? as usize,
        analysis_json: row.get(9)?,
    })
}

pub fn record_video_job(conn: &Connection, record: &VideoJobRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO video_jobs (job_id, source, sha256, status, error, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        ON CONFLICT(job_id) DO UPDATE SET
            source = excluded.source,
            sha256 = COALESCE(excluded.sha256, video_jobs.sha256),
            status = excluded.status,
            error = excluded.error,
            updated_at = excluded.updated_at
        "#,
        params![
            record.job_id,
            record.source,
            record.sha256,
            record.status,
            record.error,
            record.updated_at,
        ],
    )
    .context("record video job")?;
    Ok(())
}

/// Returns false when the job was never recorded.
pub fn update_video_status(
    conn: &Connection,
    job_id: &str,
    status: &str,
    error: Option<&str>,
) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE video_jobs SET status = ?2, error = ?3, updated_at = ?4 WHERE job_id = ?1",
            params![job_id, status, error, Utc::now().to_rfc3339()],
        )
        .context("update video job status")?;
    Ok(changed > 0)
}

pub fn find_video_by_sha(conn: &Connection, sha256: &str) -> Result<Option<VideoJobRecord>> {
    conn.query_row(
        r#"
        SELECT job_id, source, sha256, status, error, updated_at
        FROM video_jobs
        WHERE sha256 = ?1
        ORDER BY updated_at DESC
        LIMIT 1
        "#,
        params![sha256],
        read_video_job,
    )
    .optional()
    .context("query video job by sha")
}

pub fn recent_video_jobs(conn: &Connection, limit: usize) -> Result<Vec<VideoJobRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT job_id, source, sha256, status, error, updated_at
            FROM video_jobs
            ORDER BY updated_at DESC
            LIMIT ?1
            "#,
        )
        .context("prepare video jobs query")?;
    let rows = stmt
        .query_map(params![limit as i64], read_video_job)
        .context("query video jobs")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode video job row")?);
    }
    Ok(out)
}

fn read_video_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<VideoJobRecord> {
    Ok(VideoJobRecord {
        job_id: row.get(0)?,
        source: row.get(1)?,
        sha256: row.get(2)?,
        status: row.get(3)?,
        error: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
