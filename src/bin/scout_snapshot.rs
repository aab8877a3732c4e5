use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use matchday_scout::api::{ScoutApi, describe_error};
use matchday_scout::config::{ScoutConfig, load_dotenv};
use matchday_scout::feed::{self, ProviderContext};
use matchday_scout::report_store::{self, TeamSnapshot};

fn main() -> Result<()> {
    load_dotenv();
    let cfg = ScoutConfig::from_env();

    let db_path = parse_db_path_arg()
        .or_else(report_store::default_db_path)
        .context("unable to resolve sqlite path")?;
    let conn = report_store::open_db(&db_path)?;

    if let Some(team_id) = parse_history_arg() {
        return print_history(&conn, team_id);
    }
    if has_flag("--latest") {
        return print_latest(&conn);
    }
    if has_flag("--videos") {
        return print_video_jobs(&conn);
    }

    let api = ScoutApi::new(&cfg)?;
    let health = api
        .health()
        .map_err(|err| anyhow!("backend at {} not reachable: {}", cfg.api_base, describe_error(&err)))?;
    if !health.status.eq_ignore_ascii_case("ok") && !health.status.eq_ignore_ascii_case("healthy") {
        eprintln!("[WARN] backend reports status {:?}", health.status);
    }
    let standings = api
        .teams_overview()
        .map_err(|err| anyhow!("standings unavailable: {}", describe_error(&err)))?;
    if standings.stale {
        return Err(anyhow!("backend unreachable; refusing to archive cached data"));
    }
    let mut teams = standings.data.standings;
    if let Some(only) = parse_team_ids_arg() {
        teams.retain(|s| only.contains(&s.team_id));
    }
    if teams.is_empty() {
        return Err(anyhow!("no teams resolved for snapshot"));
    }

    let ctx = ProviderContext::with_api(api, cfg);
    let mut archived = 0usize;
    let mut failed = Vec::new();
    for team in &teams {
        let fetched = feed::fetch_bundle(&ctx, team.team_id);
        if fetched.all_failed() || fetched.bundle.stale {
            failed.push(format!("{} ({})", team.team_name, fetched.errors.join("; ")));
            continue;
        }
        let (analysis, source, _) = feed::resolve_analysis(&ctx, &fetched.bundle);
        let snap = TeamSnapshot::from_bundle(&team.team_name, &fetched.bundle, &analysis);
        report_store::upsert_snapshot(&conn, &snap)?;
        archived += 1;
        println!(
            "{:<24} score={:>3} patterns={} setpieces={} hubs={} source={source:?}",
            team.team_name, snap.overall_score, snap.patterns, snap.setpieces, snap.hubs
        );
    }

    println!("Snapshot complete");
    println!("DB: {}", db_path.display());
    println!("Teams archived: {archived}/{}", teams.len());
    if !failed.is_empty() {
        println!("  errors: {}", failed.len());
        for err in failed.iter().take(6) {
            println!("   - {err}");
        }
    }
    Ok(())
}

fn print_history(conn: &rusqlite::Connection, team_id: u32) -> Result<()> {
    let history = report_store::snapshot_history(conn, team_id, 30)?;
    if history.is_empty() {
        println!("No snapshots for team {team_id}");
        return Ok(());
    }
    println!("{} ({team_id})", history[0].team_name);
    for snap in &history {
        println!(
            "  {}  score={:>3}  games={}  patterns={} setpieces={} hubs={}",
            snap.snapshot_date, snap.overall_score, snap.n_games, snap.patterns, snap.setpieces,
            snap.hubs
        );
    }
    Ok(())
}

fn print_latest(conn: &rusqlite::Connection) -> Result<()> {
    let latest = report_store::latest_snapshots(conn)?;
    if latest.is_empty() {
        println!("No snapshots archived yet");
        return Ok(());
    }
    for (idx, snap) in latest.iter().enumerate() {
        println!(
            "{:>2}. {:<24} score={:>3}  as of {}",
            idx + 1,
            snap.team_name,
            snap.overall_score,
            snap.snapshot_date
        );
    }
    Ok(())
}

fn print_video_jobs(conn: &rusqlite::Connection) -> Result<()> {
    let jobs = report_store::recent_video_jobs(conn, 20)?;
    if jobs.is_empty() {
        println!("No video jobs recorded");
        return Ok(());
    }
    for job in &jobs {
        let hash = job.sha256.as_deref().map(|h| &h[..h.len().min(12)]).unwrap_or("-");
        println!(
            "{}  {:<8} {:<6} {hash}  {}",
            job.updated_at, job.job_id, job.status, job.source
        );
        if let Some(err) = &job.error {
            println!("    {err}");
        }
    }
    Ok(())
}

fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}

fn parse_db_path_arg() -> Option<PathBuf> {
    arg_value("--db").map(PathBuf::from)
}

fn parse_history_arg() -> Option<u32> {
    arg_value("--history").and_then(|raw| raw.trim().parse().ok())
}

fn parse_team_ids_arg() -> Option<Vec<u32>> {
    let ids = parse_ids(&arg_value("--teams")?);
    if ids.is_empty() { None } else { Some(ids) }
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_ids(raw: &str) -> Vec<u32> {
    let mut seen = HashSet::new();
    raw.split([',', ';', ' '])
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .filter(|id| *id != 0 && seen.insert(*id))
        .collect()
}
