use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use matchday_scout::api::{ScoutApi, describe_error};
use matchday_scout::config::{ScoutConfig, load_dotenv};
use matchday_scout::feed::{self, ProviderContext};
use matchday_scout::labels::ImpactTier;
use matchday_scout::models::ConnectionKind;
use matchday_scout::report_export;

const VALUE_FLAGS: &[&str] = &["--xlsx", "--hub"];

fn main() -> Result<()> {
    load_dotenv();
    let cfg = ScoutConfig::from_env();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let team_id = positional(&args, VALUE_FLAGS)
        .into_iter()
        .next()
        .context("usage: scout_report <team_id> [--xlsx path] [--hub player_id]")?
        .parse::<u32>()
        .map_err(|_| anyhow!("team id must be a number"))?;
    let xlsx = parse_flag(&args, "--xlsx").map(PathBuf::from);
    let hub = parse_flag(&args, "--hub")
        .map(|raw| raw.parse::<u64>().map_err(|_| anyhow!("hub must be a player id")))
        .transpose()?;

    let ctx = ProviderContext::with_api(ScoutApi::new(&cfg)?, cfg);
    let report = feed::gather_team_report(&ctx, team_id)?;
    print!("{}", report_export::render_text_report(&report));

    if let Some(player_id) = hub {
        print_hub_detail(&ctx, team_id, player_id);
    }

    if let Some(path) = xlsx {
        let summary = report_export::write_team_workbook(&path, &report, |progress| {
            eprintln!("[{}/{}] {}", progress.current, progress.total, progress.message);
        })?;
        println!(
            "Workbook: {} ({} sheets, {} rows)",
            path.display(),
            summary.sheets,
            summary.rows
        );
    }
    Ok(())
}

fn print_hub_detail(ctx: &ProviderContext, team_id: u32, player_id: u64) {
    let detail = match ctx.api.hub_detail(team_id, player_id, ctx.cfg.n_games) {
        Ok(resp) => resp.data,
        Err(err) => {
            eprintln!("[WARN] Hub {player_id}: {}", describe_error(&err));
            return;
        }
    };
    let impact = &detail.disruption_impact;
    println!("\nHub {} ({})", detail.player_name, detail.position);
    println!(
        "  {} · impact {:.0} · {} edges removed",
        ImpactTier::from_score(impact.impact_score).label(),
        impact.impact_score,
        impact.edges_removed
    );
    if !impact.description.is_empty() {
        println!("  {}", impact.description);
    }
    for conn in &detail.key_connections {
        let arrow = match conn.kind {
            ConnectionKind::ReceivesFrom => "<-",
            _ => "->",
        };
        println!("  {arrow} {} ({}) x{}", conn.player_name, conn.position, conn.count);
    }
}

/// Arguments that are neither flags nor the value following a flag.
fn positional<'a>(args: &'a [String], value_flags: &[&str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = value_flags.contains(&arg.as_str());
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            return Some(value.trim().to_string());
        }
        if arg == flag {
            return args.get(idx + 1).map(|v| v.trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn team_id_is_found_after_flag_values() {
        let argv = args(&["--xlsx", "out.xlsx", "3"]);
        assert_eq!(positional(&argv, VALUE_FLAGS), vec!["3"]);
        assert_eq!(parse_flag(&argv, "--xlsx").as_deref(), Some("out.xlsx"));

        let argv = args(&["--hub", "103", "--xlsx=out.xlsx", "7"]);
        assert_eq!(positional(&argv, VALUE_FLAGS), vec!["7"]);
        assert_eq!(parse_flag(&argv, "--hub").as_deref(), Some("103"));

        let argv = args(&["4", "--xlsx", "out.xlsx"]);
        assert_eq!(positional(&argv, VALUE_FLAGS), vec!["4"]);
    }

    #[test]
    fn missing_team_id_yields_nothing() {
        assert!(positional(&args(&["--xlsx", "out.xlsx"]), VALUE_FLAGS).is_empty());
    }
}
