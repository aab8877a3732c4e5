use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::labels::{
    ImpactTier, RankClass, SetPieceKind, format_sequence, pct, signed, swing_label, zone_label,
    zone_route,
};
use crate::models::{MatchResult, PressingTarget, TeamAnalysis, TeamStanding, VaepSummary};
use crate::state::{AnalysisSource, TeamBundle};

pub const SHEET_COUNT: usize = 6;

/// One team's data, gathered for a workbook or a printed report.
#[derive(Debug, Clone)]
pub struct TeamReport {
    pub team_id: u32,
    pub team_name: String,
    pub standings: Vec<TeamStanding>,
    pub bundle: TeamBundle,
    pub matches: Vec<MatchResult>,
    pub analysis: TeamAnalysis,
    pub analysis_source: AnalysisSource,
    pub vaep: Option<VaepSummary>,
    pub pressing_targets: Vec<PressingTarget>,
    pub fetch_errors: Vec<String>,
}

pub struct ExportSummary {
    pub sheets: usize,
    pub rows: usize,
}

pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

pub fn write_team_workbook(
    path: &Path,
    report: &TeamReport,
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<ExportSummary> {
    let sheets: [(&str, Vec<Vec<String>>); SHEET_COUNT] = [
        ("Standings", standings_rows(&report.standings)),
        ("Patterns", pattern_rows(&report.bundle)),
        ("SetPieces", setpiece_rows(&report.bundle)),
        ("Hubs", hub_rows(&report.bundle)),
        ("VAEP", vaep_rows(report.vaep.as_ref())),
        ("Analysis", analysis_rows(&report.analysis, report.analysis_source)),
    ];

    let mut workbook = Workbook::new();
    let mut rows = 0usize;
    for (idx, (name, sheet_rows)) in sheets.iter().enumerate() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, sheet_rows)?;
        rows += sheet_rows.len().saturating_sub(1);
        on_progress(ExportProgress {
            current: idx + 1,
            total: SHEET_COUNT,
            message: format!("Wrote {name}"),
        });
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportSummary {
        sheets: SHEET_COUNT,
        rows,
    })
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

pub fn standings_rows(standings: &[TeamStanding]) -> Vec<Vec<String>> {
    let total = standings.len() as u32;
    let mut rows = vec![header(&[
        "Rank", "Team", "Played", "W", "D", "L", "GF", "GA", "GD", "Points", "Form", "Zone",
    ])];
    for s in standings {
        rows.push(vec![
            s.rank.to_string(),
            s.team_name.clone(),
            s.played.to_string(),
            s.wins.to_string(),
            s.draws.to_string(),
            s.losses.to_string(),
            s.goals_for.to_string(),
            s.goals_against.to_string(),
            s.goal_diff.to_string(),
            s.points.to_string(),
            s.form.join(""),
            RankClass::classify(s.rank, total).tag().to_string(),
        ]);
    }
    rows
}

pub fn pattern_rows(bundle: &TeamBundle) -> Vec<Vec<String>> {
    let mut rows = vec![header(&[
        "Cluster",
        "Frequency",
        "Shot conversion",
        "Avg passes",
        "Avg duration (s)",
        "Forward progress",
        "Route",
        "Top sequence",
    ])];
    for p in &bundle.patterns {
        rows.push(vec![
            p.cluster_id.to_string(),
            p.frequency.to_string(),
            pct(p.shot_conversion_rate, 1),
            format!("{:.1}", p.avg_passes),
            format!("{:.1}", p.avg_duration),
            format!("{:.1}", p.avg_forward_progress),
            zone_route(&p.avg_start_zone, &p.avg_end_zone),
            p.common_sequences
                .first()
                .map(|s| format_sequence(s))
                .unwrap_or_default(),
        ]);
    }
    rows
}

pub fn setpiece_rows(bundle: &TeamBundle) -> Vec<Vec<String>> {
    let mut rows = vec![header(&[
        "Type",
        "Cluster",
        "Frequency",
        "Shot rate",
        "Zone",
        "Delivery",
        "Target x",
        "Target y",
        "Defending",
    ])];
    for r in &bundle.setpieces {
        rows.push(vec![
            SetPieceKind::from_type(&r.kind).label().to_string(),
            r.cluster_id.to_string(),
            r.frequency.to_string(),
            pct(r.shot_rate, 1),
            zone_label(&r.primary_zone),
            swing_label(&r.swing_type).to_string(),
            opt_to_string(r.avg_target_x.map(|x| format!("{x:.1}"))),
            opt_to_string(r.avg_target_y.map(|y| format!("{y:.1}"))),
            r.defense_suggestion.clone(),
        ]);
    }
    rows
}

pub fn hub_rows(bundle: &TeamBundle) -> Vec<Vec<String>> {
    let mut rows = vec![header(&[
        "Player ID",
        "Player",
        "Position",
        "Hub score",
        "Betweenness",
        "PageRank",
        "Passes made",
        "Passes received",
        "Disruption impact",
    ])];
    for h in &bundle.hubs {
        rows.push(vec![
            h.player_id.to_string(),
            h.player_name.clone(),
            h.main_position.clone(),
            format!("{:.3}", h.hub_score),
            format!("{:.3}", h.betweenness),
            format!("{:.3}", h.pagerank),
            h.passes_made.to_string(),
            h.passes_received.to_string(),
            format!("{:.0}", h.disruption_impact.impact_score),
        ]);
    }
    rows
}

pub fn vaep_rows(vaep: Option<&VaepSummary>) -> Vec<Vec<String>> {
    let mut rows = vec![header(&[
        "Player ID",
        "Player",
        "Position",
        "Actions",
        "Total VAEP",
        "Per action",
        "Offensive",
        "Defensive",
        "Passing",
    ])];
    let Some(vaep) = vaep else {
        return rows;
    };
    for p in &vaep.top_players {
        rows.push(vec![
            p.player_id.to_string(),
            p.player_name.clone(),
            p.position.clone(),
            p.actions.to_string(),
            format!("{:.3}", p.total_vaep),
            format!("{:.4}", p.avg_vaep),
            format!("{:.3}", p.offensive_vaep),
            format!("{:.3}", p.defensive_vaep),
            format!("{:.3}", p.passing_vaep),
        ]);
    }
    rows
}

pub fn analysis_rows(analysis: &TeamAnalysis, source: AnalysisSource) -> Vec<Vec<String>> {
    let mut rows = vec![header(&["Kind", "Category", "Title", "Detail", "Score"])];
    rows.push(vec![
        "Overall".to_string(),
        source_label(source).to_string(),
        String::new(),
        analysis.summary.clone(),
        analysis.overall_score.to_string(),
    ]);
    for (kind, items) in [("Strength", &analysis.strengths), ("Weakness", &analysis.weaknesses)] {
        for item in items {
            rows.push(vec![
                kind.to_string(),
                item.category.clone(),
                item.title.clone(),
                item.description.clone(),
                item.score.to_string(),
            ]);
        }
    }
    for insight in &analysis.insights {
        rows.push(vec![
            "Insight".to_string(),
            String::new(),
            String::new(),
            insight.clone(),
            String::new(),
        ]);
    }
    rows
}

fn source_label(source: AnalysisSource) -> &'static str {
    match source {
        AnalysisSource::Backend => "backend",
        AnalysisSource::Client => "local",
    }
}

/// Plain-text scouting report for the terminal.
pub fn render_text_report(report: &TeamReport) -> String {
    let mut out = String::new();
    let analysis = &report.analysis;
    let _ = writeln!(out, "{} (id {})", report.team_name, report.team_id);
    if let Some(s) = report.standings.iter().find(|s| s.team_id == report.team_id) {
        let _ = writeln!(
            out,
            "  #{} · {} pts · {}W {}D {}L · GD {:+}",
            s.rank, s.points, s.wins, s.draws, s.losses, s.goal_diff
        );
    }
    let _ = writeln!(
        out,
        "  Overall {}/100 ({} analysis)",
        analysis.overall_score,
        source_label(report.analysis_source)
    );
    let _ = writeln!(out, "  {}", analysis.summary);

    let _ = writeln!(out, "\nStrengths");
    for item in &analysis.strengths {
        let _ = writeln!(out, "  [{:>3}] {} · {}", item.score, item.category, item.title);
    }
    let _ = writeln!(out, "Weaknesses");
    for item in &analysis.weaknesses {
        let _ = writeln!(out, "  [{:>3}] {} · {}", item.score, item.category, item.title);
    }

    if !report.bundle.patterns.is_empty() {
        let _ = writeln!(out, "\nAttacking patterns");
        for p in &report.bundle.patterns {
            let _ = writeln!(
                out,
                "  #{} x{} · conv {} · {}",
                p.cluster_id,
                p.frequency,
                pct(p.shot_conversion_rate, 1),
                zone_route(&p.avg_start_zone, &p.avg_end_zone)
            );
        }
    }
    if !report.bundle.setpieces.is_empty() {
        let _ = writeln!(out, "\nSet pieces");
        for r in &report.bundle.setpieces {
            let _ = writeln!(
                out,
                "  {} x{} · shots {} · {}",
                SetPieceKind::from_type(&r.kind).label(),
                r.frequency,
                pct(r.shot_rate, 1),
                swing_label(&r.swing_type)
            );
        }
    }
    if !report.bundle.hubs.is_empty() {
        let _ = writeln!(out, "\nNetwork hubs");
        for h in &report.bundle.hubs {
            let _ = writeln!(
                out,
                "  {} ({}) · score {:.3} · impact {:.0}",
                h.player_name, h.main_position, h.hub_score, h.disruption_impact.impact_score
            );
        }
    }
    if let Some(vaep) = &report.vaep
        && !vaep.top_players.is_empty()
    {
        let _ = writeln!(out, "\nTop VAEP");
        for p in vaep.top_players.iter().take(5) {
            let _ = writeln!(out, "  {} · {:.3}", p.player_name, p.total_vaep);
        }
    }
    if !report.pressing_targets.is_empty() {
        let _ = writeln!(out, "\nPressing targets");
        for target in &report.pressing_targets {
            let sim = &target.pressing_simulation;
            let _ = writeln!(
                out,
                "  {} · {} · pass success {}pp",
                target.hub.player_name,
                ImpactTier::from_score(target.hub.disruption_impact.impact_score).label(),
                signed(-sim.success_drop_pp(), 1)
            );
            for step in target.vulnerability_chain.steps() {
                if !step.action.is_empty() {
                    let _ = writeln!(out, "    - {} → {}", step.action, step.expected_result);
                }
            }
        }
    }
    for err in &report.fetch_errors {
        let _ = writeln!(out, "[WARN] {err}");
    }
    out
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChainStep, DisruptionImpact, Hub, Pattern, PressingSimulation, Scenario, ScoredItem,
        SetPieceRoutine, VulnerabilityChain,
    };

    fn report() -> TeamReport {
        let mut bundle = TeamBundle::new(4);
        bundle.patterns = vec![Pattern {
            cluster_id: 2,
            frequency: 14,
            shot_conversion_rate: 0.125,
            avg_start_zone: "defensive_third".to_string(),
            avg_end_zone: "final_third".to_string(),
            ..Pattern::default()
        }];
        bundle.setpieces = vec![SetPieceRoutine {
            kind: "Corner".to_string(),
            frequency: 9,
            shot_rate: 0.3,
            swing_type: "inswing".to_string(),
            ..SetPieceRoutine::default()
        }];
        TeamReport {
            team_id: 4,
            team_name: "Ulsan".to_string(),
            standings: vec![TeamStanding {
                team_id: 4,
                team_name: "Ulsan".to_string(),
                rank: 1,
                points: 40,
                ..TeamStanding::default()
            }],
            bundle,
            matches: Vec::new(),
            analysis: TeamAnalysis {
                team_id: 4,
                overall_score: 66,
                strengths: vec![ScoredItem {
                    category: "Attack".to_string(),
                    title: "Direct play".to_string(),
                    score: 80,
                    ..ScoredItem::default()
                }],
                summary: "Strong in Direct play.".to_string(),
                ..TeamAnalysis::default()
            },
            analysis_source: AnalysisSource::Client,
            vaep: None,
            pressing_targets: Vec::new(),
            fetch_errors: vec!["network: API Error: 500".to_string()],
        }
    }

    #[test]
    fn sheet_rows_have_headers_and_data() {
        let report = report();
        assert_eq!(pattern_rows(&report.bundle).len(), 2);
        assert_eq!(pattern_rows(&report.bundle)[1][2], "12.5%");
        assert_eq!(setpiece_rows(&report.bundle)[1][0], "Corner");
        assert_eq!(vaep_rows(None).len(), 1);
        let analysis = analysis_rows(&report.analysis, report.analysis_source);
        assert_eq!(analysis[0][0], "Kind");
        assert_eq!(analysis[1][1], "local");
        assert_eq!(analysis[2][0], "Strength");
    }

    #[test]
    fn text_report_mentions_key_sections() {
        let text = render_text_report(&report());
        assert!(text.starts_with("Ulsan (id 4)"));
        assert!(text.contains("Overall 66/100 (local analysis)"));
        assert!(text.contains("Attacking patterns"));
        assert!(text.contains("[WARN] network: API Error: 500"));
    }

    #[test]
    fn text_report_lists_pressing_targets() {
        let mut report = report();
        report.pressing_targets = vec![PressingTarget {
            hub: Hub {
                player_name: "Lee".to_string(),
                disruption_impact: DisruptionImpact {
                    impact_score: 72.0,
                    ..DisruptionImpact::default()
                },
                ..Hub::default()
            },
            pressing_simulation: PressingSimulation {
                scenario_a: Scenario {
                    pass_success_rate: 0.86,
                    ..Scenario::default()
                },
                scenario_b: Scenario {
                    pass_success_rate: 0.61,
                    ..Scenario::default()
                },
                ..PressingSimulation::default()
            },
            vulnerability_chain: VulnerabilityChain {
                step1: ChainStep {
                    action: "Press Lee".to_string(),
                    expected_result: "Forced back pass".to_string(),
                },
                ..VulnerabilityChain::default()
            },
            summary: String::new(),
        }];
        let text = render_text_report(&report);
        assert!(text.contains("Pressing targets"));
        assert!(text.contains("Lee · Primary target · pass success -25.0pp"));
        assert!(text.contains("Press Lee → Forced back pass"));
        assert_eq!(text.matches("    - ").count(), 1);
    }

    #[test]
    fn workbook_reports_progress_per_sheet() {
        let dir = std::env::temp_dir().join(format!("scout_export_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("team.xlsx");
        let mut steps = Vec::new();
        let summary = write_team_workbook(&path, &report(), |p| steps.push(p.current))
            .expect("workbook written");
        assert_eq!(summary.sheets, SHEET_COUNT);
        assert_eq!(summary.rows, 1 + 1 + 1 + 2);
        assert_eq!(steps, vec![1, 2, 3, 4, 5, 6]);
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
