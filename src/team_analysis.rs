use std::collections::HashSet;

use crate::models::{Hub, Pattern, ScoredItem, SetPieceRoutine, TeamAnalysis};

pub const CATEGORY_ATTACK: &str = "Attack";
pub const CATEGORY_SET_PIECES: &str = "Set pieces";
pub const CATEGORY_BUILD_UP: &str = "Build-up";

const MAX_LISTED: usize = 3;
const MAX_INSIGHTS: usize = 4;
const NEUTRAL_SCORE: i32 = 50;

/// Client-side strengths/weaknesses report, used when the backend's
/// `/analysis` endpoint is unavailable. Deterministic for identical input.
pub fn build_team_analysis(
    team_id: u32,
    patterns: &[Pattern],
    setpieces: &[SetPieceRoutine],
    hubs: &[Hub],
) -> TeamAnalysis {
    let mut strengths: Vec<ScoredItem> = Vec::new();
    let mut weaknesses: Vec<ScoredItem> = Vec::new();

    if !patterns.is_empty() {
        assess_patterns(patterns, &mut strengths, &mut weaknesses);
    }
    if !setpieces.is_empty() {
        assess_setpieces(setpieces, &mut strengths, &mut weaknesses);
    }
    if !hubs.is_empty() {
        assess_hubs(hubs, &mut strengths, &mut weaknesses);
    }

    let mut insights = Vec::new();
    if let Some(top) = top_strength(&strengths) {
        insights.push(format!("Biggest strength: {}", top.title));
    }
    if let Some(worst) = top_weakness(&weaknesses) {
        insights.push(format!("Needs work: {}", worst.title));
    }
    if patterns.len() >= 3 {
        insights.push(format!("{} main attacking patterns", patterns.len()));
    }
    if !setpieces.is_empty() {
        insights.push(format!("{} set-piece routines analysed", setpieces.len()));
    }
    insights.truncate(MAX_INSIGHTS);

    let all_scores: Vec<f64> = strengths
        .iter()
        .chain(weaknesses.iter())
        .map(|item| f64::from(item.score))
        .collect();
    let overall_score = if all_scores.is_empty() {
        NEUTRAL_SCORE
    } else {
        mean(&all_scores).floor() as i32
    };

    // Stable sorts: equal scores keep insertion order.
    strengths.sort_by(|a, b| b.score.cmp(&a.score));
    weaknesses.sort_by(|a, b| a.score.cmp(&b.score));
    let summary = summarize(&strengths, &weaknesses);
    strengths.truncate(MAX_LISTED);
    weaknesses.truncate(MAX_LISTED);

    TeamAnalysis {
        team_id,
        overall_score,
        strengths,
        weaknesses,
        insights,
        summary,
    }
}

fn assess_patterns(
    patterns: &[Pattern],
    strengths: &mut Vec<ScoredItem>,
    weaknesses: &mut Vec<ScoredItem>,
) {
    let max_rate = patterns
        .iter()
        .map(|p| finite(p.shot_conversion_rate))
        .fold(f64::NEG_INFINITY, f64::max);
    let total_frequency: u64 = patterns.iter().map(|p| u64::from(p.frequency)).sum();

    if max_rate > 0.25 {
        strengths.push(item(
            CATEGORY_ATTACK,
            "High shot conversion",
            format!(
                "Dangerous attacking pattern converting up to {:.0}% into shots",
                max_rate * 100.0
            ),
            score_clamp(max_rate * 300.0, 0, 100),
        ));
    } else if max_rate < 0.1 {
        weaknesses.push(item(
            CATEGORY_ATTACK,
            "Low finishing",
            format!(
                "Attacking patterns convert only {:.0}% into shots",
                max_rate * 100.0
            ),
            score_clamp(max_rate * 300.0, 20, 100),
        ));
    }

    if total_frequency > 500 {
        strengths.push(item(
            CATEGORY_ATTACK,
            "Varied attacking routes",
            format!("{total_frequency} varied attacking attempts"),
            score_clamp(total_frequency as f64 / 8.0, 0, 100),
        ));
    }

    if patterns.len() < 4 {
        weaknesses.push(item(
            CATEGORY_ATTACK,
            "Limited pattern variety",
            format!("Only {} attacking routes identified", patterns.len()),
            50,
        ));
    }

    let durations: Vec<f64> = patterns.iter().map(|p| p.avg_duration).collect();
    let avg_duration = mean(&durations);
    if avg_duration > 40.0 {
        weaknesses.push(item(
            CATEGORY_ATTACK,
            "Slow build-up tempo",
            format!(
                "Build-up averages {avg_duration:.0}s, exposed to counter-attacks"
            ),
            55,
        ));
    }
}

fn assess_setpieces(
    setpieces: &[SetPieceRoutine],
    strengths: &mut Vec<ScoredItem>,
    weaknesses: &mut Vec<ScoredItem>,
) {
    let corner_rates: Vec<f64> = setpieces
        .iter()
        .filter(|s| s.is_corner())
        .map(|s| s.shot_rate)
        .collect();
    let freekick_rates: Vec<f64> = setpieces
        .iter()
        .filter(|s| s.is_freekick())
        .map(|s| s.shot_rate)
        .collect();

    if !corner_rates.is_empty() {
        let rate = mean(&corner_rates);
        if rate > 0.3 {
            strengths.push(item(
                CATEGORY_SET_PIECES,
                "Corner threat",
                format!("{:.0}% of corners end in a shot", rate * 100.0),
                score_clamp(rate * 200.0, 0, 100),
            ));
        } else if rate < 0.15 {
            weaknesses.push(item(
                CATEGORY_SET_PIECES,
                "Inefficient corners",
                format!("Corner shot conversion at {:.0}%, room to improve", rate * 100.0),
                score_clamp(rate * 200.0, 20, 100),
            ));
        }
    }

    if !freekick_rates.is_empty() {
        let rate = mean(&freekick_rates);
        if rate > 0.25 {
            strengths.push(item(
                CATEGORY_SET_PIECES,
                "Free-kick specialists",
                format!("{:.0}% of free kicks end in a shot", rate * 100.0),
                score_clamp(rate * 200.0, 0, 100),
            ));
        }
        if rate < 0.2 {
            weaknesses.push(item(
                CATEGORY_SET_PIECES,
                "Underused free kicks",
                format!("Free-kick shot conversion at {:.0}%", rate * 100.0),
                40,
            ));
        }
    }
}

fn assess_hubs(hubs: &[Hub], strengths: &mut Vec<ScoredItem>, weaknesses: &mut Vec<ScoredItem>) {
    let top = &hubs[0];
    let hub_score = finite(top.hub_score);
    let passes_made = top.passes_made;

    if hub_score > 0.8 {
        let name = if top.player_name.is_empty() {
            "Player"
        } else {
            top.player_name.as_str()
        };
        strengths.push(item(
            CATEGORY_BUILD_UP,
            "Key playmaker",
            format!("{name} orchestrates the attack"),
            score_clamp(hub_score * 100.0, 0, 100),
        ));
    }

    if passes_made > 400 {
        strengths.push(item(
            CATEGORY_BUILD_UP,
            "Stable circulation",
            format!("Main hub dictates play with {passes_made} passes"),
            score_clamp(f64::from(passes_made) / 5.0, 0, 100),
        ));
    }

    if hubs.len() >= 2 {
        let first = finite(hubs[0].hub_score);
        let second = finite(hubs[1].hub_score);
        if first > second * 1.5 {
            weaknesses.push(item(
                CATEGORY_BUILD_UP,
                "Hub dependency",
                format!("Over-reliant on top hub {}", hubs[0].player_name),
                45,
            ));
        }

        let received_first = f64::from(hubs[0].passes_received);
        let received_second = f64::from(hubs[1].passes_received).max(1.0);
        if received_first / received_second > 1.8 {
            weaknesses.push(item(
                CATEGORY_BUILD_UP,
                "Predictable passing lanes",
                "Passes funnel to one player, vulnerable to a targeted press".to_string(),
                50,
            ));
        }
    }
}

fn top_strength(items: &[ScoredItem]) -> Option<&ScoredItem> {
    let mut best: Option<&ScoredItem> = None;
    for candidate in items {
        if best.is_none_or(|b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    best
}

fn top_weakness(items: &[ScoredItem]) -> Option<&ScoredItem> {
    let mut worst: Option<&ScoredItem> = None;
    for candidate in items {
        if worst.is_none_or(|w| candidate.score < w.score) {
            worst = Some(candidate);
        }
    }
    worst
}

fn summarize(strengths: &[ScoredItem], weaknesses: &[ScoredItem]) -> String {
    if strengths.is_empty() && weaknesses.is_empty() {
        return "Not enough data to analyse.".to_string();
    }
    let mut parts = Vec::new();
    if !strengths.is_empty() {
        parts.push(format!("Strong in {}", distinct_categories(strengths).join(", ")));
    }
    if !weaknesses.is_empty() {
        parts.push(format!(
            "Needs work in {}",
            distinct_categories(weaknesses).join(", ")
        ));
    }
    format!("{}.", parts.join(". "))
}

fn distinct_categories(items: &[ScoredItem]) -> Vec<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|item| item.category.as_str())
        .filter(|category| seen.insert(*category))
        .collect()
}

fn item(category: &str, title: &str, description: String, score: i32) -> ScoredItem {
    ScoredItem {
        category: category.to_string(),
        title: title.to_string(),
        description,
        score,
    }
}

fn score_clamp(value: f64, min: i32, max: i32) -> i32 {
    let floored = finite(value).floor();
    (floored as i32).clamp(min, max)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| finite(*v)).sum::<f64>() / values.len() as f64
}

fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(rate: f64, frequency: u32, avg_duration: f64) -> Pattern {
        Pattern {
            shot_conversion_rate: rate,
            frequency,
            avg_duration,
            ..Pattern::default()
        }
    }

    fn routine(kind: &str, shot_rate: f64) -> SetPieceRoutine {
        SetPieceRoutine {
            kind: kind.to_string(),
            shot_rate,
            ..SetPieceRoutine::default()
        }
    }

    fn hub(name: &str, hub_score: f64, passes_made: u32, passes_received: u32) -> Hub {
        Hub {
            player_name: name.to_string(),
            hub_score,
            passes_made,
            passes_received,
            ..Hub::default()
        }
    }

    fn titles(items: &[ScoredItem]) -> Vec<(&str, i32)> {
        items.iter().map(|i| (i.title.as_str(), i.score)).collect()
    }

    #[test]
    fn no_data_gives_neutral_report() {
        let analysis = build_team_analysis(5, &[], &[], &[]);
        assert_eq!(analysis.team_id, 5);
        assert_eq!(analysis.overall_score, NEUTRAL_SCORE);
        assert!(analysis.strengths.is_empty());
        assert!(analysis.weaknesses.is_empty());
        assert!(analysis.insights.is_empty());
        assert_eq!(analysis.summary, "Not enough data to analyse.");
    }

    #[test]
    fn middling_numbers_trigger_no_rule() {
        let patterns = vec![pattern(0.1875, 10, 10.0); 4];
        let setpieces = vec![routine("Corner", 0.25), routine("Freekick", 0.21875)];
        let hubs = vec![hub("Park", 0.5, 100, 100), hub("Choi", 0.4, 90, 90)];
        let analysis = build_team_analysis(1, &patterns, &setpieces, &hubs);
        assert!(analysis.strengths.is_empty());
        assert!(analysis.weaknesses.is_empty());
        assert_eq!(analysis.overall_score, NEUTRAL_SCORE);
        assert_eq!(
            analysis.insights,
            vec!["4 main attacking patterns", "2 set-piece routines analysed"]
        );
    }

    #[test]
    fn sharp_varied_attack_is_a_strength() {
        let patterns = vec![
            pattern(0.3125, 150, 20.0),
            pattern(0.1, 150, 20.0),
            pattern(0.125, 150, 20.0),
            pattern(0.2, 150, 20.0),
        ];
        let analysis = build_team_analysis(1, &patterns, &[], &[]);
        assert_eq!(
            titles(&analysis.strengths),
            vec![("High shot conversion", 93), ("Varied attacking routes", 75)]
        );
        assert!(analysis.weaknesses.is_empty());
        assert_eq!(analysis.overall_score, 84);
        assert_eq!(
            analysis.insights,
            vec![
                "Biggest strength: High shot conversion",
                "4 main attacking patterns"
            ]
        );
        assert_eq!(analysis.summary, "Strong in Attack.");
        assert!(analysis.strengths[0].description.contains("31%"));
    }

    #[test]
    fn blunt_slow_attack_collects_weaknesses() {
        let patterns = vec![pattern(0.0625, 10, 45.0), pattern(0.03125, 10, 50.0)];
        let analysis = build_team_analysis(1, &patterns, &[], &[]);
        assert!(analysis.strengths.is_empty());
        assert_eq!(
            titles(&analysis.weaknesses),
            vec![
                ("Low finishing", 20),
                ("Limited pattern variety", 50),
                ("Slow build-up tempo", 55)
            ]
        );
        assert_eq!(analysis.overall_score, 41);
        assert_eq!(analysis.insights, vec!["Needs work: Low finishing"]);
        assert_eq!(analysis.summary, "Needs work in Attack.");
    }

    #[test]
    fn set_piece_thresholds() {
        let setpieces = vec![
            routine("Corner", 0.5),
            routine("Corner", 0.25),
            routine("Freekick", 0.125),
        ];
        let analysis = build_team_analysis(1, &[], &setpieces, &[]);
        assert_eq!(titles(&analysis.strengths), vec![("Corner threat", 75)]);
        assert_eq!(titles(&analysis.weaknesses), vec![("Underused free kicks", 40)]);
        assert_eq!(analysis.overall_score, 57);
        assert_eq!(analysis.insights[2], "3 set-piece routines analysed");

        let setpieces = vec![routine("Corner", 0.0625), routine("Freekick", 0.5)];
        let analysis = build_team_analysis(1, &[], &setpieces, &[]);
        assert_eq!(titles(&analysis.strengths), vec![("Free-kick specialists", 100)]);
        assert_eq!(titles(&analysis.weaknesses), vec![("Inefficient corners", 20)]);
        assert_eq!(analysis.summary, "Strong in Set pieces. Needs work in Set pieces.");
    }

    #[test]
    fn dominant_hub_is_both_strength_and_risk() {
        let hubs = vec![hub("Park", 0.875, 450, 200), hub("Choi", 0.5, 300, 100)];
        let analysis = build_team_analysis(1, &[], &[], &hubs);
        assert_eq!(
            titles(&analysis.strengths),
            vec![("Stable circulation", 90), ("Key playmaker", 87)]
        );
        assert_eq!(
            titles(&analysis.weaknesses),
            vec![("Hub dependency", 45), ("Predictable passing lanes", 50)]
        );
        assert_eq!(analysis.strengths[1].description, "Park orchestrates the attack");
        assert_eq!(analysis.overall_score, 68);
        assert_eq!(
            analysis.insights,
            vec!["Biggest strength: Stable circulation", "Needs work: Hub dependency"]
        );
        assert_eq!(analysis.summary, "Strong in Build-up. Needs work in Build-up.");

        // A second hub with no received passes counts as one.
        let hubs = vec![hub("Park", 0.5, 100, 2), hub("Choi", 0.5, 100, 0)];
        let analysis = build_team_analysis(1, &[], &[], &hubs);
        assert_eq!(titles(&analysis.weaknesses), vec![("Predictable passing lanes", 50)]);
    }

    #[test]
    fn lists_truncate_after_sorting_and_summary_sees_everything() {
        let patterns = vec![pattern(0.3125, 150, 20.0); 4];
        let setpieces = vec![routine("Corner", 0.375), routine("Freekick", 0.5)];
        let hubs = vec![hub("Park", 0.875, 450, 200)];
        let analysis = build_team_analysis(1, &patterns, &setpieces, &hubs);
        assert_eq!(
            titles(&analysis.strengths),
            vec![
                ("Free-kick specialists", 100),
                ("High shot conversion", 93),
                ("Stable circulation", 90)
            ]
        );
        assert_eq!(analysis.overall_score, 86);
        assert_eq!(analysis.summary, "Strong in Set pieces, Attack, Build-up.");

        let patterns = vec![
            pattern(0.0625, 10, 45.0),
            pattern(0.03125, 10, 45.0),
            pattern(0.0, 10, 45.0),
        ];
        let setpieces = vec![routine("Corner", 0.0625), routine("Freekick", 0.125)];
        let hubs = vec![hub("Park", 0.875, 100, 100), hub("Choi", 0.5, 100, 100)];
        let analysis = build_team_analysis(1, &patterns, &setpieces, &hubs);
        assert_eq!(
            titles(&analysis.weaknesses),
            vec![
                ("Low finishing", 20),
                ("Inefficient corners", 20),
                ("Underused free kicks", 40)
            ]
        );
        assert_eq!(
            analysis.summary,
            "Strong in Build-up. Needs work in Attack, Set pieces, Build-up."
        );
        assert_eq!(analysis.overall_score, 45);
        assert_eq!(
            analysis.insights,
            vec![
                "Biggest strength: Key playmaker",
                "Needs work: Low finishing",
                "3 main attacking patterns",
                "2 set-piece routines analysed"
            ]
        );
        assert!(analysis.insights.len() <= MAX_INSIGHTS);
    }

    #[test]
    fn clamp_floors_before_bounding() {
        assert_eq!(score_clamp(87.9, 0, 100), 87);
        assert_eq!(score_clamp(3.0, 20, 100), 20);
        assert_eq!(score_clamp(412.0, 0, 100), 100);
        assert_eq!(score_clamp(f64::NAN, 20, 100), 20);
    }

    #[test]
    fn mean_treats_non_finite_as_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, f64::INFINITY, 2.0]), 1.0);
    }

    #[test]
    fn summary_lists_categories_once() {
        let strengths = vec![
            item(CATEGORY_ATTACK, "a", String::new(), 90),
            item(CATEGORY_ATTACK, "b", String::new(), 80),
            item(CATEGORY_BUILD_UP, "c", String::new(), 70),
        ];
        let weaknesses = vec![item(CATEGORY_SET_PIECES, "d", String::new(), 40)];
        assert_eq!(
            summarize(&strengths, &weaknesses),
            "Strong in Attack, Build-up. Needs work in Set pieces."
        );
        assert_eq!(summarize(&[], &[]), "Not enough data to analyse.");
    }

    #[test]
    fn ties_keep_the_first_item() {
        let items = vec![
            item(CATEGORY_ATTACK, "first", String::new(), 50),
            item(CATEGORY_ATTACK, "second", String::new(), 50),
        ];
        assert_eq!(top_strength(&items).map(|i| i.title.as_str()), Some("first"));
        assert_eq!(top_weakness(&items).map(|i| i.title.as_str()), Some("first"));
    }
}
