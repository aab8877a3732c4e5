use crate::labels::zone_label;
use crate::models::{ChanceAnalysis, KeyMoment, MatchOutcome, MatchResult, TeamChances};

pub const DASH: &str = "—";

/// Matches worth reviewing for missed chances: draws and defeats of
/// `team_id`. Without a team every match is kept.
pub fn missed_chance_matches(matches: &[MatchResult], team_id: Option<u32>) -> Vec<&MatchResult> {
    matches
        .iter()
        .filter(|m| match team_id {
            None => true,
            Some(team) => !team_won(m, team),
        })
        .collect()
}

fn team_won(m: &MatchResult, team_id: u32) -> bool {
    match m.result {
        MatchOutcome::Draw => false,
        MatchOutcome::HomeWin => m.home_team_id == team_id,
        MatchOutcome::AwayWin => m.away_team_id == team_id,
        MatchOutcome::Unknown => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTone {
    Draw,
    Loss,
}

impl ResultTone {
    pub fn of(m: &MatchResult) -> Self {
        if m.result == MatchOutcome::Draw {
            ResultTone::Draw
        } else {
            ResultTone::Loss
        }
    }
}

/// Probabilities may arrive as 0..1 or already as percentages.
pub fn to_pct(value: Option<f64>) -> Option<f64> {
    let v = value.filter(|v| v.is_finite())?;
    Some(if v <= 1.0 { v * 100.0 } else { v })
}

pub fn chances_for(analysis: &ChanceAnalysis, team_id: u32) -> Option<&TeamChances> {
    analysis.chances.iter().find(|c| c.team_id == team_id)
}

pub fn chance_counts(analysis: &ChanceAnalysis) -> Vec<(String, usize)> {
    analysis
        .chances
        .iter()
        .map(|c| (c.team_name.clone(), c.key_moments.len()))
        .collect()
}

/// Display fields of a key moment, with dashes for anything missing.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentSummary {
    pub header: String,
    pub situation: String,
    pub distance: String,
    pub zone: String,
    pub failure: String,
    pub suggestion: String,
    pub actual_xg: Option<f64>,
    pub expected_xg: Option<f64>,
    pub xg_delta: String,
}

pub fn summarize_moment(moment: &KeyMoment) -> MomentSummary {
    let time = moment
        .time_display
        .clone()
        .unwrap_or_else(|| "no time info".to_string());
    let position = moment.player_position.as_deref().unwrap_or("FW");
    let header = format!("{} ({position}) · {time}", non_empty(&moment.player, "Unknown"));

    let situation = moment
        .original_situation
        .as_ref()
        .map(|s| s.description.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| non_empty(&moment.action, DASH).to_string());

    let distance = moment
        .original_situation
        .as_ref()
        .map(|s| s.distance_to_goal)
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| format!("{d:.1}m"))
        .unwrap_or_else(|| DASH.to_string());

    let zone = moment
        .original_situation
        .as_ref()
        .map(|s| s.zone.as_str())
        .filter(|z| !z.is_empty())
        .map(moment_zone_label)
        .unwrap_or_else(|| DASH.to_string());

    let failure = moment
        .failure_analysis
        .as_ref()
        .map(|f| {
            f.reasons
                .iter()
                .filter(|r| !r.is_empty())
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(" · ")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DASH.to_string());

    let suggestion = if moment.suggestion.description.is_empty() {
        let joined = moment.suggestion.reasons.join(" · ");
        non_empty(&joined, DASH).to_string()
    } else {
        moment.suggestion.description.clone()
    };

    let actual_xg = to_pct(moment.failure_analysis.as_ref().map(|f| f.xg));
    let expected_xg = to_pct(moment.suggestion.expected_xg);
    let xg_delta = match (actual_xg, expected_xg) {
        (Some(actual), Some(expected)) => {
            let delta = expected - actual;
            let sign = if delta > 0.0 { "+" } else { "" };
            format!("{sign}{delta:.1}%p")
        }
        _ => moment
            .suggestion
            .xg_improvement
            .clone()
            .unwrap_or_else(|| DASH.to_string()),
    };

    MomentSummary {
        header,
        situation,
        distance,
        zone,
        failure,
        suggestion,
        actual_xg,
        expected_xg,
        xg_delta,
    }
}

fn moment_zone_label(zone: &str) -> String {
    match zone {
        "left" => "Left".to_string(),
        "right" => "Right".to_string(),
        other => zone_label(other),
    }
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FailureAnalysis, Suggestion};

    fn result(home: u32, away: u32, outcome: MatchOutcome) -> MatchResult {
        MatchResult {
            home_team_id: home,
            away_team_id: away,
            result: outcome,
            ..MatchResult::default()
        }
    }

    #[test]
    fn keeps_draws_and_defeats_only() {
        let matches = vec![
            result(1, 2, MatchOutcome::HomeWin),
            result(2, 1, MatchOutcome::HomeWin),
            result(3, 1, MatchOutcome::AwayWin),
            result(1, 4, MatchOutcome::Draw),
        ];
        let kept = missed_chance_matches(&matches, Some(1));
        assert_eq!(kept.len(), 2);
        assert_eq!(ResultTone::of(kept[0]), ResultTone::Loss);
        assert_eq!(ResultTone::of(kept[1]), ResultTone::Draw);
        assert_eq!(missed_chance_matches(&matches, None).len(), 4);
    }

    #[test]
    fn pct_accepts_fractions_and_percentages() {
        assert_eq!(to_pct(Some(0.25)), Some(25.0));
        assert_eq!(to_pct(Some(1.0)), Some(100.0));
        assert_eq!(to_pct(Some(12.0)), Some(12.0));
        assert_eq!(to_pct(Some(f64::NAN)), None);
        assert_eq!(to_pct(None), None);
    }

    #[test]
    fn moment_summary_prefers_computed_delta() {
        let moment = KeyMoment {
            player: "Kim".to_string(),
            failure_analysis: Some(FailureAnalysis {
                reasons: vec!["tight angle".into(), String::new(), "weak foot".into(), "x".into()],
                xg: 0.08,
            }),
            suggestion: Suggestion {
                expected_xg: Some(0.21),
                xg_improvement: Some("+13%".into()),
                reasons: vec!["cut back".into(), "square ball".into()],
                ..Suggestion::default()
            },
            ..KeyMoment::default()
        };
        let summary = summarize_moment(&moment);
        assert_eq!(summary.xg_delta, "+13.0%p");
        assert_eq!(summary.failure, "tight angle · weak foot");
        assert_eq!(summary.suggestion, "cut back · square ball");
        assert_eq!(summary.distance, "—");
        assert_eq!(summary.header, "Kim (FW) · no time info");
    }
}
