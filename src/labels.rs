//! Display strings and tiers derived from raw backend fields.

/// `0.234` -> `"23.4%"` with `decimals` digits.
pub fn pct(rate: f64, decimals: usize) -> String {
    if !rate.is_finite() {
        return "--".to_string();
    }
    format!("{:.*}%", decimals, rate * 100.0)
}

pub fn zone_label(zone: &str) -> String {
    match zone {
        "near_post" => "Near post",
        "far_post" => "Far post",
        "central" | "center" => "Central",
        "edge_of_box" | "edge_box" => "Edge of box",
        "penalty_spot" => "Penalty spot",
        "six_yard" => "Six-yard box",
        "unknown" | "Unknown" | "" => "Undecided",
        other => other,
    }
    .to_string()
}

pub fn swing_label(swing: &str) -> &'static str {
    match swing {
        "inswing" => "Inswing",
        "outswing" => "Outswing",
        _ => "Other",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPieceKind {
    Corner,
    FreeKick,
}

impl SetPieceKind {
    pub fn from_type(kind: &str) -> Self {
        if kind.contains("Corner") {
            SetPieceKind::Corner
        } else {
            SetPieceKind::FreeKick
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SetPieceKind::Corner => "Corner",
            SetPieceKind::FreeKick => "Free kick",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactTier {
    Primary,
    Effective,
    Secondary,
}

impl ImpactTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            ImpactTier::Primary
        } else if score >= 40.0 {
            ImpactTier::Effective
        } else {
            ImpactTier::Secondary
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImpactTier::Primary => "Primary target",
            ImpactTier::Effective => "Effective target",
            ImpactTier::Secondary => "Secondary target",
        }
    }
}

/// Hot/warm/cold shading used for conversion and shot rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heat {
    Hot,
    Warm,
    Cold,
}

impl Heat {
    pub fn for_conversion(rate: f64) -> Self {
        Self::banded(rate, 0.2, 0.1)
    }

    pub fn for_setpiece_shots(rate: f64) -> Self {
        Self::banded(rate, 0.3, 0.15)
    }

    fn banded(rate: f64, hot: f64, warm: f64) -> Self {
        if rate >= hot {
            Heat::Hot
        } else if rate >= warm {
            Heat::Warm
        } else {
            Heat::Cold
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    Good,
    Fair,
    Poor,
}

impl ScoreTier {
    pub fn from_score(score: i32) -> Self {
        if score >= 70 {
            ScoreTier::Good
        } else if score >= 50 {
            ScoreTier::Fair
        } else {
            ScoreTier::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankClass {
    Gold,
    Silver,
    Bronze,
    Continental,
    Relegation,
    Normal,
}

impl RankClass {
    pub fn classify(rank: u32, total: u32) -> Self {
        match rank {
            1 => RankClass::Gold,
            2 => RankClass::Silver,
            3 => RankClass::Bronze,
            r if r <= 4 => RankClass::Continental,
            r if r >= total.saturating_sub(2) => RankClass::Relegation,
            _ => RankClass::Normal,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            RankClass::Gold | RankClass::Silver | RankClass::Bronze => "medal",
            RankClass::Continental => "ACL",
            RankClass::Relegation => "drop",
            RankClass::Normal => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormBadge {
    Win,
    Draw,
    Loss,
    Unknown,
}

impl FormBadge {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "W" | "w" => FormBadge::Win,
            "D" | "d" => FormBadge::Draw,
            "L" | "l" => FormBadge::Loss,
            _ => FormBadge::Unknown,
        }
    }

    pub fn letter(self) -> char {
        match self {
            FormBadge::Win => 'W',
            FormBadge::Draw => 'D',
            FormBadge::Loss => 'L',
            FormBadge::Unknown => '-',
        }
    }
}

/// `"left_wing" , "box"` -> `"left → wing → box"`. Only the first underscore
/// of each side is rewritten.
pub fn zone_route(start: &str, end: &str) -> String {
    format!(
        "{} → {}",
        start.replacen('_', " → ", 1),
        end.replacen('_', " ", 1)
    )
}

pub fn format_sequence(sequence: &str) -> String {
    sequence.split('_').take(4).collect::<Vec<_>>().join(" → ")
}

/// The first two sequences, formatted for a card.
pub fn shown_sequences(sequences: &[String]) -> Vec<String> {
    sequences.iter().take(2).map(|s| format_sequence(s)).collect()
}

/// Bar width in percent for a hub's pass count.
pub fn hub_bar_width(passes: u32) -> f64 {
    (f64::from(passes) / 2.0).min(100.0)
}

pub fn signed(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "--".to_string();
    }
    if value > 0.0 {
        format!("+{:.*}", decimals, value)
    } else {
        format!("{:.*}", decimals, value)
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
