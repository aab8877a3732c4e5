//! Geometry for the pitch widgets. Pitch coordinates are metres on a
//! 105 x 68 field, attacking left to right; surface coordinates are the
//! widget's own units with y growing downwards.

use crate::models::{KeyMoment, NetworkEdge, NetworkGraph, SetPieceRoutine};

pub const PITCH_LENGTH: f64 = 105.0;
pub const PITCH_WIDTH: f64 = 68.0;
pub const PITCH_MID_Y: f64 = PITCH_WIDTH / 2.0;

const MIN_NODE_DISTANCE: f64 = 38.0;
const RELAX_PASSES: usize = 10;
const RELAX_STRENGTH: f64 = 0.3;
const NODE_MARGIN: f64 = 20.0;
const MOVE_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn distance(self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Maps pitch metres onto a padded drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl PitchFrame {
    pub const NETWORK: PitchFrame = PitchFrame::new(650.0, 420.0, 20.0);
    pub const SETPIECE: PitchFrame = PitchFrame::new(720.0, 460.0, 30.0);
    pub const MINI: PitchFrame = PitchFrame::new(150.0, 97.0, 0.0);

    pub const fn new(width: f64, height: f64, padding: f64) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    pub fn scale_x(&self) -> f64 {
        (self.width - self.padding * 2.0) / PITCH_LENGTH
    }

    pub fn scale_y(&self) -> f64 {
        (self.height - self.padding * 2.0) / PITCH_WIDTH
    }

    pub fn x(&self, pitch_x: f64) -> f64 {
        self.padding + pitch_x.clamp(0.0, PITCH_LENGTH) * self.scale_x()
    }

    pub fn y(&self, pitch_y: f64) -> f64 {
        self.padding + pitch_y.clamp(0.0, PITCH_WIDTH) * self.scale_y()
    }

    pub fn point(&self, pitch: Point) -> Point {
        Point::new(self.x(pitch.x), self.y(pitch.y))
    }

    /// Unclamped mapping, for points already validated against the field.
    pub fn project(&self, pitch: Point) -> Point {
        Point::new(
            self.padding + pitch.x * self.scale_x(),
            self.padding + pitch.y * self.scale_y(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionGroup {
    Goalkeeper,
    Defender,
    Midfielder,
    AttackingMid,
    Forward,
    Other,
}

impl PositionGroup {
    pub fn from_position(position: &str) -> Self {
        let pos = position.to_ascii_uppercase();
        let any = |codes: &[&str]| codes.iter().any(|code| pos.contains(code));
        if any(&["GK"]) {
            PositionGroup::Goalkeeper
        } else if any(&["CB", "LB", "RB", "DF"]) {
            PositionGroup::Defender
        } else if any(&["DM", "CM", "MF"]) {
            PositionGroup::Midfielder
        } else if any(&["AM", "WM", "RM", "LM"]) {
            PositionGroup::AttackingMid
        } else if any(&["WF", "CF", "FW", "SS"]) {
            PositionGroup::Forward
        } else {
            PositionGroup::Other
        }
    }
}

/// Default depth (pitch x) for a position code; first match wins.
pub fn base_x(position: &str) -> f64 {
    let pos = position.to_ascii_uppercase();
    let any = |codes: &[&str]| codes.iter().any(|code| pos.contains(code));
    if any(&["GK"]) {
        10.0
    } else if any(&["CB"]) {
        25.0
    } else if any(&["LB", "RB"]) {
        30.0
    } else if any(&["DM"]) {
        45.0
    } else if any(&["CM"]) {
        55.0
    } else if any(&["AM", "LM", "RM"]) {
        70.0
    } else if any(&["WM", "WF"]) {
        80.0
    } else if any(&["CF", "FW", "SS"]) {
        90.0
    } else {
        50.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub id: String,
    pub at: Point,
}

/// Places every node at its positional depth and average width, then pushes
/// apart pairs that overlap. Output order follows `graph.nodes`.
pub fn layout_network(graph: &NetworkGraph, frame: PitchFrame) -> Vec<PlacedNode> {
    let mut placed: Vec<PlacedNode> = graph
        .nodes
        .iter()
        .map(|node| PlacedNode {
            id: node.id.clone(),
            at: Point::new(
                frame.x(base_x(&node.position)),
                frame.y(node.avg_y.unwrap_or(PITCH_MID_Y)),
            ),
        })
        .collect();

    for _ in 0..RELAX_PASSES {
        for i in 0..placed.len() {
            for j in (i + 1)..placed.len() {
                let dx = placed[j].at.x - placed[i].at.x;
                let dy = placed[j].at.y - placed[i].at.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist < MIN_NODE_DISTANCE && dist > 0.0 {
                    let push = (MIN_NODE_DISTANCE - dist) * RELAX_STRENGTH;
                    let nx = dx / dist;
                    let ny = dy / dist;
                    placed[i].at.x -= nx * push;
                    placed[i].at.y -= ny * push;
                    placed[j].at.x += nx * push;
                    placed[j].at.y += ny * push;
                }
            }
        }
    }

    let min = frame.padding + NODE_MARGIN;
    let max_x = frame.width - frame.padding - NODE_MARGIN;
    let max_y = frame.height - frame.padding - NODE_MARGIN;
    for node in &mut placed {
        node.at.x = node.at.x.max(min).min(max_x);
        node.at.y = node.at.y.max(min).min(max_y);
    }
    placed
}

pub fn max_edge_weight(edges: &[NetworkEdge]) -> f64 {
    edges
        .iter()
        .map(|edge| edge.weight)
        .filter(|w| w.is_finite())
        .fold(1.0, f64::max)
}

pub fn edge_stroke(weight: f64, max_weight: f64) -> f64 {
    (weight / max_weight * 5.0).max(1.0)
}

pub fn node_radius(hub_score: f64, focused: bool) -> f64 {
    let base = 16.0 + hub_score * 10.0;
    if focused { base + 4.0 } else { base }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Focused,
    Highlighted,
    Normal,
    Dimmed,
}

pub fn edge_emphasis(edge: &NetworkEdge, focus: Option<&str>) -> Emphasis {
    match focus {
        None => Emphasis::Normal,
        Some(id) if edge.source == id || edge.target == id => Emphasis::Highlighted,
        Some(_) => Emphasis::Dimmed,
    }
}

pub fn node_emphasis(graph: &NetworkGraph, node_id: &str, focus: Option<&str>) -> Emphasis {
    let Some(focus) = focus else {
        return Emphasis::Normal;
    };
    if focus == node_id {
        return Emphasis::Focused;
    }
    let connected = graph.edges.iter().any(|edge| {
        (edge.source == focus || edge.target == focus)
            && (edge.source == node_id || edge.target == node_id)
    });
    if connected {
        Emphasis::Highlighted
    } else {
        Emphasis::Dimmed
    }
}

/// Quadratic curve of a set-piece delivery, in pitch metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    pub start: Point,
    pub control: Point,
    pub target: Point,
}

impl Trajectory {
    pub fn at(&self, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        let a = self.start.lerp(self.control, t);
        let b = self.control.lerp(self.target, t);
        a.lerp(b, t)
    }

    pub fn sample(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| self.at(i as f64 / steps as f64))
            .collect()
    }
}

/// Start, bend and landing spot of a routine. The control point is offset in
/// surface units, so it is returned already projected through `frame`.
pub fn setpiece_trajectory(routine: &SetPieceRoutine, frame: PitchFrame) -> Trajectory {
    let start = if routine.is_corner() {
        let far_side = routine.avg_target_y.is_some_and(|y| y > PITCH_MID_Y);
        Point::new(100.0, if far_side { 5.0 } else { 63.0 })
    } else {
        Point::new(
            or_default(routine.avg_target_x, 70.0).min(90.0),
            or_default(routine.avg_target_y, PITCH_MID_Y),
        )
    };

    let mut target_x = or_default(routine.avg_target_x, 90.0);
    if target_x < 50.0 {
        target_x = PITCH_LENGTH - target_x;
    }
    let target_y = or_default(routine.avg_target_y, PITCH_MID_Y).clamp(0.0, PITCH_WIDTH);

    let s = frame.project(start);
    let t = frame.project(Point::new(target_x, target_y));
    let bend = if routine.swing_type == "inswing" { -30.0 } else { 30.0 };
    let control = Point::new((s.x + t.x) / 2.0, (s.y + t.y) / 2.0 + bend);
    Trajectory {
        start: s,
        control,
        target: t,
    }
}

/// Where a chance happened versus where the backend suggests it should have.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relocation {
    pub actual: Point,
    pub suggested: Point,
    pub trail: [Point; 2],
}

impl Relocation {
    pub fn in_frame(&self, frame: PitchFrame) -> Relocation {
        Relocation {
            actual: frame.project(self.actual),
            suggested: frame.project(self.suggested),
            trail: [frame.project(self.trail[0]), frame.project(self.trail[1])],
        }
    }
}

pub fn key_moment_relocation(moment: &KeyMoment) -> Relocation {
    let x = or_default(moment.position.x, 75.0);
    let y = or_default(moment.position.y, PITCH_MID_Y);
    let suggestion = &moment.suggestion;
    let explicit = suggestion.target_position.unwrap_or_default();
    // A zero coordinate in target_position means "unset".
    let sx = explicit.x.filter(|v| *v != 0.0).or(suggestion.target_x);
    let sy = explicit.y.filter(|v| *v != 0.0).or(suggestion.target_y);
    let actual = Point::new(x, y);
    let suggested = Point::new(or_default(sx, x + 10.0), or_default(sy, y));
    Relocation {
        actual,
        suggested,
        trail: [actual.lerp(suggested, 0.35), actual.lerp(suggested, 0.7)],
    }
}

/// Whether an event travels far enough to draw as an arrow.
pub fn has_movement(start: Point, end: Point) -> bool {
    (end.x - start.x).abs() > MOVE_THRESHOLD || (end.y - start.y).abs() > MOVE_THRESHOLD
}

fn or_default(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NetworkNode, PitchPoint, Suggestion};

    fn node(id: &str, position: &str, avg_y: Option<f64>) -> NetworkNode {
        NetworkNode {
            id: id.to_string(),
            position: position.to_string(),
            avg_y,
            ..NetworkNode::default()
        }
    }

    #[test]
    fn frame_clamps_to_the_field() {
        let frame = PitchFrame::NETWORK;
        assert_eq!(frame.x(0.0), 20.0);
        assert_eq!(frame.x(200.0), 630.0);
        assert_eq!(frame.y(-5.0), 20.0);
        assert!((frame.y(34.0) - 210.0).abs() < 1e-9);
    }

    #[test]
    fn base_x_uses_first_matching_code() {
        assert_eq!(base_x("GK"), 10.0);
        assert_eq!(base_x("cb"), 25.0);
        assert_eq!(base_x("RB"), 30.0);
        assert_eq!(base_x("CDM"), 45.0);
        assert_eq!(base_x("RM"), 70.0);
        assert_eq!(base_x("RWF"), 80.0);
        assert_eq!(base_x("ST"), 50.0);
        assert_eq!(PositionGroup::from_position("LWB"), PositionGroup::Other);
        assert_eq!(PositionGroup::from_position("LB"), PositionGroup::Defender);
    }

    #[test]
    fn overlapping_nodes_are_pushed_apart() {
        let graph = NetworkGraph {
            nodes: vec![node("a", "CB", Some(30.0)), node("b", "CB", Some(32.0))],
            edges: Vec::new(),
        };
        let placed = layout_network(&graph, PitchFrame::NETWORK);
        let before = PitchFrame::NETWORK.y(32.0) - PitchFrame::NETWORK.y(30.0);
        let after = placed[0].at.distance(placed[1].at);
        assert!(after > before, "{after} should exceed {before}");
        assert_eq!(placed[0].at.x, placed[1].at.x);
    }

    #[test]
    fn coincident_nodes_stay_put_and_get_clamped() {
        let graph = NetworkGraph {
            nodes: vec![node("a", "GK", Some(0.0)), node("b", "GK", Some(0.0))],
            edges: Vec::new(),
        };
        let placed = layout_network(&graph, PitchFrame::NETWORK);
        assert_eq!(placed[0].at, placed[1].at);
        assert_eq!(placed[0].at.y, 40.0);
    }

    #[test]
    fn stroke_and_radius() {
        assert_eq!(edge_stroke(10.0, 20.0), 2.5);
        assert_eq!(edge_stroke(1.0, 100.0), 1.0);
        assert_eq!(max_edge_weight(&[]), 1.0);
        assert_eq!(node_radius(0.5, false), 21.0);
        assert_eq!(node_radius(0.5, true), 25.0);
    }

    #[test]
    fn corner_starts_on_the_opposite_flag() {
        let frame = PitchFrame::SETPIECE;
        let mut routine = SetPieceRoutine {
            kind: "Corner_Right".to_string(),
            avg_target_x: Some(20.0),
            avg_target_y: Some(40.0),
            swing_type: "inswing".to_string(),
            ..SetPieceRoutine::default()
        };
        let traj = setpiece_trajectory(&routine, frame);
        assert_eq!(traj.start, frame.project(Point::new(100.0, 5.0)));
        assert_eq!(traj.target, frame.project(Point::new(85.0, 40.0)));
        let mid_y = (traj.start.y + traj.target.y) / 2.0;
        assert!((traj.control.y - (mid_y - 30.0)).abs() < 1e-9);

        routine.avg_target_y = None;
        let traj = setpiece_trajectory(&routine, frame);
        assert_eq!(traj.start, frame.project(Point::new(100.0, 63.0)));
    }

    #[test]
    fn relocation_defaults_and_trail() {
        let moment = KeyMoment::default();
        let reloc = key_moment_relocation(&moment);
        assert_eq!(reloc.actual, Point::new(75.0, 34.0));
        assert_eq!(reloc.suggested, Point::new(85.0, 34.0));
        assert!((reloc.trail[0].x - 78.5).abs() < 1e-9);
        assert!((reloc.trail[1].x - 82.0).abs() < 1e-9);

        let moment = KeyMoment {
            suggestion: Suggestion {
                target_position: Some(PitchPoint {
                    x: Some(0.0),
                    y: Some(20.0),
                }),
                target_x: Some(95.0),
                ..Suggestion::default()
            },
            ..KeyMoment::default()
        };
        let reloc = key_moment_relocation(&moment);
        assert_eq!(reloc.suggested, Point::new(95.0, 20.0));
    }
}
