use std::time::Duration;

use crate::models::ReplayEvent;
use crate::pitch::{Point, has_movement};

pub const EVENT_DURATION_MS: f64 = 600.0;
pub const SPEEDS: [f64; 3] = [0.5, 1.0, 2.0];

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Step-through playback of one attacking phase. Events are revealed one at a
/// time; the current event animates from its start to its end point.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayPlayer {
    events: Vec<ReplayEvent>,
    index: usize,
    progress: f64,
    playing: bool,
    speed: f64,
}

impl Default for ReplayPlayer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ReplayPlayer {
    pub fn new(events: Vec<ReplayEvent>) -> Self {
        Self {
            events,
            index: 0,
            progress: 0.0,
            playing: false,
            speed: 1.0,
        }
    }

    pub fn load(&mut self, events: Vec<ReplayEvent>) {
        self.events = events;
        self.reset();
        self.playing = false;
    }

    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn eased_progress(&self) -> f64 {
        ease_out_cubic(self.progress)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Cycles 0.5x -> 1x -> 2x -> 0.5x.
    pub fn cycle_speed(&mut self) {
        let next = SPEEDS
            .iter()
            .position(|s| (*s - self.speed).abs() < f64::EPSILON)
            .map(|i| SPEEDS[(i + 1) % SPEEDS.len()])
            .unwrap_or(1.0);
        self.speed = next;
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.playing = false;
            return;
        }
        if self.events.is_empty() {
            return;
        }
        if self.at_end() {
            self.reset();
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.progress = 0.0;
    }

    pub fn at_end(&self) -> bool {
        !self.events.is_empty() && self.index + 1 >= self.events.len() && self.progress >= 1.0
    }

    pub fn frame_duration_ms(&self) -> f64 {
        EVENT_DURATION_MS / self.speed
    }

    /// Advances the animation clock. Leftover time carries into the next
    /// event; playback halts on the last event.
    pub fn advance(&mut self, elapsed: Duration) {
        if !self.playing || self.events.is_empty() {
            return;
        }
        self.progress += elapsed.as_secs_f64() * 1000.0 / self.frame_duration_ms();
        while self.progress >= 1.0 {
            if self.index + 1 < self.events.len() {
                self.index += 1;
                self.progress -= 1.0;
            } else {
                self.progress = 1.0;
                self.playing = false;
                break;
            }
        }
    }

    pub fn step_forward(&mut self) {
        if self.index + 1 < self.events.len() {
            self.index += 1;
        }
        self.progress = 1.0;
    }

    pub fn step_back(&mut self) {
        self.index = self.index.saturating_sub(1);
        self.progress = 1.0;
    }

    pub fn visible(&self) -> &[ReplayEvent] {
        if self.events.is_empty() {
            return &[];
        }
        &self.events[..=self.index.min(self.events.len() - 1)]
    }

    pub fn current(&self) -> Option<&ReplayEvent> {
        self.events.get(self.index)
    }

    /// Head of the current event's arrow. `None` when the event does not move.
    pub fn current_head(&self) -> Option<Point> {
        let event = self.current()?;
        let (start, end) = event_points(event);
        if !has_movement(start, end) {
            return None;
        }
        Some(start.lerp(end, self.eased_progress()))
    }

    pub fn position_label(&self) -> String {
        if self.events.is_empty() {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.index + 1, self.events.len())
    }
}

pub fn event_points(event: &ReplayEvent) -> (Point, Point) {
    (
        Point::new(event.start_x, event.start_y),
        Point::new(event.end_x, event.end_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(sx: f64, ex: f64) -> ReplayEvent {
        ReplayEvent {
            start_x: sx,
            start_y: 30.0,
            end_x: ex,
            end_y: 30.0,
            ..ReplayEvent::default()
        }
    }

    #[test]
    fn easing_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn playback_advances_and_stops_on_last_event() {
        let mut player = ReplayPlayer::new(vec![event(10.0, 20.0), event(20.0, 30.0)]);
        player.toggle();
        player.advance(Duration::from_millis(300));
        assert_eq!(player.index(), 0);
        assert!((player.progress() - 0.5).abs() < 1e-9);

        player.advance(Duration::from_millis(600));
        assert_eq!(player.index(), 1);
        assert_eq!(player.visible().len(), 2);

        player.advance(Duration::from_millis(2_000));
        assert_eq!(player.index(), 1);
        assert!(!player.is_playing());
        assert!(player.at_end());

        player.toggle();
        assert_eq!(player.index(), 0);
        assert!(player.is_playing());
    }

    #[test]
    fn speed_scales_frame_duration() {
        let mut player = ReplayPlayer::new(vec![event(0.0, 50.0)]);
        assert_eq!(player.frame_duration_ms(), 600.0);
        player.cycle_speed();
        assert_eq!(player.frame_duration_ms(), 300.0);
        player.cycle_speed();
        assert_eq!(player.speed(), 0.5);
        player.cycle_speed();
        assert_eq!(player.speed(), 1.0);
    }

    #[test]
    fn short_events_have_no_arrow_head() {
        let player = ReplayPlayer::new(vec![event(10.0, 11.5)]);
        assert!(player.current_head().is_none());
        assert_eq!(ReplayPlayer::default().position_label(), "0 / 0");
    }
}
