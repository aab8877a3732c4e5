use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Tabs, Wrap};

use matchday_scout::config::{ScoutConfig, load_dotenv};
use matchday_scout::labels::{
    FormBadge, Heat, ImpactTier, RankClass, ScoreTier, SetPieceKind, hub_bar_width, pct,
    shown_sequences, signed, swing_label, truncate, zone_label, zone_route,
};
use matchday_scout::match_review::{DASH, ResultTone, chance_counts, summarize_moment, to_pct};
use matchday_scout::pitch::{
    Emphasis, PITCH_LENGTH, PITCH_WIDTH, PitchFrame, Point, PositionGroup, edge_emphasis,
    edge_stroke, has_movement, key_moment_relocation, layout_network, max_edge_weight,
    node_emphasis, node_radius, setpiece_trajectory,
};
use matchday_scout::replay::event_points;
use matchday_scout::state::{
    AnalysisSource, AppState, Delta, ProviderCommand, Screen, TeamTab, VideoField, apply_delta,
};
use matchday_scout::video::{self, VideoRequest};
use matchday_scout::{demo_feed, feed, persist};

struct App {
    state: AppState,
    cfg: ScoutConfig,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cfg: ScoutConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            cfg,
            should_quit: false,
            cmd_tx,
        }
    }

    fn send(&mut self, cmd: ProviderCommand, what: &str) -> bool {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log(format!("[INFO] {what} unavailable"));
            return false;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
            return false;
        }
        true
    }

    fn on_key(&mut self, key: KeyEvent) {
        if let Some(field) = self.state.video.editing {
            self.on_edit_key(field, key);
            return;
        }
        if self.state.help_overlay {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                _ => self.state.help_overlay = false,
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => match self.state.screen {
                Screen::Standings => self.on_standings_key(key),
                Screen::Team => self.on_team_key(key),
            },
        }
    }

    fn on_standings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('r') => {
                self.state.standings_loading = true;
                self.send(ProviderCommand::FetchStandings, "Standings");
            }
            KeyCode::Enter | KeyCode::Char('d') => {
                if let Some(team_id) = self.state.open_selected_team() {
                    self.send(ProviderCommand::FetchTeamBundle { team_id }, "Team fetch");
                }
            }
            _ => {}
        }
    }

    fn on_team_key(&mut self, key: KeyEvent) {
        let Some(team_id) = self.state.team_id else {
            self.state.back();
            return;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') => return self.state.back(),
            KeyCode::Tab => return self.state.cycle_tab(),
            KeyCode::BackTab => return self.state.cycle_tab_back(),
            KeyCode::Char(c @ '1'..='7') => {
                let idx = c as usize - '1' as usize;
                self.state.tab = TeamTab::ALL[idx];
                return;
            }
            KeyCode::Char('j') | KeyCode::Down => return self.state.tab_select_next(),
            KeyCode::Char('k') | KeyCode::Up => return self.state.tab_select_prev(),
            KeyCode::Char('r') => {
                self.state.team.loading = true;
                self.send(ProviderCommand::FetchTeamBundle { team_id }, "Team fetch");
                return;
            }
            KeyCode::Char('e') => {
                let path = format!("scout_team_{team_id}.xlsx");
                self.send(ProviderCommand::Export { team_id, path }, "Export");
                return;
            }
            _ => {}
        }

        match self.state.tab {
            TeamTab::Patterns => self.on_patterns_key(team_id, key),
            TeamTab::Network => {
                if key.code == KeyCode::Char('x') {
                    self.state.network_focus = None;
                }
            }
            TeamTab::Simulation => self.on_simulation_key(team_id, key),
            TeamTab::Matches => self.on_matches_key(team_id, key),
            TeamTab::Video => self.on_video_key(key),
            TeamTab::Overview | TeamTab::SetPieces => {}
        }
    }

    fn on_patterns_key(&mut self, team_id: u32, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let Some(phase_id) = self.state.selected_phase().map(|p| p.phase_id) else {
                    return;
                };
                self.state.replay.pause();
                self.state.team.replay_loading = true;
                self.send(ProviderCommand::FetchReplay { team_id, phase_id }, "Replay");
            }
            KeyCode::Char(' ') => self.state.replay.toggle(),
            KeyCode::Right => {
                self.state.replay.pause();
                self.state.replay.step_forward();
            }
            KeyCode::Left => {
                self.state.replay.pause();
                self.state.replay.step_back();
            }
            KeyCode::Char('s') => self.state.replay.cycle_speed(),
            KeyCode::Char('0') => self.state.replay.reset(),
            _ => {}
        }
    }

    fn on_simulation_key(&mut self, team_id: u32, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('p') => {
                let Some(player_id) = self.state.selected_hub().map(|h| h.player_id) else {
                    return;
                };
                self.state.team.pressing_loading = true;
                self.send(
                    ProviderCommand::FetchPressing { team_id, player_id },
                    "Pressing simulation",
                );
            }
            KeyCode::Char('o') => self.state.cycle_opponent(),
            KeyCode::Char('m') => {
                let Some(opponent_id) = self.state.selected_opponent().map(|s| s.team_id) else {
                    self.state.push_log("[INFO] No opponent to simulate against");
                    return;
                };
                self.state.team.pre_match_loading = true;
                self.send(
                    ProviderCommand::RunPreMatch {
                        team_id,
                        opponent_id,
                    },
                    "Pre-match simulation",
                );
            }
            _ => {}
        }
    }

    fn on_matches_key(&mut self, team_id: u32, key: KeyEvent) {
        match key.code {
            KeyCode::Enter if self.state.team.chances.is_none() => {
                let Some(game_id) = self.state.selected_match().map(|m| m.game_id) else {
                    return;
                };
                self.state.team.chances_loading = true;
                self.send(ProviderCommand::FetchChances { team_id, game_id }, "Chance analysis");
            }
            KeyCode::Char('x') | KeyCode::Backspace => {
                self.state.team.chances = None;
                self.state.moment_selected = 0;
            }
            _ => {}
        }
    }

    fn on_video_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('u') => self.state.video.editing = Some(VideoField::Url),
            KeyCode::Char('f') => self.state.video.editing = Some(VideoField::File),
            KeyCode::Enter => self.submit_video(),
            KeyCode::Char('g') => {
                let ts = self
                    .state
                    .video
                    .job
                    .as_ref()
                    .and_then(|j| j.report.as_ref())
                    .and_then(|r| r.moments.get(self.state.video.moment_selected))
                    .map(|m| m.ts);
                if let Some(ts) = ts {
                    self.state.video.seek = Some(ts);
                }
            }
            KeyCode::Char('c') => {
                self.state.video.job = None;
                self.state.video.error = None;
                self.state.video.seek = None;
                self.state.video.moment_selected = 0;
            }
            _ => {}
        }
    }

    fn on_edit_key(&mut self, field: VideoField, key: KeyEvent) {
        let input = match field {
            VideoField::Url => &mut self.state.video.url_input,
            VideoField::File => &mut self.state.video.file_input,
        };
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.state.video.editing = None,
            KeyCode::Tab => {
                self.state.video.editing = Some(match field {
                    VideoField::Url => VideoField::File,
                    VideoField::File => VideoField::Url,
                });
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => input.push(c),
            _ => {}
        }
    }

    fn submit_video(&mut self) {
        if self.state.video.busy || self.state.video.working() {
            self.state.push_log("[INFO] Video analysis already running");
            return;
        }
        let url = self.state.video.url_input.clone();
        let file = self.state.video_file_path();
        let cmd = match video::validate_request(&url, file.as_deref()) {
            Ok(VideoRequest::Link(url)) => ProviderCommand::StartVideoJob { url },
            Ok(VideoRequest::Upload { path, url }) => ProviderCommand::UploadVideo { path, url },
            Err(err) => {
                self.state.video.error = Some(err.to_string());
                return;
            }
        };
        self.state.video.error = None;
        self.state.video.busy = self.send(cmd, "Video analysis");
    }

    fn poll_video(&mut self, now: Instant) {
        let interval = self.cfg.video_poll;
        if let Some(job_id) = self.state.video.poll_due(now, interval) {
            self.send(ProviderCommand::PollVideoJob { job_id }, "Video status");
        }
    }
}

fn main() -> io::Result<()> {
    load_dotenv();
    let cfg = ScoutConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    if cfg.demo {
        demo_feed::spawn_demo_provider(tx, cmd_rx);
    } else {
        feed::spawn_provider(cfg.clone(), tx, cmd_rx);
    }

    let mut app = App::new(cfg, Some(cmd_tx));
    persist::load_into_state(&mut app.state);
    let res = run_app(&mut terminal, &mut app, rx);
    persist::save_from_state(&app.state);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let idle_tick = Duration::from_millis(250);
    let anim_tick = Duration::from_millis(50);
    let mut last_frame = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        let now = Instant::now();
        app.state.replay.advance(now.duration_since(last_frame));
        last_frame = now;
        app.poll_video(now);
        app.state.maybe_clear_export(now);

        terminal.draw(|f| ui(f, app))?;

        let tick = if app.state.replay.is_playing() {
            anim_tick
        } else {
            idle_tick
        };
        if event::poll(tick)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let state = &app.state;
    frame.render_widget(
        Paragraph::new(header_text(state)).block(Block::default().borders(Borders::BOTTOM)),
        chunks[0],
    );

    match state.screen {
        Screen::Standings => render_standings(frame, chunks[1], state),
        Screen::Team => render_team(frame, chunks[1], state),
    }

    render_console(frame, chunks[2], state);
    frame.render_widget(
        Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let mut title = match state.screen {
        Screen::Standings => "MATCHDAY SCOUT | Standings".to_string(),
        Screen::Team => {
            let name = state
                .team_id
                .map(|id| state.team_name(id))
                .unwrap_or_default();
            format!("MATCHDAY SCOUT | {name} | {}", state.tab.label())
        }
    };
    if state.standings_loading || state.team.loading {
        title.push_str(" | loading…");
    }
    let stale = match state.screen {
        Screen::Standings => state.standings_stale,
        Screen::Team => state.current_bundle().is_some_and(|b| b.stale),
    };
    if stale {
        title.push_str(" | OFFLINE (cached)");
    }
    if state.export.active {
        title.push_str(&format!(
            " | Export {}/{} {}",
            state.export.current, state.export.total, state.export.message
        ));
    }
    title
}

fn footer_text(state: &AppState) -> &'static str {
    if state.video.editing.is_some() {
        return "Typing… Enter/Esc Done | Tab Switch field | Backspace Delete";
    }
    match state.screen {
        Screen::Standings => "Enter Open team | j/k Move | r Refresh | ? Help | q Quit",
        Screen::Team => match state.tab {
            TeamTab::Patterns => {
                "Tab Next tab | j/k Phase | Enter Load replay | Space Play | ←/→ Step | s Speed | e Export | b Back"
            }
            TeamTab::Network => "Tab Next tab | j/k Focus player | x Clear focus | e Export | b Back",
            TeamTab::Simulation => {
                "Tab Next tab | j/k Hub | Enter Press hub | o Opponent | m Pre-match sim | b Back"
            }
            TeamTab::Matches => "Tab Next tab | j/k Move | Enter Analyse chances | x Back to list | b Back",
            TeamTab::Video => "u Edit link | f Edit file | Enter Analyse | j/k Moment | g Seek | c Clear | b Back",
            _ => "Tab Next tab | 1-7 Jump | j/k Move | r Refresh | e Export | ? Help | b Back",
        },
    }
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total <= visible {
        return (0, total);
    }
    let half = visible / 2;
    let mut start = selected.saturating_sub(half);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn heat_color(heat: Heat) -> Color {
    match heat {
        Heat::Hot => Color::Red,
        Heat::Warm => Color::Yellow,
        Heat::Cold => Color::Gray,
    }
}

fn score_color(score: i32) -> Color {
    match ScoreTier::from_score(score) {
        ScoreTier::Good => Color::Green,
        ScoreTier::Fair => Color::Yellow,
        ScoreTier::Poor => Color::Red,
    }
}

fn empty_hint(frame: &mut Frame, area: Rect, text: &str) {
    frame.render_widget(Paragraph::new(text.to_string()).style(dim()), area);
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let block = Block::default().title("Standings").borders(Borders::ALL);
    let inner = block.inner(cols[0]);
    frame.render_widget(block, cols[0]);

    if state.standings.is_empty() {
        let msg = if state.standings_loading {
            "Loading standings…"
        } else {
            "No standings. Press r to retry."
        };
        empty_hint(frame, inner, msg);
    } else {
        let total = state.standings.len() as u32;
        let mut lines = vec![Line::styled(
            format!(
                "{:>3} {:<22} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4}  {}",
                "#", "Team", "P", "W", "D", "L", "GD", "Pts", "Form"
            ),
            dim(),
        )];
        let visible = inner.height.saturating_sub(1) as usize;
        let (start, end) = visible_range(state.selected, state.standings.len(), visible);
        for idx in start..end {
            let s = &state.standings[idx];
            let rank_color = match RankClass::classify(s.rank, total) {
                RankClass::Gold => Color::Yellow,
                RankClass::Silver => Color::White,
                RankClass::Bronze => Color::LightRed,
                RankClass::Continental => Color::Cyan,
                RankClass::Relegation => Color::Red,
                RankClass::Normal => Color::Gray,
            };
            let mut spans = vec![
                Span::styled(format!("{:>3} ", s.rank), Style::default().fg(rank_color)),
                Span::raw(format!(
                    "{:<22} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4}  ",
                    truncate(&s.team_name, 22),
                    s.played,
                    s.wins,
                    s.draws,
                    s.losses,
                    signed(f64::from(s.goal_diff), 0),
                    s.points
                )),
            ];
            for badge in s.form.iter().map(|f| FormBadge::parse(f)) {
                let color = match badge {
                    FormBadge::Win => Color::Green,
                    FormBadge::Draw => Color::Yellow,
                    FormBadge::Loss => Color::Red,
                    FormBadge::Unknown => Color::DarkGray,
                };
                spans.push(Span::styled(badge.letter().to_string(), Style::default().fg(color)));
            }
            lines.push(Line::from(spans).style(selected_style(idx == state.selected)));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    let preview = Block::default().title("Cached report").borders(Borders::ALL);
    let text = match state
        .selected_standing()
        .and_then(|s| state.bundles.get(&s.team_id))
    {
        Some(bundle) => {
            let mut lines = vec![
                format!("{} games analysed", bundle.n_games_analyzed),
                format!("{} patterns · {} phases", bundle.patterns.len(), bundle.phases.len()),
                format!(
                    "{} set pieces ({} corners / {} free kicks)",
                    bundle.setpieces.len(),
                    bundle.setpiece_counts.corners,
                    bundle.setpiece_counts.freekicks
                ),
                format!("{} hubs", bundle.hubs.len()),
            ];
            if bundle.stale {
                lines.push("cached data".to_string());
            }
            lines.join("\n")
        }
        None => "Open a team to load its report.".to_string(),
    };
    frame.render_widget(Paragraph::new(text).block(preview), cols[1]);
}

fn render_team(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5)])
        .split(area);
    let titles: Vec<String> = TeamTab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{} {}", i + 1, t.label()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.tab.index())
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, rows[0]);

    let body = rows[1];
    if let Some(err) = &state.team.last_error
        && state.current_bundle().is_none_or(|b| b.is_empty())
    {
        empty_hint(frame, body, &format!("{err}. Press r to retry."));
        return;
    }
    match state.tab {
        TeamTab::Overview => render_overview(frame, body, state),
        TeamTab::Patterns => render_patterns(frame, body, state),
        TeamTab::SetPieces => render_setpieces(frame, body, state),
        TeamTab::Network => render_network(frame, body, state),
        TeamTab::Simulation => render_simulation(frame, body, state),
        TeamTab::Matches => render_matches(frame, body, state),
        TeamTab::Video => render_video(frame, body, state),
    }
}

fn render_overview(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(s) = state.current_standing() {
        lines.push(Line::raw(format!(
            "#{} · {} pts · {}W {}D {}L · GF {} GA {}",
            s.rank, s.points, s.wins, s.draws, s.losses, s.goals_for, s.goals_against
        )));
    }
    match &state.team.analysis {
        Some(analysis) => {
            let source = match state.team.analysis_source {
                Some(AnalysisSource::Client) => " (local)",
                _ => "",
            };
            lines.push(Line::from(vec![
                Span::raw("Overall "),
                Span::styled(
                    format!("{}/100", analysis.overall_score),
                    Style::default()
                        .fg(score_color(analysis.overall_score))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(source, dim()),
            ]));
            lines.push(Line::raw(analysis.summary.clone()));
            lines.push(Line::raw(""));
            lines.push(Line::styled("Strengths", Style::default().fg(Color::Green)));
            for item in &analysis.strengths {
                lines.push(Line::raw(format!(
                    "  [{:>3}] {} · {}",
                    item.score, item.category, item.title
                )));
            }
            lines.push(Line::styled("Needs work", Style::default().fg(Color::Red)));
            for item in &analysis.weaknesses {
                lines.push(Line::raw(format!(
                    "  [{:>3}] {} · {}",
                    item.score, item.category, item.title
                )));
            }
            if !analysis.insights.is_empty() {
                lines.push(Line::raw(""));
                for insight in &analysis.insights {
                    lines.push(Line::styled(format!("• {insight}"), dim()));
                }
            }
        }
        None if state.team.loading => lines.push(Line::styled("Analysing…", dim())),
        None => lines.push(Line::styled("No analysis available", dim())),
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Team report").borders(Borders::ALL)),
        cols[0],
    );

    let mut vaep_lines: Vec<Line> = Vec::new();
    match &state.team.vaep {
        Some(vaep) if !vaep.top_players.is_empty() => {
            vaep_lines.push(Line::styled(
                format!("Team total {:.2}", vaep.team_total_vaep),
                dim(),
            ));
            for (idx, p) in vaep.top_players.iter().enumerate() {
                vaep_lines.push(Line::raw(format!(
                    "{:>2}. {:<18} {:<4} {:>6.3}",
                    idx + 1,
                    truncate(&p.player_name, 18),
                    p.position,
                    p.total_vaep
                )));
            }
        }
        _ => vaep_lines.push(Line::styled("No VAEP data", dim())),
    }
    frame.render_widget(
        Paragraph::new(vaep_lines).block(Block::default().title("Top VAEP").borders(Borders::ALL)),
        cols[1],
    );
}

fn render_patterns(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(cols[0]);

    let Some(bundle) = state.current_bundle() else {
        empty_hint(frame, area, "Loading patterns…");
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    for p in &bundle.patterns {
        let heat = Heat::for_conversion(p.shot_conversion_rate);
        lines.push(Line::from(vec![
            Span::raw(format!("#{} x{} ", p.cluster_id, p.frequency)),
            Span::styled(
                format!("conv {}", pct(p.shot_conversion_rate, 1)),
                Style::default().fg(heat_color(heat)),
            ),
            Span::raw(format!(
                " · {:.1} passes · {:.0}s",
                p.avg_passes, p.avg_duration
            )),
        ]));
        lines.push(Line::styled(
            format!("   {}", zone_route(&p.avg_start_zone, &p.avg_end_zone)),
            dim(),
        ));
        for seq in shown_sequences(&p.common_sequences) {
            lines.push(Line::styled(format!("   {seq}"), dim()));
        }
    }
    if lines.is_empty() {
        lines.push(Line::styled("No patterns", dim()));
    }
    let title = format!("Attacking patterns ({} events)", bundle.total_events);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        left[0],
    );

    let phase_block = Block::default().title("Phases").borders(Borders::ALL);
    let inner = phase_block.inner(left[1]);
    frame.render_widget(phase_block, left[1]);
    let (start, end) = visible_range(state.phase_selected, bundle.phases.len(), inner.height as usize);
    let phase_lines: Vec<Line> = bundle.phases[start..end]
        .iter()
        .enumerate()
        .map(|(offset, phase)| {
            let idx = start + offset;
            let shot = if phase.has_shot { " ⚽" } else { "" };
            let current = if state.team.replay_phase == Some(phase.phase_id) { "▶ " } else { "  " };
            Line::raw(format!(
                "{current}Phase {} · {} events · {} passes · {:.0}s · {}{shot}",
                phase.phase_id,
                phase.length,
                phase.passes,
                phase.duration,
                zone_label(&phase.start_zone)
            ))
            .style(selected_style(idx == state.phase_selected))
        })
        .collect();
    frame.render_widget(Paragraph::new(phase_lines), inner);

    render_replay(frame, cols[1], state);
}

fn render_replay(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(area);
    let replay = &state.replay;
    let pitch = PitchFrame::MINI;

    let canvas = Canvas::default()
        .block(Block::default().title("Replay").borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([0.0, pitch.width])
        .y_bounds([0.0, pitch.height])
        .paint(|ctx| {
            draw_pitch_markings(ctx, pitch);
            let visible = replay.visible();
            for (idx, event) in visible.iter().enumerate() {
                let (start, end) = event_points(event);
                let s = pitch.point(start);
                let current = idx + 1 == visible.len();
                let color = if event.kind == "Shot" { Color::Red } else { Color::Cyan };
                if has_movement(start, end) {
                    let head = if current {
                        replay.current_head().unwrap_or(end)
                    } else {
                        end
                    };
                    draw_segment(ctx, pitch, s, pitch.point(head), if current { color } else { Color::DarkGray });
                }
                ctx.draw(&Circle {
                    x: s.x,
                    y: pitch.height - s.y,
                    radius: 1.5,
                    color: if current { Color::Yellow } else { Color::Gray },
                });
            }
        });
    frame.render_widget(canvas, rows[0]);

    let status = if state.team.replay_loading {
        "Loading replay…".to_string()
    } else if replay.is_empty() {
        "Select a phase and press Enter".to_string()
    } else {
        let current = replay
            .current()
            .map(|e| format!("{} · {} ({}) · {}", e.kind, e.player, e.position, e.result))
            .unwrap_or_default();
        format!(
            "{} {} · {}x · {}",
            if replay.is_playing() { "▶" } else { "⏸" },
            replay.position_label(),
            replay.speed(),
            current
        )
    };
    frame.render_widget(
        Paragraph::new(status).block(Block::default().borders(Borders::ALL)),
        rows[1],
    );
}

fn render_setpieces(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    let Some(bundle) = state.current_bundle() else {
        empty_hint(frame, area, "Loading set pieces…");
        return;
    };

    let mut lines = vec![Line::styled(
        format!(
            "{} corners · {} free kicks",
            bundle.setpiece_counts.corners, bundle.setpiece_counts.freekicks
        ),
        dim(),
    )];
    for (idx, r) in bundle.setpieces.iter().enumerate() {
        let heat = Heat::for_setpiece_shots(r.shot_rate);
        lines.push(
            Line::from(vec![
                Span::raw(format!(
                    "{} #{} x{} ",
                    SetPieceKind::from_type(&r.kind).label(),
                    r.cluster_id,
                    r.frequency
                )),
                Span::styled(
                    format!("shots {}", pct(r.shot_rate, 0)),
                    Style::default().fg(heat_color(heat)),
                ),
                Span::raw(format!(
                    " · {} · {}",
                    zone_label(&r.primary_zone),
                    swing_label(&r.swing_type)
                )),
            ])
            .style(selected_style(idx == state.setpiece_selected)),
        );
        if idx == state.setpiece_selected && !r.defense_suggestion.is_empty() {
            lines.push(Line::styled(format!("   ↳ {}", r.defense_suggestion), dim()));
        }
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Routines").borders(Borders::ALL)),
        cols[0],
    );

    let pitch = PitchFrame::SETPIECE;
    let routine = bundle.setpieces.get(state.setpiece_selected);
    let canvas = Canvas::default()
        .block(Block::default().title("Delivery").borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([0.0, pitch.width])
        .y_bounds([0.0, pitch.height])
        .paint(|ctx| {
            draw_pitch_markings(ctx, pitch);
            let Some(routine) = routine else {
                return;
            };
            let path = setpiece_trajectory(routine, pitch).sample(24);
            for pair in path.windows(2) {
                ctx.draw(&CanvasLine::new(
                    pair[0].x,
                    pitch.height - pair[0].y,
                    pair[1].x,
                    pitch.height - pair[1].y,
                    Color::Yellow,
                ));
            }
            if let Some(target) = path.last() {
                ctx.draw(&Circle {
                    x: target.x,
                    y: pitch.height - target.y,
                    radius: 8.0,
                    color: Color::Red,
                });
            }
        });
    frame.render_widget(canvas, cols[1]);
}

fn render_network(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);
    let Some(graph) = state.team.graph.as_ref() else {
        empty_hint(frame, area, "Loading pass network…");
        return;
    };

    let pitch = PitchFrame::NETWORK;
    let placed = layout_network(graph, pitch);
    let max_weight = max_edge_weight(&graph.edges);
    let focus = state.focused_node_id();
    let position_of = |id: &str| placed.iter().find(|p| p.id == id).map(|p| p.at);

    let canvas = Canvas::default()
        .block(Block::default().title("Pass network").borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([0.0, pitch.width])
        .y_bounds([0.0, pitch.height])
        .paint(|ctx| {
            draw_pitch_markings(ctx, pitch);
            for edge in &graph.edges {
                let (Some(a), Some(b)) = (position_of(&edge.source), position_of(&edge.target))
                else {
                    continue;
                };
                let color = match edge_emphasis(edge, focus) {
                    Emphasis::Highlighted | Emphasis::Focused => Color::Yellow,
                    Emphasis::Dimmed => Color::DarkGray,
                    Emphasis::Normal if edge_stroke(edge.weight, max_weight) >= 3.0 => Color::White,
                    Emphasis::Normal => Color::Gray,
                };
                ctx.draw(&CanvasLine::new(
                    a.x,
                    pitch.height - a.y,
                    b.x,
                    pitch.height - b.y,
                    color,
                ));
            }
            ctx.layer();
            for (node, at) in graph.nodes.iter().zip(placed.iter().map(|p| p.at)) {
                let emphasis = node_emphasis(graph, &node.id, focus);
                let color = match emphasis {
                    Emphasis::Focused => Color::Yellow,
                    Emphasis::Highlighted => Color::Cyan,
                    Emphasis::Normal => group_color(PositionGroup::from_position(&node.position)),
                    Emphasis::Dimmed => Color::DarkGray,
                };
                let radius = node_radius(
                    node.hub_score,
                    emphasis == Emphasis::Focused,
                ) / 2.0;
                ctx.draw(&Circle {
                    x: at.x,
                    y: pitch.height - at.y,
                    radius,
                    color,
                });
                ctx.print(
                    at.x - radius,
                    pitch.height - at.y - radius * 1.6,
                    Span::styled(node.position.clone(), Style::default().fg(color)),
                );
            }
        });
    frame.render_widget(canvas, cols[0]);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(node) = state.network_focus.and_then(|i| graph.nodes.get(i)) {
        lines.push(Line::styled(
            format!("{} ({})", node.name, node.position),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::raw(format!(
            "hub {:.2} · {} passes",
            node.hub_score, node.passes_total
        )));
        let mut links: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.source == node.id || e.target == node.id)
            .collect();
        links.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        for edge in links.iter().take(6) {
            let (arrow, other) = if edge.source == node.id {
                ("→", &edge.target)
            } else {
                ("←", &edge.source)
            };
            let name = graph
                .nodes
                .iter()
                .find(|n| &n.id == other)
                .map(|n| n.name.as_str())
                .unwrap_or(other.as_str());
            lines.push(Line::raw(format!("  {arrow} {name} ({:.0})", edge.weight)));
        }
        lines.push(Line::raw(""));
    }
    if let Some(bundle) = state.current_bundle() {
        lines.push(Line::styled(
            format!(
                "Hubs · {} players · {} links",
                bundle.network_stats.nodes, bundle.network_stats.edges
            ),
            dim(),
        ));
        for hub in &bundle.hubs {
            let bar = "█".repeat((hub_bar_width(hub.passes_received) / 10.0).round() as usize);
            lines.push(Line::raw(format!(
                "{} ({}) {:.2}",
                hub.player_name, hub.main_position, hub.hub_score
            )));
            lines.push(Line::styled(format!("  {bar} {}", hub.passes_received), dim()));
        }
    }
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title("Players").borders(Borders::ALL)),
        cols[1],
    );
}

fn render_simulation(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(cols[1]);

    let mut hub_lines: Vec<Line> = Vec::new();
    if let Some(bundle) = state.current_bundle() {
        for (idx, hub) in bundle.hubs.iter().enumerate() {
            let tier = ImpactTier::from_score(hub.disruption_impact.impact_score);
            hub_lines.push(
                Line::raw(format!(
                    "{} ({}) · {} {:.0}",
                    hub.player_name,
                    hub.main_position,
                    tier.label(),
                    hub.disruption_impact.impact_score
                ))
                .style(selected_style(idx == state.hub_selected)),
            );
            for c in hub.key_connections.iter().take(3) {
                hub_lines.push(Line::styled(
                    format!("   {} ({}) x{}", c.player_name, c.position, c.count),
                    dim(),
                ));
            }
        }
    }
    if hub_lines.is_empty() {
        hub_lines.push(Line::styled("No hubs", dim()));
    }
    frame.render_widget(
        Paragraph::new(hub_lines).block(Block::default().title("Pressing targets").borders(Borders::ALL)),
        cols[0],
    );

    let mut press: Vec<Line> = Vec::new();
    if state.team.pressing_loading {
        press.push(Line::styled("Simulating…", dim()));
    } else if let Some(result) = &state.team.pressing {
        let sim = &result.pressing_simulation;
        press.push(Line::raw(format!(
            "{}: {} → {}: {}",
            sim.scenario_a.name,
            pct(sim.scenario_a.pass_success_rate, 1),
            sim.scenario_b.name,
            pct(sim.scenario_b.pass_success_rate, 1)
        )));
        press.push(Line::styled(
            format!("Pass success {}pp", signed(-sim.success_drop_pp(), 1)),
            Style::default().fg(Color::Yellow),
        ));
        for (outcome, rate) in &sim.on_failure_followups {
            press.push(Line::styled(format!("  {outcome}: {}", pct(*rate, 0)), dim()));
        }
        for (n, step) in result.vulnerability_chain.vulnerability_chain.steps().iter().enumerate() {
            press.push(Line::raw(format!(
                "{}. {} → {}",
                n + 1,
                step.action,
                step.expected_result
            )));
        }
        press.push(Line::raw(sim.recommendation.clone()));
    } else {
        press.push(Line::styled("Select a hub and press Enter", dim()));
    }
    frame.render_widget(
        Paragraph::new(press)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Pressing simulation").borders(Borders::ALL)),
        right[0],
    );

    let opponent = state
        .selected_opponent()
        .map(|s| s.team_name.clone())
        .unwrap_or_else(|| "-".to_string());
    let mut pre: Vec<Line> = vec![Line::raw(format!("Opponent: {opponent} (o to change)"))];
    if state.team.pre_match_loading {
        pre.push(Line::styled("Simulating…", dim()));
    } else if let Some(result) = &state.team.pre_match {
        let base = &result.base_prediction;
        let best = &result.optimal_prediction;
        pre.push(Line::raw(format!(
            "Base W {:.1}% D {:.1}% L {:.1}%",
            base.win, base.draw, base.lose
        )));
        pre.push(Line::styled(
            format!(
                "Best W {:.1}% D {:.1}% L {:.1}% ({}%p)",
                best.win,
                best.draw,
                best.lose,
                signed(result.win_improvement, 1)
            ),
            Style::default().fg(Color::Green),
        ));
        for s in &result.tactical_suggestions {
            pre.push(Line::raw(format!(
                "{}. {} ({})",
                s.priority, s.tactic, s.win_prob_change
            )));
            pre.push(Line::styled(format!("   {}", s.reason), dim()));
        }
    } else {
        pre.push(Line::styled("Press m to simulate the fixture", dim()));
    }
    frame.render_widget(
        Paragraph::new(pre)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Pre-match").borders(Borders::ALL)),
        right[1],
    );
}

fn render_matches(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.team.chances_loading {
        empty_hint(frame, area, "Analysing chances…");
        return;
    }
    let Some(analysis) = state.team.chances.as_ref() else {
        let matches = state.reviewable_matches();
        let mut lines: Vec<Line> = Vec::new();
        for (idx, m) in matches.iter().enumerate() {
            let tone = match ResultTone::of(m) {
                ResultTone::Draw => Color::Yellow,
                ResultTone::Loss => Color::Red,
            };
            lines.push(
                Line::from(vec![
                    Span::styled(format!("{} ", m.date), dim()),
                    Span::raw(format!("{} ", m.home_team)),
                    Span::styled(m.score.clone(), Style::default().fg(tone)),
                    Span::raw(format!(" {}", m.away_team)),
                ])
                .style(selected_style(idx == state.match_selected)),
            );
        }
        if lines.is_empty() {
            lines.push(Line::styled("No draws or defeats to review", dim()));
        }
        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().title("Missed-chance matches").borders(Borders::ALL)),
            area,
        );
        return;
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let moments = state.chance_moments();
    let mut lines = vec![Line::styled(
        format!(
            "{} {} {} · {}",
            analysis.home_team.name, analysis.score, analysis.away_team.name, analysis.date
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    let counts = chance_counts(analysis)
        .into_iter()
        .map(|(team, n)| format!("{team} {n}"))
        .collect::<Vec<_>>();
    if !counts.is_empty() {
        lines.push(Line::styled(format!("Key moments: {}", counts.join(" · ")), dim()));
    }
    for (idx, moment) in moments.iter().enumerate() {
        let summary = summarize_moment(moment);
        lines.push(Line::raw(summary.header.clone()).style(selected_style(idx == state.moment_selected)));
        if idx == state.moment_selected {
            lines.push(Line::raw(format!(
                "  {} · {} · {}",
                summary.situation, summary.distance, summary.zone
            )));
            lines.push(Line::styled(format!("  ✗ {}", summary.failure), Style::default().fg(Color::Red)));
            lines.push(Line::styled(format!("  ✓ {}", summary.suggestion), Style::default().fg(Color::Green)));
            let actual = summary
                .actual_xg
                .map(|v| format!("{v:.1}%"))
                .unwrap_or_else(|| DASH.to_string());
            let expected = summary
                .expected_xg
                .map(|v| format!("{v:.1}%"))
                .unwrap_or_else(|| DASH.to_string());
            lines.push(Line::raw(format!("  xG {actual} → {expected} ({})", summary.xg_delta)));
        }
    }
    if moments.is_empty() {
        lines.push(Line::styled("No key moments for this team", dim()));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Key moments").borders(Borders::ALL)),
        cols[0],
    );

    let pitch = PitchFrame::MINI;
    let selected = moments.get(state.moment_selected).copied();
    let canvas = Canvas::default()
        .block(Block::default().title("Better option").borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([0.0, pitch.width])
        .y_bounds([0.0, pitch.height])
        .paint(|ctx| {
            draw_pitch_markings(ctx, pitch);
            let Some(moment) = selected else {
                return;
            };
            let reloc = key_moment_relocation(moment).in_frame(pitch);
            let flip = |p: Point| (p.x, pitch.height - p.y);
            let (ax, ay) = flip(reloc.actual);
            let (sx, sy) = flip(reloc.suggested);
            ctx.draw(&CanvasLine::new(ax, ay, sx, sy, Color::DarkGray));
            for dot in reloc.trail {
                let (x, y) = flip(dot);
                ctx.draw(&Circle { x, y, radius: 0.6, color: Color::Gray });
            }
            ctx.draw(&Circle { x: ax, y: ay, radius: 2.0, color: Color::Red });
            ctx.draw(&Circle { x: sx, y: sy, radius: 2.0, color: Color::Green });
        });
    frame.render_widget(canvas, cols[1]);
}

fn render_video(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);
    let v = &state.video;
    let field = |label: &str, value: &str, active: bool| {
        let cursor = if active { "▏" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:<6}"), dim()),
            Span::styled(
                format!("{value}{cursor}"),
                if active {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                },
            ),
        ])
    };
    let status = match (&v.error, &v.job) {
        (Some(err), _) => Line::styled(err.clone(), Style::default().fg(Color::Red)),
        (None, _) if v.busy => Line::styled("Submitting…", dim()),
        (None, Some(job)) => Line::raw(format!(
            "Job {} · {}",
            job.job_id,
            video::job_status(job).label()
        )),
        (None, None) => Line::styled("Paste a YouTube link or a local .mp4/.mov/.mkv path", dim()),
    };
    let input = vec![
        field("Link", &v.url_input, v.editing == Some(VideoField::Url)),
        field("File", &v.file_input, v.editing == Some(VideoField::File)),
        status,
    ];
    frame.render_widget(
        Paragraph::new(input).block(Block::default().title("Video analysis").borders(Borders::ALL)),
        rows[0],
    );

    let report = v.job.as_ref().and_then(|j| j.report.as_ref());
    let mut lines: Vec<Line> = Vec::new();
    if let Some(url) = video::embed_url(v.job.as_ref(), &v.url_input, v.seek) {
        lines.push(Line::styled(url, dim()));
    }
    match report {
        Some(report) => {
            for (idx, m) in report.moments.iter().enumerate() {
                lines.push(
                    Line::raw(format!(
                        "{} {} · ΔxG {} · conf {}",
                        video::fmt_time(m.ts),
                        m.label,
                        signed(to_pct(Some(m.delta)).unwrap_or(0.0), 1),
                        pct(m.conf, 0)
                    ))
                    .style(selected_style(idx == v.moment_selected)),
                );
                if idx == v.moment_selected && !m.note.is_empty() {
                    lines.push(Line::styled(format!("   {}", m.note), dim()));
                }
            }
            for note in &report.notes {
                lines.push(Line::styled(format!("• {note}"), dim()));
            }
        }
        None if v.working() => lines.push(Line::styled("Analysing video…", dim())),
        None => {}
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Moments").borders(Borders::ALL)),
        rows[1],
    );
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Console").borders(Borders::TOP);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (log_area, gauge_area) = if state.export.active && !state.export.done {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        (parts[0], Some(parts[1]))
    } else {
        (inner, None)
    };

    let take = log_area.height as usize;
    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(take)
        .rev()
        .map(|msg| {
            let color = if msg.starts_with("[WARN]") || msg.starts_with("[ALERT]") {
                Color::Yellow
            } else {
                Color::Gray
            };
            Line::styled(msg.clone(), Style::default().fg(color))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), log_area);

    if let Some(gauge_area) = gauge_area {
        let ratio = if state.export.total == 0 {
            0.0
        } else {
            (state.export.current as f64 / state.export.total as f64).clamp(0.0, 1.0)
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(ratio)
            .label(state.export.message.clone());
        frame.render_widget(gauge, gauge_area);
    }
}

fn group_color(group: PositionGroup) -> Color {
    match group {
        PositionGroup::Goalkeeper => Color::LightYellow,
        PositionGroup::Defender => Color::LightBlue,
        PositionGroup::Midfielder => Color::Green,
        PositionGroup::AttackingMid => Color::LightMagenta,
        PositionGroup::Forward => Color::LightRed,
        PositionGroup::Other => Color::Gray,
    }
}

fn draw_segment(ctx: &mut Context, pitch: PitchFrame, a: Point, b: Point, color: Color) {
    ctx.draw(&CanvasLine::new(
        a.x,
        pitch.height - a.y,
        b.x,
        pitch.height - b.y,
        color,
    ));
}

/// Touchlines, halfway line, centre circle and both penalty boxes.
fn draw_pitch_markings(ctx: &mut Context, pitch: PitchFrame) {
    let color = Color::DarkGray;
    let top_left = pitch.point(Point::new(0.0, 0.0));
    let bottom_right = pitch.point(Point::new(PITCH_LENGTH, PITCH_WIDTH));
    ctx.draw(&Rectangle {
        x: top_left.x,
        y: pitch.height - bottom_right.y,
        width: bottom_right.x - top_left.x,
        height: bottom_right.y - top_left.y,
        color,
    });
    draw_segment(
        ctx,
        pitch,
        pitch.point(Point::new(PITCH_LENGTH / 2.0, 0.0)),
        pitch.point(Point::new(PITCH_LENGTH / 2.0, PITCH_WIDTH)),
        color,
    );
    let centre = pitch.point(Point::new(PITCH_LENGTH / 2.0, PITCH_WIDTH / 2.0));
    ctx.draw(&Circle {
        x: centre.x,
        y: pitch.height - centre.y,
        radius: 9.15 * pitch.scale_y(),
        color,
    });
    for (x0, x1) in [(0.0, 16.5), (PITCH_LENGTH - 16.5, PITCH_LENGTH)] {
        let a = pitch.point(Point::new(x0, 13.85));
        let b = pitch.point(Point::new(x1, 54.15));
        ctx.draw(&Rectangle {
            x: a.x,
            y: pitch.height - b.y,
            width: b.x - a.x,
            height: b.y - a.y,
            color,
        });
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Matchday Scout - Help",
        "",
        "Global:",
        "  Enter        Open team / run action",
        "  b / Esc      Back to standings",
        "  Tab / S-Tab  Next / previous tab",
        "  1-7          Jump to tab",
        "  j/k or ↑/↓   Move selection",
        "  r            Refresh",
        "  e            Export team workbook",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Patterns:  Space play/pause · ←/→ step · s speed · 0 restart",
        "Network:   j/k focus a player · x clear focus",
        "Simulation: Enter press hub · o opponent · m pre-match",
        "Matches:   Enter analyse chances · x back to list",
        "Video:     u link · f file · Enter analyse · g seek · c clear",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
