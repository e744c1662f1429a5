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
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use ff_lineup_terminal::backend_fetch::backend_from_config;
use ff_lineup_terminal::config::AppConfig;
use ff_lineup_terminal::identity::SessionIdentity;
use ff_lineup_terminal::lineup::{LineupRow, RosterView, TierIndicator};
use ff_lineup_terminal::percentiles::format_probability;
use ff_lineup_terminal::provider::spawn_provider;
use ff_lineup_terminal::roster::MAX_MATCHUP_STARS;
use ff_lineup_terminal::state::{
    self, AppState, Phase, RegistrationStatus, THRESHOLD_STEP, apply_delta,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<state::ProviderCommand>,
    backend_label: String,
}

impl App {
    fn new(
        state: AppState,
        cmd_tx: mpsc::Sender<state::ProviderCommand>,
        backend_label: String,
    ) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
            backend_label,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input_active {
            self.on_input_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('u') | KeyCode::Char('/') => self.state.input_active = true,
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                self.state.select_next_league();
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                self.state.select_prev_league();
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_row_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_row_prev(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.state.nudge_threshold(THRESHOLD_STEP),
            KeyCode::Char('-') | KeyCode::Char('_') => {
                self.state.nudge_threshold(-THRESHOLD_STEP)
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if !self.state.reload_league() {
                    self.state.push_log("[INFO] Nothing to reload");
                }
            }
            KeyCode::Char('w') | KeyCode::Char('W') => self.state.toggle_website(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Err(err) = self.state.submit_username() {
                    self.state.push_log(format!("[WARN] {err}"));
                }
            }
            KeyCode::Esc => self.state.input_active = false,
            KeyCode::Backspace => {
                self.state.username_input.pop();
            }
            KeyCode::Tab => self.state.toggle_website(),
            KeyCode::Char(c) => self.state.username_input.push(c),
            _ => {}
        }
    }

    fn flush_commands(&mut self) {
        for cmd in self.state.take_pending() {
            if self.cmd_tx.send(cmd).is_err() {
                self.state.push_log("[WARN] Provider stopped; request dropped");
            }
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    let backend = match backend_from_config(&config) {
        Ok(backend) => backend,
        Err(err) => {
            eprintln!("error: {err:#}");
            return Ok(());
        }
    };

    let mut state = AppState::new(Some(SessionIdentity::generate()));
    state.website = config.website;
    state.push_log(format!("[INFO] Backend: {}", config.backend_label()));
    state.request_last_run();

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(backend, tx, cmd_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(term_backend)?;

    let mut app = App::new(state, cmd_tx, config.backend_label());
    let res = run_app(&mut terminal, &mut app, rx);

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
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.flush_commands();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }
        app.flush_commands();

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
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
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let state = &app.state;
    if state.input_active {
        render_username_prompt(frame, chunks[1], state);
    } else {
        let body = chunks[1];
        match &state.phase {
            Phase::Idle => render_idle(frame, body, state),
            Phase::CatalogLoading => {
                render_notice(frame, body, "Loading leagues...", Color::Yellow)
            }
            Phase::CatalogError { message } => render_notice(frame, body, message, Color::Red),
            Phase::CatalogReady { selection: None } => {
                render_notice(frame, body, "No leagues found for this user", Color::DarkGray)
            }
            Phase::CatalogReady { .. }
            | Phase::RosterLoading { .. }
            | Phase::RosterReady { .. }
            | Phase::RosterError { .. } => render_league(frame, body, state),
        }
    }

    let footer = Paragraph::new(footer_text(state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let state = &app.state;
    let user = match &state.registration {
        RegistrationStatus::Done { username } | RegistrationStatus::Pending { username } => {
            username.as_str()
        }
        _ => "-",
    };
    let session = state
        .identity
        .as_ref()
        .map(SessionIdentity::short)
        .unwrap_or("none");
    let line1 = format!(
        "FF LINEUP | {} | user: {user} | {}",
        state.website.label(),
        app.backend_label
    );
    let line2 = format!(
        "Data last updated at: {} | session {session}",
        state.last_run.as_deref().unwrap_or("unknown")
    );
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    let keys = if state.input_active {
        "Enter Submit | Tab Website | Esc Cancel"
    } else {
        "h/l League | j/k Move | +/- Threshold | r Reload | u User | w Website | ? Help | q Quit"
    };
    match state.logs.back() {
        Some(last) => format!("{keys}\n{last}"),
        None => keys.to_string(),
    }
}

fn render_username_prompt(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = vec![
        Line::from("Enter your username to load your leagues."),
        Line::from(format!("Website: {} (Tab to switch)", state.website.label())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Username: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(state.username_input.clone()),
            Span::styled("_", Style::default().fg(Color::DarkGray)),
        ]),
    ];
    if let RegistrationStatus::Failed(reason) = &state.registration {
        lines.push(Line::from(""));
        lines.push(Line::styled(reason.clone(), Style::default().fg(Color::Red)));
    }
    let prompt = Paragraph::new(lines)
        .block(Block::default().title("Sign in").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(prompt, centered_rect(60, 50, area));
}

fn render_idle(frame: &mut Frame, area: Rect, state: &AppState) {
    let text = match &state.registration {
        RegistrationStatus::Pending { username } => format!("Loading teams for {username}..."),
        RegistrationStatus::Failed(reason) => reason.clone(),
        _ => "Press u to enter a username".to_string(),
    };
    render_notice(frame, area, &text, Color::DarkGray);
}

fn render_notice(frame: &mut Frame, area: Rect, text: &str, color: Color) {
    let notice = Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true });
    frame.render_widget(notice, area);
}

fn render_league(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);
    frame.render_widget(Paragraph::new(league_tabs(state)), sections[0]);

    match &state.phase {
        Phase::RosterLoading { league } => render_notice(
            frame,
            sections[1],
            &format!("Loading {league}..."),
            Color::Yellow,
        ),
        Phase::RosterError { message, .. } => {
            render_notice(frame, sections[1], message, Color::Red)
        }
        _ => match &state.roster {
            Some(view) => render_roster(frame, sections[1], state, view),
            None => render_notice(frame, sections[1], "No roster loaded", Color::DarkGray),
        },
    }
}

fn league_tabs(state: &AppState) -> Line<'static> {
    let Some(catalog) = &state.catalog else {
        return Line::from("");
    };
    let mut spans = Vec::new();
    for (idx, name) in catalog.names().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        let selected = state.selected_league.as_deref() == Some(name);
        let style = if selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {name} "), style));
    }
    Line::from(spans)
}

enum DisplayLine<'a> {
    Group(&'a str),
    Row(usize, &'a LineupRow),
}

fn display_lines(view: &RosterView) -> Vec<DisplayLine<'_>> {
    let mut out: Vec<DisplayLine<'_>> = view
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| DisplayLine::Row(idx, row))
        .collect();
    let mut idx = view.rows.len();
    for group in &view.free_agents {
        if group.rows.is_empty() {
            continue;
        }
        out.push(DisplayLine::Group(&group.position));
        for row in &group.rows {
            out.push(DisplayLine::Row(idx, row));
            idx += 1;
        }
    }
    out
}

fn render_roster(frame: &mut Frame, area: Rect, state: &AppState, view: &RosterView) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(60), Constraint::Length(42)])
        .split(area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(columns[0]);
    let widths = roster_columns();
    render_roster_header(frame, sections[0], &widths);

    let list_area = sections[1];
    let lines = display_lines(view);
    if lines.is_empty() {
        render_notice(frame, list_area, "Empty roster", Color::DarkGray);
    } else if list_area.height > 0 {
        let selected_line = lines
            .iter()
            .position(|line| matches!(line, DisplayLine::Row(idx, _) if *idx == state.selected_row))
            .unwrap_or(0);
        let (start, end) = visible_range(selected_line, lines.len(), list_area.height as usize);

        for (i, line) in lines[start..end].iter().enumerate() {
            let row_area = Rect {
                x: list_area.x,
                y: list_area.y + i as u16,
                width: list_area.width,
                height: 1,
            };
            match line {
                DisplayLine::Group(position) => {
                    let title = Paragraph::new(format!("Free agents: {position}")).style(
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    );
                    frame.render_widget(title, row_area);
                }
                DisplayLine::Row(idx, row) => {
                    render_roster_row(frame, row_area, &widths, row, *idx == state.selected_row)
                }
            }
        }
    }

    render_detail(frame, columns[1], state.selected_row());
}

fn roster_columns() -> [Constraint; 7] {
    [
        Constraint::Length(9),
        Constraint::Min(18),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(7),
        Constraint::Length(16),
        Constraint::Length(11),
    ]
}

fn render_roster_header(frame: &mut Frame, area: Rect, widths: &[Constraint]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);

    render_cell_text(frame, cols[0], "Slot", style);
    render_cell_text(frame, cols[1], "Player", style);
    render_cell_text(frame, cols[2], "Pos Tier", style);
    render_cell_text(frame, cols[3], "Flex Tier", style);
    render_cell_text(frame, cols[4], "Match", style);
    render_cell_text(frame, cols[5], "Projection", style);
    render_cell_text(frame, cols[6], ">=Pts  P", style);
}

fn render_roster_row(
    frame: &mut Frame,
    area: Rect,
    widths: &[Constraint],
    row: &LineupRow,
    selected: bool,
) {
    let row_style = if selected {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default()
    };
    if selected {
        frame.render_widget(Block::default().style(row_style), area);
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);

    let projection = row.entry.projection.points().map_or_else(
        || row.projection_label.clone(),
        |p| format!("{p:.2}"),
    );
    let odds = format!(
        "{:>3.0} {:>4}",
        row.threshold,
        format_probability(row.probability)
    );

    render_cell_text(frame, cols[0], row.entry.slot.label(), row_style);
    render_cell_text(frame, cols[1], &row.entry.name, row_style);
    render_tier_cell(frame, cols[2], Some(&row.position), row_style);
    render_tier_cell(frame, cols[3], row.flex.as_ref(), row_style);
    render_cell_text(frame, cols[4], &stars(row.stars), row_style);
    render_cell_text(frame, cols[5], &projection, row_style);
    render_cell_text(frame, cols[6], &odds, row_style);
}

fn render_tier_cell(
    frame: &mut Frame,
    area: Rect,
    indicator: Option<&TierIndicator>,
    style: Style,
) {
    let Some(indicator) = indicator else {
        render_cell_text(frame, area, "", style);
        return;
    };
    let line = Line::from(vec![
        Span::styled("● ", style.fg(tier_color(indicator))),
        Span::styled(indicator.label.clone(), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn tier_color(indicator: &TierIndicator) -> Color {
    let (r, g, b) = indicator.color.rgb;
    Color::Rgb(r, g, b)
}

fn stars(count: u8) -> String {
    let filled = count.min(MAX_MATCHUP_STARS);
    let mut out = "*".repeat(usize::from(filled));
    out.push_str(&".".repeat(usize::from(MAX_MATCHUP_STARS - filled)));
    out
}

fn render_detail(frame: &mut Frame, area: Rect, row: Option<&LineupRow>) {
    let block = Block::default().title("Player").borders(Borders::ALL);
    let Some(row) = row else {
        frame.render_widget(Paragraph::new("No player selected").block(block), area);
        return;
    };
    let entry = &row.entry;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::styled(entry.name.clone(), bold),
        Line::from(format!(
            "{} | {}",
            entry.slot.label(),
            entry
                .team_name
                .as_deref()
                .or(entry.team.as_deref())
                .unwrap_or("-")
        )),
        Line::from(vec![
            Span::raw("Position: "),
            Span::styled("● ", Style::default().fg(tier_color(&row.position))),
            Span::raw(row.position.label.clone()),
        ]),
    ];
    if let Some(flex) = &row.flex {
        lines.push(Line::from(vec![
            Span::raw("Flex:     "),
            Span::styled("● ", Style::default().fg(tier_color(flex))),
            Span::raw(flex.label.clone()),
        ]));
    }
    lines.push(Line::from(format!("Matchup:  {}", stars(row.stars))));
    lines.push(Line::from(format!("Vegas:    {}", row.projection_label)));
    if let Some(line) = row.boom_bust_label() {
        lines.push(Line::from(line));
    }

    lines.push(Line::from(""));
    match &entry.percentiles {
        Some(_) => {
            lines.push(Line::styled(
                format!(
                    "P(>= {:.0} pts) = {}",
                    row.threshold,
                    format_probability(row.probability)
                ),
                bold,
            ));
            lines.push(Line::from(threshold_bar(row, 30)));
        }
        None => lines.push(Line::styled(
            "No outcome distribution",
            Style::default().fg(Color::DarkGray),
        )),
    }

    if !entry.stat_line.is_empty() {
        lines.push(Line::from(""));
        for stat in &entry.stat_line {
            lines.push(Line::from(format!("{}: {:.1}", stat.name, stat.value)));
        }
    }

    if let Some(url) = entry.headshot_url().or_else(|| entry.team_logo_url()) {
        lines.push(Line::from(""));
        lines.push(Line::styled(url, Style::default().fg(Color::DarkGray)));
    }

    let detail = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(detail, area);
}

fn threshold_bar(row: &LineupRow, width: usize) -> String {
    if row.threshold_max <= 0.0 {
        return format!("[{}]", "-".repeat(width));
    }
    let pos = ((row.threshold / row.threshold_max) * width as f64).round() as usize;
    let pos = pos.min(width);
    format!(
        "0 [{}|{}] {:.0}",
        "=".repeat(pos),
        "-".repeat(width - pos),
        row.threshold_max
    )
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text.to_string()).style(style);
    frame.render_widget(paragraph, text_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "FF Lineup - Help",
        "",
        "Leagues:",
        "  h/l or ←/→   Previous/next league",
        "  r            Reload league",
        "  u or /       Change username",
        "  w            Toggle website",
        "",
        "Roster:",
        "  j/k or ↑/↓   Move",
        "  + / -        Raise/lower points threshold",
        "",
        "  ?            Toggle help",
        "  q            Quit",
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
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
