mod clipboard;
mod help;
mod state;

use crate::cli::{build_config, Cli};
use anyhow::{Context, Result};
use clipboard::copy_to_clipboard;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use state::{label_style, push_wrapped, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::watch;
use trackit_console::model::Role;
use trackit_console::orchestrator::{Command, CommandSender};
use trackit_console::{view, ControllerHandle, Dashboard, GatewayClient};

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    tracing::info!(
        config = %serde_json::to_string(&cfg).context("serialize config")?,
        "starting tui"
    );
    let gateway = GatewayClient::new(&cfg).context("build gateway client")?;
    let controller = ControllerHandle::spawn(gateway, &cfg);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let state_rx = controller.subscribe();
    let cmd_tx = controller.commands();
    let ui_handle = std::thread::spawn(move || run_threaded(state_rx, cmd_tx));

    // The UI thread sends Quit when it exits, which ends the controller loop.
    let res = controller.join().await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread. Always asks the controller to quit on exit.
fn run_threaded(state_rx: watch::Receiver<Dashboard>, cmd_tx: CommandSender) -> Result<()> {
    let res = ui_loop(state_rx, &cmd_tx);
    let _ = cmd_tx.send(Command::Quit);
    res
}

enum KeyOutcome {
    Continue,
    Quit,
}

fn ui_loop(mut state_rx: watch::Receiver<Dashboard>, cmd_tx: &CommandSender) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::default();
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now() - tick_rate;

    let mut snapshot = state_rx.borrow_and_update().clone();
    state.observe_feed(snapshot.feed().len());

    let res = loop {
        state.refresh(&mut state_rx, &mut snapshot);

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &snapshot, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if let KeyOutcome::Quit = handle_key(k, &snapshot, &mut state, cmd_tx) {
                    break Ok(());
                }
                // Redraw immediately so key feedback is not delayed a tick.
                last_tick = Instant::now() - tick_rate;
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn send(cmd_tx: &CommandSender, cmd: Command) {
    let _ = cmd_tx.send(cmd);
}

fn handle_key(k: KeyEvent, d: &Dashboard, state: &mut UiState, cmd_tx: &CommandSender) -> KeyOutcome {
    if k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    if state.composing {
        match k.code {
            // The composer title reads "Sending…" until the pending reply lands.
            KeyCode::Enter if d.sending() => {}
            KeyCode::Enter => {
                let draft = state.take_draft();
                send(cmd_tx, Command::SendChat(draft));
            }
            KeyCode::Esc => state.composing = false,
            KeyCode::Backspace => {
                state.draft.pop();
            }
            KeyCode::Char(c) => state.draft.push(c),
            _ => {}
        }
        return KeyOutcome::Continue;
    }

    match k.code {
        KeyCode::Char('q') => return KeyOutcome::Quit,
        KeyCode::Char('?') => state.show_help = !state.show_help,
        KeyCode::Esc => state.show_help = false,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Up | KeyCode::Char('k') => {
            let step = if matches!(k.code, KeyCode::Down | KeyCode::Char('j')) {
                1
            } else {
                -1
            };
            if view::notebook_picker(d).enabled {
                let next = d.notebooks().neighbor(step).cloned();
                send(cmd_tx, Command::SelectNotebook(next));
            }
        }
        KeyCode::Char(']') | KeyCode::Char('[') => {
            let step = if k.code == KeyCode::Char(']') { 1 } else { -1 };
            if view::log_picker(d).enabled {
                let next = d.logs().neighbor(step).cloned();
                send(cmd_tx, Command::SelectLog(next));
            }
        }
        KeyCode::Char('r') => match d.selected_notebook() {
            Some(nb) if view::can_start(d) => {
                state.info = format!("Starting {nb}…");
                send(cmd_tx, Command::Start(nb.to_string()));
            }
            None => state.info = "Select a notebook first".into(),
            Some(_) => state.info = "Run unavailable while busy or running".into(),
        },
        KeyCode::Char('s') => {
            if view::can_stop(d) {
                state.info = "Stopping…".into();
                send(cmd_tx, Command::Stop);
            } else {
                state.info = "Nothing to stop".into();
            }
        }
        KeyCode::Char('u') => {
            state.info = "Refreshing status…".into();
            send(cmd_tx, Command::RefreshStatus);
        }
        KeyCode::Char('l') => send(cmd_tx, Command::LoadLogs),
        KeyCode::Char('n') => send(cmd_tx, Command::LoadNotebooks),
        KeyCode::Char('m') | KeyCode::Enter => match d.selected_log() {
            Some(log) if view::can_summarize(d) => {
                send(
                    cmd_tx,
                    Command::Summarize {
                        log: log.to_string(),
                        provider: d.provider(),
                    },
                );
            }
            None => state.info = "Select a log first".into(),
            Some(_) => {}
        },
        KeyCode::Char('p') => {
            let next = d.provider().toggled();
            state.info = format!("Provider: {}", next.label());
            send(cmd_tx, Command::SetProvider(next));
        }
        KeyCode::Char('c') => {
            let text = d.summary_text();
            if text.is_empty() {
                state.info = "No summary to copy".into();
            } else {
                state.info = match copy_to_clipboard(text) {
                    Ok(()) => "✓ Summary copied to clipboard".into(),
                    Err(e) => format!("Clipboard copy failed: {e:#}"),
                };
            }
        }
        KeyCode::Char('x') => send(cmd_tx, Command::ClearSummary),
        KeyCode::Char('i') | KeyCode::Char('/') => state.composing = true,
        KeyCode::PageUp => state.scroll_feed_up(d.feed().len()),
        KeyCode::PageDown => state.scroll_feed_down(),
        _ => {}
    }
    KeyOutcome::Continue
}

fn enabled_style(enabled: bool) -> Style {
    if enabled {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn key_span(key: &'static str) -> Span<'static> {
    Span::styled(key, Style::default().fg(Color::Magenta))
}

fn draw(area: Rect, f: &mut ratatui::Frame, d: &Dashboard, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    draw_header(chunks[0], f, d);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length(36),
                Constraint::Min(30),
                Constraint::Percentage(42),
            ]
            .as_ref(),
        )
        .split(chunks[1]);

    draw_controls(body[0], f, d);
    draw_activity(body[1], f, d, state);
    draw_summary(body[2], f, d);
    draw_composer(chunks[2], f, d, state);

    if state.show_help {
        help::draw_help(chunks[1], f);
    }
}

fn draw_header(area: Rect, f: &mut ratatui::Frame, d: &Dashboard) {
    let pill = view::status_pill(d);
    let pill_style = if pill.active {
        Style::default().fg(Color::Black).bg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    };
    let line = Line::from(vec![
        Span::styled("Provider ", label_style()),
        Span::raw(d.provider().label()),
        Span::raw("   "),
        Span::styled(format!(" {} ", pill.text), pill_style),
    ]);
    let p = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Trackit · Run notebooks · Generate summaries"),
    );
    f.render_widget(p, area);
}

fn draw_controls(area: Rect, f: &mut ratatui::Frame, d: &Dashboard) {
    let width = area.width.saturating_sub(2);
    let nb = view::notebook_picker(d);
    let log = view::log_picker(d);
    let mut lines = vec![
        Line::from(Span::styled("Run", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("Notebook: ", label_style()),
            Span::styled(nb.label, enabled_style(nb.enabled)),
        ]),
        Line::from(vec![
            key_span("r"),
            Span::styled(" ▶ Run   ", enabled_style(view::can_start(d))),
            key_span("s"),
            Span::styled(" ■ Stop", enabled_style(view::can_stop(d))),
        ]),
        Line::from(vec![key_span("u"), Span::raw(" ⟳ Refresh status")]),
    ];
    push_wrapped(&mut lines, "Current", label_style(), &view::current_run_label(d), width);
    if let Some(started) = view::run_started(d) {
        push_wrapped(&mut lines, "Started", label_style(), &started, width);
    }
    if let Some(log_file) = d.run_state().active().and_then(|r| r.log_file.as_deref()) {
        push_wrapped(&mut lines, "Output", label_style(), log_file, width);
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Outputs",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let mut log_label = log.label;
    if d.logs().selection_is_stale() {
        log_label.push_str(" (missing)");
    }
    lines.push(Line::from(vec![
        Span::styled("Log: ", label_style()),
        Span::styled(log_label, enabled_style(log.enabled)),
    ]));
    lines.push(Line::from(vec![key_span("l"), Span::raw(" ⟳ Refresh logs")]));
    lines.push(Line::from(vec![
        key_span("m"),
        Span::raw(" "),
        Span::styled(view::summarize_label(d), enabled_style(view::can_summarize(d))),
    ]));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(p, area);
}

fn draw_activity(area: Rect, f: &mut ratatui::Frame, d: &Dashboard, state: &UiState) {
    let width = area.width.saturating_sub(2);
    let height = area.height.saturating_sub(2) as usize;
    let entries = d.feed().entries();
    let end = entries.len().saturating_sub(state.feed_offset);

    // Walk back from the newest visible entry until the panel is full.
    let mut blocks: Vec<Vec<Line<'static>>> = Vec::new();
    let mut used = 0usize;
    for m in entries[..end].iter().rev() {
        let style = match m.role {
            Role::User => Style::default().fg(Color::Cyan),
            Role::Assistant => label_style(),
        };
        let mut block = Vec::new();
        let label = format!("{} {}", view::clock(m), view::speaker(m.role));
        push_wrapped(&mut block, &label, style, &m.content, width);
        used += block.len();
        blocks.push(block);
        if used >= height {
            break;
        }
    }
    let mut lines: Vec<Line<'static>> = blocks.into_iter().rev().flatten().collect();
    let overflow = lines.len().saturating_sub(height);
    lines.drain(..overflow);

    let title = if state.feed_offset > 0 {
        format!("Activity (↑{})", state.feed_offset)
    } else {
        "Activity".to_string()
    };
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_summary(area: Rect, f: &mut ratatui::Frame, d: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(area);

    let badge_style = if d.summary().is_some() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let body_style = if d.summary().is_some() {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let p = Paragraph::new(view::summary_body(d))
        .style(body_style)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(vec![
                    Span::raw("Summary "),
                    Span::styled(format!("● {}", view::summary_badge(d)), badge_style),
                ])),
        );
    f.render_widget(p, chunks[0]);

    let footer = Line::from(vec![
        key_span(" c"),
        Span::raw(" Copy  "),
        key_span("x"),
        Span::raw(" Clear  "),
        Span::styled(format!("Provider: {}", d.provider().label()), label_style()),
    ]);
    f.render_widget(Paragraph::new(footer), chunks[1]);
}

fn draw_composer(area: Rect, f: &mut ratatui::Frame, d: &Dashboard, state: &UiState) {
    let line = if state.composing {
        Line::from(vec![Span::raw("> "), Span::raw(state.draft.clone()), Span::raw("█")])
    } else if !state.info.is_empty() {
        Line::from(Span::styled(state.info.clone(), label_style()))
    } else {
        Line::from(vec![
            key_span("i"),
            Span::styled(" Ask something…   ", label_style()),
            key_span("?"),
            Span::styled(" help   ", label_style()),
            key_span("q"),
            Span::styled(" quit", label_style()),
        ])
    };
    let p = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(view::send_label(d)),
    );
    f.render_widget(p, area);
}
