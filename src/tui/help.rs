use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn keybind(keys: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(keys, Style::default().fg(Color::Magenta)),
        Span::raw(format!("{:pad$}{what}", "")),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Run:"),
        keybind("j/k", 9, "Next / previous notebook"),
        keybind("r", 11, "Run selected notebook"),
        keybind("s", 11, "Stop the active run"),
        keybind("u", 11, "Refresh status"),
        keybind("n", 11, "Reload notebooks"),
        Line::from(""),
        Line::from("Outputs:"),
        keybind("]/[", 9, "Next / previous log"),
        keybind("l", 11, "Reload logs"),
        keybind("m", 11, "Summarize selected log"),
        keybind("p", 11, "Switch provider (Local / AWS Bedrock)"),
        keybind("c", 11, "Copy summary to clipboard"),
        keybind("x", 11, "Clear summary"),
        Line::from(""),
        Line::from("Activity:"),
        keybind("i", 11, "Ask something (Enter sends, Esc cancels)"),
        keybind("PgUp/PgDn", 3, "Scroll activity"),
        Line::from(""),
        keybind("?", 11, "Toggle this help"),
        keybind("q / Ctrl-C", 2, "Quit"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
