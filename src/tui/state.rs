use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use tokio::sync::watch;
use trackit_console::Dashboard;

/// TUI-local state. Everything shared lives in the controller's `Dashboard`.
#[derive(Debug, Default)]
pub struct UiState {
    pub info: String,
    pub show_help: bool,
    pub composing: bool,
    pub draft: String,
    /// Entries hidden below the viewport; 0 follows the newest entry.
    pub feed_offset: usize,
    seen_feed: usize,
}

impl UiState {
    /// Jump back to the newest entry whenever the feed grows.
    pub fn observe_feed(&mut self, len: usize) {
        if len > self.seen_feed {
            self.feed_offset = 0;
        }
        self.seen_feed = len;
    }

    pub fn scroll_feed_up(&mut self, len: usize) {
        self.feed_offset = (self.feed_offset + 3).min(len.saturating_sub(1));
    }

    pub fn scroll_feed_down(&mut self) {
        self.feed_offset = self.feed_offset.saturating_sub(3);
    }

    /// Replace `snapshot` if the controller published since the last call.
    /// Returns whether it did; unchanged frames reuse the old clone.
    pub fn refresh(&mut self, rx: &mut watch::Receiver<Dashboard>, snapshot: &mut Dashboard) -> bool {
        if !rx.has_changed().unwrap_or(false) {
            return false;
        }
        *snapshot = rx.borrow_and_update().clone();
        self.observe_feed(snapshot.feed().len());
        true
    }

    /// Take the composed utterance, leaving compose mode.
    pub fn take_draft(&mut self) -> String {
        self.composing = false;
        std::mem::take(&mut self.draft)
    }
}

/// Append `label: value` to `out`, hard-wrapping the value to `width` columns.
pub fn push_wrapped(
    out: &mut Vec<Line<'static>>,
    label: &str,
    label_style: Style,
    value: &str,
    width: u16,
) {
    let usable_width = width.max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let mut first = true;
    for raw_line in value.split('\n') {
        let value_chars: Vec<char> = raw_line.chars().collect();
        let mut remaining = value_chars.as_slice();
        loop {
            let line_width = if first {
                usable_width.saturating_sub(label_width + 1).max(1)
            } else {
                usable_width.saturating_sub(2).max(1)
            };

            let chars_to_take = remaining.len().min(line_width as usize);
            let (line_chars, rest) = remaining.split_at(chars_to_take);
            let line_text: String = line_chars.iter().collect();

            if first {
                out.push(Line::from(vec![
                    Span::styled(label_text.clone(), label_style),
                    Span::raw(" "),
                    Span::raw(line_text),
                ]));
                first = false;
            } else {
                out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
            }

            remaining = rest;
            if remaining.is_empty() {
                break;
            }
        }
    }
}

pub fn label_style() -> Style {
    Style::default().fg(Color::Gray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackit_console::Provider;

    #[test]
    fn growing_feed_resets_scroll() {
        let mut state = UiState::default();
        state.observe_feed(5);
        state.scroll_feed_up(5);
        assert_eq!(state.feed_offset, 3);
        state.observe_feed(5);
        assert_eq!(state.feed_offset, 3);
        state.observe_feed(6);
        assert_eq!(state.feed_offset, 0);
    }

    #[test]
    fn scroll_stays_in_bounds() {
        let mut state = UiState::default();
        state.scroll_feed_up(2);
        assert_eq!(state.feed_offset, 1);
        state.scroll_feed_down();
        assert_eq!(state.feed_offset, 0);
    }

    #[test]
    fn wrapping_splits_long_values_and_newlines() {
        let mut out = Vec::new();
        push_wrapped(&mut out, "you", label_style(), "abcdefghij\nxy", 9);
        // "you:" + space leaves 4 columns on the first line, 7 after indent.
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].spans[2].content, "abcd");
        assert_eq!(out[1].spans[1].content, "efghij");
        assert_eq!(out[2].spans[1].content, "xy");
    }

    #[test]
    fn wrapping_handles_values_longer_than_u16() {
        let value = "x".repeat(70_000);
        let mut out = Vec::new();
        push_wrapped(&mut out, "you", label_style(), &value, 80);
        // 75 columns on the first line, then 78 per continuation line.
        assert_eq!(out.len(), 1 + (70_000 - 75 + 77) / 78);
        let wrapped: usize = out
            .iter()
            .map(|l| l.spans.last().map(|s| s.content.chars().count()).unwrap_or(0))
            .sum();
        assert_eq!(wrapped, 70_000);
    }

    #[test]
    fn refresh_clones_only_after_a_publish() {
        let (tx, mut rx) = watch::channel(Dashboard::default());
        let mut state = UiState::default();
        let mut snapshot = rx.borrow_and_update().clone();
        assert!(!state.refresh(&mut rx, &mut snapshot));

        tx.send_replace(Dashboard::new(Provider::Bedrock));
        assert!(state.refresh(&mut rx, &mut snapshot));
        assert_eq!(snapshot.provider(), Provider::Bedrock);
        assert!(!state.refresh(&mut rx, &mut snapshot));
    }

    #[test]
    fn take_draft_leaves_compose_mode() {
        let mut state = UiState {
            composing: true,
            draft: "hi".into(),
            ..Default::default()
        };
        assert_eq!(state.take_draft(), "hi");
        assert!(!state.composing);
        assert!(state.draft.is_empty());
    }
}
