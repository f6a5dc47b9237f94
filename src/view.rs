//! Presentation values derived from a [`Dashboard`] snapshot.
//!
//! Nothing here mutates state; skins call these and render the result.

use crate::model::{local_offset, Message, Role};
use crate::orchestrator::Dashboard;
use crate::registry::RegistryState;
use time::macros::format_description;
use time::OffsetDateTime;

pub const SUMMARY_PLACEHOLDER: &str =
    "Generate a summary to see it here. Tip: keep logs short + structured for best results.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPill {
    pub text: String,
    pub active: bool,
}

pub fn status_pill(d: &Dashboard) -> StatusPill {
    let run = d.run_state();
    if run.running() {
        let pid = run
            .pid()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "—".into());
        StatusPill {
            text: format!("Running · PID {pid}"),
            active: true,
        }
    } else {
        StatusPill {
            text: "Idle".into(),
            active: false,
        }
    }
}

/// The "Current" line under the run controls.
pub fn current_run_label(d: &Dashboard) -> String {
    match d.run_state().active() {
        Some(run) => format!(
            "{} · PID {}",
            run.notebook.as_deref().unwrap_or("Notebook"),
            run.pid
        ),
        None => "No active run".into(),
    }
}

/// When the active run started, as local `HH:MM:SS`, if the Gateway said.
pub fn run_started(d: &Dashboard) -> Option<String> {
    let secs = d.run_state().active()?.started_at?;
    OffsetDateTime::from_unix_timestamp(secs as i64)
        .ok()?
        .to_offset(local_offset())
        .format(format_description!("[hour]:[minute]:[second]"))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker {
    /// Selected item, or a placeholder when the list is empty.
    pub label: String,
    pub enabled: bool,
}

fn picker(reg: &RegistryState<String>, empty_label: &str, locked: bool) -> Picker {
    let label = if reg.is_empty() {
        if reg.loading() {
            "Loading…".to_string()
        } else {
            empty_label.to_string()
        }
    } else {
        reg.selected().cloned().unwrap_or_default()
    };
    Picker {
        label,
        enabled: !reg.loading() && !reg.is_empty() && !locked,
    }
}

pub fn notebook_picker(d: &Dashboard) -> Picker {
    picker(
        d.notebooks(),
        "No notebooks found",
        d.busy() || d.run_state().running(),
    )
}

pub fn log_picker(d: &Dashboard) -> Picker {
    picker(d.logs(), "No logs yet", d.summarizing())
}

pub fn can_start(d: &Dashboard) -> bool {
    d.selected_notebook().is_some_and(|nb| !nb.is_empty()) && !d.busy() && !d.run_state().running()
}

pub fn can_stop(d: &Dashboard) -> bool {
    d.run_state().running() && !d.busy()
}

pub fn can_summarize(d: &Dashboard) -> bool {
    !d.summarizing() && d.selected_log().is_some_and(|log| !log.is_empty())
}

pub fn summarize_label(d: &Dashboard) -> String {
    if d.summarizing() {
        "Summarizing…".into()
    } else {
        format!("Summarize with {}", d.provider().label())
    }
}

/// Badge above the summary: which log it is about.
pub fn summary_badge(d: &Dashboard) -> &str {
    d.selected_log().unwrap_or("No log selected")
}

pub fn summary_body(d: &Dashboard) -> &str {
    match d.summary() {
        Some(s) if !s.text.is_empty() => &s.text,
        _ => SUMMARY_PLACEHOLDER,
    }
}

pub fn send_label(d: &Dashboard) -> &'static str {
    if d.sending() {
        "Sending…"
    } else {
        "Send"
    }
}

/// Local wall-clock time of a feed entry, `HH:MM:SS`.
pub fn clock(message: &Message) -> String {
    message
        .at
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "--:--:--".into())
}

pub fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "trackit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActiveRun, Provider, RunStarted, RunState, SummaryResult};

    fn dashboard_with_lists() -> Dashboard {
        let mut d = Dashboard::default();
        d.notebooks.replace(vec!["a.ipynb".into(), "b.ipynb".into()]);
        d.logs.replace(vec!["run1.log".into()]);
        d
    }

    fn start(d: &mut Dashboard, pid: u32) {
        d.run.begin_start("a.ipynb").unwrap();
        d.run
            .finish_start::<()>(Ok(RunStarted {
                pid,
                notebook: "a.ipynb".into(),
                output_file: None,
                proc_log: None,
            }))
            .unwrap();
    }

    #[test]
    fn idle_pill_and_current_label() {
        let d = Dashboard::default();
        assert_eq!(
            status_pill(&d),
            StatusPill {
                text: "Idle".into(),
                active: false
            }
        );
        assert_eq!(current_run_label(&d), "No active run");
    }

    #[test]
    fn running_pill_shows_pid() {
        let mut d = dashboard_with_lists();
        start(&mut d, 123);
        assert_eq!(status_pill(&d).text, "Running · PID 123");
        assert!(status_pill(&d).active);
        assert_eq!(current_run_label(&d), "a.ipynb · PID 123");
        assert!(!can_start(&d));
        assert!(can_stop(&d));
        assert!(!notebook_picker(&d).enabled);
    }

    #[test]
    fn run_started_needs_a_timestamp() {
        let mut d = dashboard_with_lists();
        assert_eq!(run_started(&d), None);
        start(&mut d, 1);
        assert_eq!(run_started(&d), None);
        d.run.reconcile(RunState::Running(ActiveRun {
            pid: 1,
            notebook: Some("a.ipynb".into()),
            started_at: Some(1_700_000_000.5),
            log_file: None,
        }));
        assert_eq!(run_started(&d).map(|s| s.len()), Some(8));
    }

    #[test]
    fn pickers_show_placeholders() {
        let mut d = Dashboard::default();
        assert_eq!(notebook_picker(&d).label, "No notebooks found");
        assert_eq!(log_picker(&d).label, "No logs yet");
        d.notebooks.begin_load();
        assert_eq!(notebook_picker(&d).label, "Loading…");
        assert!(!notebook_picker(&d).enabled);
    }

    #[test]
    fn busy_locks_run_controls() {
        let mut d = dashboard_with_lists();
        assert!(can_start(&d));
        d.run.begin_start("a.ipynb").unwrap();
        assert!(!can_start(&d));
        assert!(!can_stop(&d));
        assert!(!notebook_picker(&d).enabled);
    }

    #[test]
    fn summarize_controls_follow_flag_and_provider() {
        let mut d = dashboard_with_lists();
        assert!(can_summarize(&d));
        assert_eq!(summarize_label(&d), "Summarize with Local");
        d.provider = Provider::Bedrock;
        assert_eq!(summarize_label(&d), "Summarize with AWS Bedrock");
        d.summarizing = true;
        assert!(!can_summarize(&d));
        assert!(!log_picker(&d).enabled);
        assert_eq!(summarize_label(&d), "Summarizing…");
    }

    #[test]
    fn summary_body_falls_back_to_placeholder() {
        let mut d = dashboard_with_lists();
        assert_eq!(summary_body(&d), SUMMARY_PLACEHOLDER);
        assert_eq!(summary_badge(&d), "run1.log");
        d.summary = Some(SummaryResult {
            text: "all good".into(),
            log: "run1.log".into(),
            provider: Provider::Local,
        });
        assert_eq!(summary_body(&d), "all good");
    }

    #[test]
    fn feed_entries_render_with_clock_and_speaker() {
        let m = Message::user("hi");
        let c = clock(&m);
        assert_eq!(c.len(), 8);
        assert_eq!(c.as_bytes()[2], b':');
        assert_eq!(speaker(m.role), "you");
        assert_eq!(speaker(Role::Assistant), "trackit");
    }
}
