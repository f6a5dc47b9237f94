use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset};

use crate::gateway::GatewayError;

pub type NotebookName = String;
pub type LogFilename = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub base_url: String,
    pub chat_url: String,
    pub provider: Provider,
    /// `None` disables status polling entirely.
    #[serde(default, with = "humantime_serde")]
    pub poll_interval: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl ControllerConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:8090";
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

    /// Config pointing at `base_url` with the chat proxy on the same origin.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let chat_url = format!("{}/api/chat", base_url.trim_end_matches('/'));
        Self {
            base_url,
            chat_url,
            provider: Provider::default(),
            poll_interval: Some(Self::DEFAULT_POLL_INTERVAL),
            request_timeout: None,
            user_agent: format!("trackit-console/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::for_base_url(Self::DEFAULT_BASE_URL)
    }
}

/// Inference backend the Gateway should use for summaries and chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Local,
    Bedrock,
}

impl Provider {
    pub fn label(self) -> &'static str {
        match self {
            Provider::Local => "Local",
            Provider::Bedrock => "AWS Bedrock",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Provider::Local => Provider::Bedrock,
            Provider::Bedrock => Provider::Local,
        }
    }
}

/// Details of the run the Gateway reports as active.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRun {
    pub pid: u32,
    pub notebook: Option<NotebookName>,
    pub started_at: Option<f64>,
    pub log_file: Option<String>,
}

/// Whether a run is active. `Idle` carries nothing, so an idle state can never
/// hold a stale pid or notebook.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RunState {
    #[default]
    Idle,
    Running(ActiveRun),
}

impl RunState {
    pub fn running(&self) -> bool {
        matches!(self, RunState::Running(_))
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            RunState::Running(run) => Some(run.pid),
            RunState::Idle => None,
        }
    }

    pub fn notebook(&self) -> Option<&str> {
        match self {
            RunState::Running(run) => run.notebook.as_deref(),
            RunState::Idle => None,
        }
    }

    pub fn active(&self) -> Option<&ActiveRun> {
        match self {
            RunState::Running(run) => Some(run),
            RunState::Idle => None,
        }
    }
}

/// Body of `GET /trackit/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub running: bool,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub notebook: Option<NotebookName>,
    #[serde(default)]
    pub started_at: Option<f64>,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl TryFrom<StatusReport> for RunState {
    type Error = GatewayError;

    fn try_from(report: StatusReport) -> Result<Self, Self::Error> {
        if !report.running {
            return Ok(RunState::Idle);
        }
        let pid = report.pid.ok_or_else(|| {
            GatewayError::Malformed("status reports running without a pid".into())
        })?;
        Ok(RunState::Running(ActiveRun {
            pid,
            notebook: report.notebook,
            started_at: report.started_at,
            log_file: report.log_file,
        }))
    }
}

/// Body of a successful `POST /trackit/run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStarted {
    pub pid: u32,
    pub notebook: NotebookName,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub proc_log: Option<String>,
}

impl From<RunStarted> for RunState {
    fn from(started: RunStarted) -> Self {
        RunState::Running(ActiveRun {
            pid: started.pid,
            notebook: Some(started.notebook),
            started_at: None,
            log_file: started.output_file,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One Activity Feed entry. Only `role` and `content` go over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip, default = "now_local")]
    pub at: OffsetDateTime,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            at: now_local(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            at: now_local(),
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.content == other.content
    }
}

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Record the local UTC offset. The offset can only be read reliably while
/// the process is single-threaded, so call this before starting a runtime.
pub fn capture_local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

/// The captured local offset, or UTC when none was captured.
pub fn local_offset() -> UtcOffset {
    LOCAL_OFFSET.get().copied().unwrap_or(UtcOffset::UTC)
}

fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

/// The current summary slot; cleared by the operator or by a new request.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryResult {
    pub text: String,
    pub log: LogFilename,
    pub provider: Provider,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stamped_with_the_captured_offset() {
        let offset = capture_local_offset();
        assert_eq!(local_offset(), offset);
        assert_eq!(Message::user("hi").at.offset(), offset);
    }

    #[test]
    fn idle_status_drops_echoed_pid_and_notebook() {
        let report = StatusReport {
            running: false,
            pid: Some(7),
            notebook: Some("a.ipynb".into()),
            started_at: None,
            log_file: None,
        };
        let state = RunState::try_from(report).unwrap();
        assert_eq!(state, RunState::Idle);
        assert_eq!(state.pid(), None);
        assert_eq!(state.notebook(), None);
    }

    #[test]
    fn running_status_without_pid_is_malformed() {
        let report: StatusReport =
            serde_json::from_str(r#"{"running":true,"pid":null,"notebook":"a.ipynb"}"#).unwrap();
        assert!(matches!(
            RunState::try_from(report),
            Err(GatewayError::Malformed(_))
        ));
    }

    #[test]
    fn status_with_extras_decodes() {
        let report: StatusReport = serde_json::from_str(
            r#"{"running":true,"pid":42,"notebook":"b.ipynb","started_at":1700000000.5,"log_file":"/logs/b_io.log"}"#,
        )
        .unwrap();
        let state = RunState::try_from(report).unwrap();
        assert_eq!(state.pid(), Some(42));
        assert_eq!(state.notebook(), Some("b.ipynb"));
        assert_eq!(
            state.active().and_then(|r| r.log_file.as_deref()),
            Some("/logs/b_io.log")
        );
    }

    #[test]
    fn chat_wire_format_omits_timestamp() {
        let v = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(v, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn provider_serializes_lowercase_and_labels() {
        assert_eq!(serde_json::to_value(Provider::Bedrock).unwrap(), "bedrock");
        assert_eq!(Provider::Local.label(), "Local");
        assert_eq!(Provider::Bedrock.label(), "AWS Bedrock");
        assert_eq!(Provider::Local.toggled(), Provider::Bedrock);
    }

    #[test]
    fn default_config_targets_loopback() {
        let cfg = ControllerConfig::default();
        assert_eq!(cfg.base_url, "http://127.0.0.1:8090");
        assert_eq!(cfg.chat_url, "http://127.0.0.1:8090/api/chat");
        assert_eq!(cfg.poll_interval, Some(Duration::from_millis(2500)));
    }
}
