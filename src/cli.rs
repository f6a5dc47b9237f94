use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use trackit_console::model::{ControllerConfig, Message, Provider};
use trackit_console::{telemetry, view, ControllerHandle, GatewayClient};

/// One line of text-mode output. Feed entries go to stdout so they can be
/// piped; status changes go to stderr.
#[derive(Debug, Clone, PartialEq)]
enum TextLine {
    Feed(Message),
    Status(String),
}

impl TextLine {
    fn render(&self) -> String {
        match self {
            TextLine::Feed(m) => {
                format!("[{}] {}: {}", view::clock(m), view::speaker(m.role), m.content)
            }
            TextLine::Status(pill) => format!("status: {pill}"),
        }
    }
}

/// Blocking writer thread for text mode; exits once every sender is dropped.
fn spawn_line_writer() -> (mpsc::UnboundedSender<TextLine>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<TextLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let mut feed = std::io::LineWriter::new(std::io::stdout().lock());
        let mut status = std::io::LineWriter::new(std::io::stderr().lock());
        while let Some(line) = rx.blocking_recv() {
            let sink: &mut dyn Write = match &line {
                TextLine::Feed(_) => &mut feed,
                TextLine::Status(_) => &mut status,
            };
            let _ = writeln!(sink, "{}", line.render());
        }
        let _ = feed.flush();
        let _ = status.flush();
    });
    (tx, handle)
}

/// Status poll period; `off` disables polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollInterval(pub Option<Duration>);

fn parse_poll_interval(s: &str) -> Result<PollInterval, String> {
    match s.trim() {
        "off" | "none" | "0" => Ok(PollInterval(None)),
        other => humantime::parse_duration(other)
            .map(|d| PollInterval(Some(d)))
            .map_err(|e| e.to_string()),
    }
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "trackit-console",
    version,
    about = "Run Trackit notebooks, watch their status and summarize their logs"
)]
pub struct Cli {
    /// Base URL of the Trackit Gateway
    #[arg(long, env = "TRACKIT_BACKEND_URL", default_value = ControllerConfig::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Chat proxy endpoint (defaults to <base-url>/api/chat)
    #[arg(long, env = "TRACKIT_CHAT_URL")]
    pub chat_url: Option<String>,

    /// Inference provider used for summaries and chat
    #[arg(long, value_enum, default_value_t = Provider::Local)]
    pub provider: Provider,

    /// How often to reconcile run status with the Gateway ("off" to disable)
    #[arg(long, default_value = "2500ms", value_parser = parse_poll_interval)]
    pub poll_interval: PollInterval,

    /// Per-request timeout; unset leaves requests bounded only by the transport
    #[arg(long)]
    pub request_timeout: Option<humantime::Duration>,

    /// Print activity as plain lines instead of the TUI
    #[arg(long)]
    pub text: bool,

    /// Log file used while the TUI owns the terminal
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
}

/// Build a `ControllerConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ControllerConfig {
    let mut cfg = ControllerConfig::for_base_url(args.base_url.clone());
    if let Some(chat_url) = args.chat_url.as_ref() {
        cfg.chat_url = chat_url.clone();
    }
    cfg.provider = args.provider;
    cfg.poll_interval = args.poll_interval.0;
    cfg.request_timeout = args.request_timeout.map(Duration::from);
    cfg
}

pub async fn run(args: Cli) -> Result<()> {
    if !args.text {
        #[cfg(feature = "tui")]
        {
            let log_path = args
                .log_file
                .clone()
                .unwrap_or_else(telemetry::default_log_path);
            telemetry::init_file(&log_path)?;
            return crate::tui::run(args).await;
        }
    }

    telemetry::init_stderr()?;
    run_text(args).await
}

/// Stream activity and status changes as lines until Ctrl-C.
async fn run_text(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    tracing::info!(
        config = %serde_json::to_string(&cfg).context("serialize config")?,
        "starting text mode"
    );
    let gateway = GatewayClient::new(&cfg).context("build gateway client")?;
    let controller = ControllerHandle::spawn(gateway, &cfg);
    let mut state_rx = controller.subscribe();
    let (out_tx, out_handle) = spawn_line_writer();

    let mut seen = 0usize;
    let mut last_pill: Option<String> = None;
    loop {
        {
            let d = state_rx.borrow_and_update();
            for m in d.feed().since(seen) {
                let _ = out_tx.send(TextLine::Feed(m.clone()));
            }
            seen = d.feed().len();

            let pill = view::status_pill(&d).text;
            if last_pill.as_deref() != Some(pill.as_str()) {
                last_pill = Some(pill.clone());
                let _ = out_tx.send(TextLine::Status(pill));
            }
        }

        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.dispose().await?;
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
