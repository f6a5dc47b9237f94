//! Run & summarize controller.
//!
//! One task owns the [`Dashboard`]. Commands arrive over a channel, every
//! Gateway call runs as its own task, and results come back into the loop to
//! be applied. Observers get a fresh snapshot after every change.

use super::policy::FailurePolicy;
use super::store::Dashboard;
use crate::gateway::{GatewayClient, GatewayError};
use crate::model::{
    ControllerConfig, LogFilename, Message, NotebookName, Provider, RunStarted, RunState,
    StatusReport, SummaryResult,
};
use anyhow::Result;
use std::future::Future;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Duration, Instant, MissedTickBehavior};

/// Actions a presentation layer can request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadNotebooks,
    LoadLogs,
    RefreshStatus,
    SelectNotebook(Option<NotebookName>),
    SelectLog(Option<LogFilename>),
    SetProvider(Provider),
    Start(NotebookName),
    Stop,
    Summarize { log: LogFilename, provider: Provider },
    ClearSummary,
    SendChat(String),
    Quit,
}

pub type CommandSender = UnboundedSender<Command>;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A Gateway call that has finished, tagged with its result.
#[derive(Debug)]
enum Settled {
    Notebooks(Result<Vec<NotebookName>, GatewayError>),
    Logs(Result<Vec<LogFilename>, GatewayError>),
    Status(Result<StatusReport, GatewayError>),
    Started(Result<RunStarted, GatewayError>),
    Stopped(Result<(), GatewayError>),
    Summary {
        log: LogFilename,
        provider: Provider,
        result: Result<String, GatewayError>,
    },
    Chat(Result<String, GatewayError>),
}

#[derive(Debug)]
struct Completion {
    policy: FailurePolicy,
    settled: Settled,
}

struct Controller {
    gateway: GatewayClient,
    store: Dashboard,
    inflight: JoinSet<Completion>,
    state_tx: watch::Sender<Dashboard>,
}

impl Controller {
    fn dispatch<F>(&mut self, policy: FailurePolicy, call: F)
    where
        F: Future<Output = Settled> + Send + 'static,
    {
        self.inflight.spawn(async move {
            Completion {
                policy,
                settled: call.await,
            }
        });
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.store.clone());
    }

    fn load_notebooks(&mut self) {
        self.store.notebooks.begin_load();
        let gw = self.gateway.clone();
        self.dispatch(FailurePolicy::Background("notebooks"), async move {
            Settled::Notebooks(gw.list_notebooks().await)
        });
    }

    fn load_logs(&mut self) {
        self.store.logs.begin_load();
        let gw = self.gateway.clone();
        self.dispatch(FailurePolicy::Background("logs"), async move {
            Settled::Logs(gw.list_logs().await)
        });
    }

    fn refresh_status(&mut self) {
        let gw = self.gateway.clone();
        self.dispatch(FailurePolicy::Background("status"), async move {
            Settled::Status(gw.status().await)
        });
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::LoadNotebooks => self.load_notebooks(),
            Command::LoadLogs => self.load_logs(),
            Command::RefreshStatus => self.refresh_status(),
            Command::SelectNotebook(nb) => {
                self.store.notebooks.select(nb.filter(|s| !s.is_empty()));
            }
            Command::SelectLog(log) => {
                self.store.logs.select(log.filter(|s| !s.is_empty()));
            }
            Command::SetProvider(provider) => self.store.provider = provider,
            Command::Start(notebook) => match self.store.run.begin_start(&notebook) {
                Ok(notebook) => {
                    tracing::info!(%notebook, "starting run");
                    let gw = self.gateway.clone();
                    self.dispatch(FailurePolicy::Action("Run"), async move {
                        Settled::Started(gw.run(&notebook).await)
                    });
                }
                Err(reason) => tracing::debug!(%notebook, %reason, "start rejected"),
            },
            Command::Stop => match self.store.run.begin_stop() {
                Ok(()) => {
                    tracing::info!(pid = ?self.store.run.state().pid(), "stopping run");
                    let gw = self.gateway.clone();
                    self.dispatch(FailurePolicy::Action("Stop"), async move {
                        Settled::Stopped(gw.stop().await)
                    });
                }
                Err(reason) => tracing::debug!(%reason, "stop rejected"),
            },
            Command::Summarize { log, provider } => self.summarize(log, provider),
            Command::ClearSummary => self.store.summary = None,
            Command::SendChat(utterance) => self.send_chat(utterance),
            // Handled by the loop before dispatch.
            Command::Quit => {}
        }
    }

    fn summarize(&mut self, log: LogFilename, provider: Provider) {
        if log.trim().is_empty() {
            tracing::debug!("summarize rejected: no log selected");
            return;
        }
        if self.store.summarizing {
            tracing::debug!(%log, "summarize rejected: already in flight");
            return;
        }
        self.store.summarizing = true;
        self.store.summary = None;
        tracing::info!(%log, ?provider, "requesting summary");
        let gw = self.gateway.clone();
        self.dispatch(FailurePolicy::Action("Summary"), async move {
            let result = gw.summarize(&log, provider).await;
            Settled::Summary {
                log,
                provider,
                result,
            }
        });
    }

    fn send_chat(&mut self, utterance: String) {
        let content = utterance.trim();
        if content.is_empty() {
            return;
        }
        if self.store.sending {
            tracing::debug!("chat rejected: a reply is still pending");
            return;
        }
        self.store.feed.append(Message::user(content));
        self.store.sending = true;
        let messages = self.store.feed.entries().to_vec();
        let provider = self.store.provider;
        let gw = self.gateway.clone();
        self.dispatch(FailurePolicy::Degraded, async move {
            Settled::Chat(gw.chat(provider, &messages).await)
        });
    }

    fn settle(&mut self, done: Completion) {
        let Completion { policy, settled } = done;
        let store = &mut self.store;
        match settled {
            Settled::Notebooks(result) => {
                store.notebooks.settle();
                match result {
                    Ok(items) => store.notebooks.replace(items),
                    Err(e) => policy.report(&e, &mut store.feed),
                }
            }
            Settled::Logs(result) => {
                store.logs.settle();
                match result {
                    Ok(items) => store.logs.replace(items),
                    Err(e) => policy.report(&e, &mut store.feed),
                }
            }
            Settled::Status(result) => match result.and_then(RunState::try_from) {
                Ok(polled) => store.run.reconcile(polled),
                Err(e) => policy.report(&e, &mut store.feed),
            },
            Settled::Started(result) => match store.run.finish_start(result) {
                Ok(started) => {
                    tracing::info!(pid = started.pid, notebook = %started.notebook, "run started");
                    store.feed.append(Message::assistant(format!(
                        "▶ Running {} (PID {})",
                        started.notebook, started.pid
                    )));
                    // A fresh run may write new logs.
                    self.load_logs();
                }
                Err(e) => policy.report(&e, &mut store.feed),
            },
            Settled::Stopped(result) => match store.run.finish_stop(result) {
                Ok(()) => {
                    tracing::info!("run stopped");
                    store.feed.append(Message::assistant("■ Stopped"));
                }
                Err(e) => policy.report(&e, &mut store.feed),
            },
            Settled::Summary {
                log,
                provider,
                result,
            } => {
                store.summarizing = false;
                match result {
                    Ok(text) => {
                        store.feed.append(Message::assistant(format!(
                            "✅ Summary generated from {log} ({})",
                            provider.label()
                        )));
                        store.summary = Some(SummaryResult {
                            text,
                            log,
                            provider,
                        });
                    }
                    Err(e) => policy.report(&e, &mut store.feed),
                }
            }
            Settled::Chat(result) => {
                store.sending = false;
                match result {
                    Ok(reply) => store.feed.append(Message::assistant(reply)),
                    Err(e) => policy.report(&e, &mut store.feed),
                }
            }
        }
    }

    async fn run(mut self, mut cmd_rx: UnboundedReceiver<Command>, poll_interval: Option<Duration>) {
        let mut poll = poll_interval.map(|period| {
            let period = period.max(MIN_POLL_INTERVAL);
            let mut iv = tokio::time::interval_at(Instant::now() + period, period);
            iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
            iv
        });

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(Command::Quit) | None => break,
                        Some(cmd) => self.handle(cmd),
                    }
                }
                Some(joined) = self.inflight.join_next() => {
                    match joined {
                        Ok(done) => self.settle(done),
                        Err(e) => tracing::error!(error = %e, "gateway task failed"),
                    }
                }
                _ = async {
                    match poll.as_mut() {
                        Some(iv) => {
                            iv.tick().await;
                        }
                        None => futures::future::pending::<()>().await,
                    }
                } => {
                    self.refresh_status();
                }
            }
            self.publish();
        }

        // Anything still in flight belongs to a disposed controller: drop it unapplied.
        let pending = self.inflight.len();
        self.inflight.abort_all();
        tracing::debug!(pending, "controller disposed");
    }
}

/// Handle to a running controller task.
pub struct ControllerHandle {
    commands: CommandSender,
    state: watch::Receiver<Dashboard>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    /// Start the controller: registries begin loading and the status poll is armed.
    pub fn spawn(gateway: GatewayClient, cfg: &ControllerConfig) -> Self {
        let store = Dashboard::new(cfg.provider);
        let (state_tx, state) = watch::channel(store.clone());
        let (commands, cmd_rx) = mpsc::unbounded_channel::<Command>();
        let mut controller = Controller {
            gateway,
            store,
            inflight: JoinSet::new(),
            state_tx,
        };
        // Subscribers never observe the pre-load snapshot.
        controller.load_notebooks();
        controller.load_logs();
        controller.publish();
        let task = tokio::spawn(controller.run(cmd_rx, cfg.poll_interval));
        Self {
            commands,
            state,
            task,
        }
    }

    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Queue a command. After disposal this is a no-op.
    pub fn send(&self, cmd: Command) {
        let _ = self.commands.send(cmd);
    }

    pub fn subscribe(&self) -> watch::Receiver<Dashboard> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> Dashboard {
        self.state.borrow().clone()
    }

    /// Wait for the loop to end on its own (a `Quit` sent through a command sender).
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| anyhow::anyhow!("controller task failed: {e}"))
    }

    /// Stop polling, discard in-flight work and wait for the loop to exit.
    pub async fn dispose(self) -> Result<()> {
        let _ = self.commands.send(Command::Quit);
        self.join().await
    }
}
