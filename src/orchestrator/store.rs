//! The controller-owned state store.
//!
//! Only the controller task mutates a `Dashboard`; everyone else sees cloned
//! snapshots through a watch channel.

use crate::feed::ActivityFeed;
use crate::lifecycle::RunLifecycle;
use crate::model::{LogFilename, NotebookName, Provider, RunState, SummaryResult};
use crate::registry::RegistryState;

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub(crate) provider: Provider,
    pub(crate) run: RunLifecycle,
    pub(crate) notebooks: RegistryState<NotebookName>,
    pub(crate) logs: RegistryState<LogFilename>,
    pub(crate) summary: Option<SummaryResult>,
    pub(crate) summarizing: bool,
    pub(crate) sending: bool,
    pub(crate) feed: ActivityFeed,
}

impl Dashboard {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            run: RunLifecycle::default(),
            notebooks: RegistryState::default(),
            logs: RegistryState::default(),
            summary: None,
            summarizing: false,
            sending: false,
            feed: ActivityFeed::with_greeting(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn run_state(&self) -> &RunState {
        self.run.state()
    }

    /// A start or stop is in flight.
    pub fn busy(&self) -> bool {
        self.run.busy()
    }

    pub fn notebooks(&self) -> &RegistryState<NotebookName> {
        &self.notebooks
    }

    pub fn logs(&self) -> &RegistryState<LogFilename> {
        &self.logs
    }

    pub fn summary(&self) -> Option<&SummaryResult> {
        self.summary.as_ref()
    }

    pub fn summary_text(&self) -> &str {
        self.summary.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }

    pub fn summarizing(&self) -> bool {
        self.summarizing
    }

    pub fn sending(&self) -> bool {
        self.sending
    }

    pub fn feed(&self) -> &ActivityFeed {
        &self.feed
    }

    pub fn selected_notebook(&self) -> Option<&str> {
        self.notebooks.selected().map(String::as_str)
    }

    pub fn selected_log(&self) -> Option<&str> {
        self.logs.selected().map(String::as_str)
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(Provider::default())
    }
}
