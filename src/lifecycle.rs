//! Run lifecycle state machine.
//!
//! Owns the authoritative [`RunState`] and the transient `busy` flag that keeps
//! start and stop from overlapping. Network calls happen elsewhere; this module
//! only decides whether an action may begin and how its result lands.

use crate::model::{NotebookName, RunStarted, RunState};

/// Why a start or stop was not issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("no notebook selected")]
    EmptyNotebook,
    #[error("another start/stop is in flight")]
    Busy,
    #[error("a run is already active")]
    AlreadyRunning,
    #[error("no run is active")]
    NotRunning,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunLifecycle {
    state: RunState,
    busy: bool,
}

impl RunLifecycle {
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn check_start(&self, notebook: &str) -> Result<(), Rejected> {
        if notebook.trim().is_empty() {
            return Err(Rejected::EmptyNotebook);
        }
        if self.busy {
            return Err(Rejected::Busy);
        }
        if self.state.running() {
            return Err(Rejected::AlreadyRunning);
        }
        Ok(())
    }

    pub fn check_stop(&self) -> Result<(), Rejected> {
        if self.busy {
            return Err(Rejected::Busy);
        }
        if !self.state.running() {
            return Err(Rejected::NotRunning);
        }
        Ok(())
    }

    /// Claim the busy flag for a start of `notebook`.
    pub fn begin_start(&mut self, notebook: &str) -> Result<NotebookName, Rejected> {
        self.check_start(notebook)?;
        self.busy = true;
        Ok(notebook.to_string())
    }

    pub fn begin_stop(&mut self) -> Result<(), Rejected> {
        self.check_stop()?;
        self.busy = true;
        Ok(())
    }

    /// Land a start result. `busy` is released whatever the outcome.
    pub fn finish_start<E>(&mut self, result: Result<RunStarted, E>) -> Result<RunStarted, E> {
        self.busy = false;
        let started = result?;
        self.state = RunState::from(started.clone());
        Ok(started)
    }

    /// Land a stop result. On failure the run is left as-is: the remote
    /// process may still be alive.
    pub fn finish_stop<E>(&mut self, result: Result<(), E>) -> Result<(), E> {
        self.busy = false;
        result?;
        self.state = RunState::Idle;
        Ok(())
    }

    /// Poll results overwrite whatever is held locally.
    pub fn reconcile(&mut self, polled: RunState) {
        self.state = polled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(pid: u32, notebook: &str) -> RunStarted {
        RunStarted {
            pid,
            notebook: notebook.to_string(),
            output_file: None,
            proc_log: None,
        }
    }

    fn assert_invariant(lc: &RunLifecycle) {
        let s = lc.state();
        if s.running() {
            assert!(s.pid().is_some());
        } else {
            assert!(s.pid().is_none());
            assert!(s.notebook().is_none());
        }
    }

    #[test]
    fn start_rejected_for_empty_notebook() {
        let mut lc = RunLifecycle::default();
        assert_eq!(lc.begin_start(""), Err(Rejected::EmptyNotebook));
        assert_eq!(lc.begin_start("   "), Err(Rejected::EmptyNotebook));
        assert!(!lc.busy());
        assert_eq!(lc.state(), &RunState::Idle);
    }

    #[test]
    fn start_rejected_while_busy() {
        let mut lc = RunLifecycle::default();
        lc.begin_start("a.ipynb").unwrap();
        assert_eq!(lc.begin_start("a.ipynb"), Err(Rejected::Busy));
        assert_eq!(lc.begin_stop(), Err(Rejected::Busy));
    }

    #[test]
    fn successful_start_then_second_start_rejected() {
        let mut lc = RunLifecycle::default();
        lc.begin_start("a.ipynb").unwrap();
        lc.finish_start::<()>(Ok(started(123, "a.ipynb"))).unwrap();
        assert!(!lc.busy());
        assert_eq!(lc.state().pid(), Some(123));
        assert_eq!(lc.state().notebook(), Some("a.ipynb"));
        assert_eq!(lc.begin_start("b.ipynb"), Err(Rejected::AlreadyRunning));
        assert_invariant(&lc);
    }

    #[test]
    fn failed_start_stays_idle_and_releases_busy() {
        let mut lc = RunLifecycle::default();
        lc.begin_start("a.ipynb").unwrap();
        assert!(lc.finish_start(Err("boom")).is_err());
        assert!(!lc.busy());
        assert_eq!(lc.state(), &RunState::Idle);
    }

    #[test]
    fn stop_requires_running() {
        let mut lc = RunLifecycle::default();
        assert_eq!(lc.begin_stop(), Err(Rejected::NotRunning));
    }

    #[test]
    fn failed_stop_keeps_run() {
        let mut lc = RunLifecycle::default();
        lc.begin_start("a.ipynb").unwrap();
        lc.finish_start::<()>(Ok(started(9, "a.ipynb"))).unwrap();
        lc.begin_stop().unwrap();
        assert!(lc.finish_stop(Err("nope")).is_err());
        assert!(!lc.busy());
        assert_eq!(lc.state().pid(), Some(9));
    }

    #[test]
    fn start_stop_sequences_hold_invariant() {
        let mut lc = RunLifecycle::default();
        for round in 0..4u32 {
            let _ = lc.begin_start("nb.ipynb");
            let _ = lc.finish_start::<()>(Ok(started(100 + round, "nb.ipynb")));
            assert_invariant(&lc);
            let _ = lc.begin_start("nb.ipynb");
            assert_invariant(&lc);
            lc.begin_stop().unwrap();
            lc.finish_stop::<()>(Ok(())).unwrap();
            assert_invariant(&lc);
            assert_eq!(lc.state(), &RunState::Idle);
        }
    }

    #[test]
    fn poll_overrides_local_state() {
        let mut lc = RunLifecycle::default();
        lc.begin_start("a.ipynb").unwrap();
        lc.finish_start::<()>(Ok(started(5, "a.ipynb"))).unwrap();
        lc.reconcile(RunState::Idle);
        assert_eq!(lc.state(), &RunState::Idle);
        assert_invariant(&lc);
    }
}
