//! Engine handle: owns the shared checklist state and the single run task.
//!
//! The checklist lives in a `tokio::sync::watch` channel. The run task is the
//! only writer (through `send_modify`, so every update is one atomic item
//! replace) and any number of HTTP handlers snapshot it without blocking.
//! A run guard allows at most one live run, and a fresh cancel token is
//! minted per run; a stale cancel can never bleed into the next one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use rollcall_core::model::{Checklist, SectionDef, SectionStatus};
use rollcall_core::types::{RunPolicy, RunReport};

use crate::error::{Error, Result};
use crate::runner::run_checklist;
use crate::voice::{Listener, Speaker};

/// Cloneable handle to the checklist engine.
#[derive(Clone)]
pub struct ChecklistEngine {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<Checklist>,
    speaker: Arc<dyn Speaker>,
    listener: Arc<dyn Listener>,
    policy: RunPolicy,
    running: Arc<AtomicBool>,
    cancel: Mutex<Arc<AtomicBool>>,
    task: Mutex<Option<JoinHandle<RunReport>>>,
}

impl ChecklistEngine {
    pub fn new(
        definition: &[SectionDef],
        speaker: Arc<dyn Speaker>,
        listener: Arc<dyn Listener>,
        policy: RunPolicy,
    ) -> Self {
        let (state, _) = watch::channel(Checklist::new(definition));
        Self {
            inner: Arc::new(Inner {
                state,
                speaker,
                listener,
                policy,
                running: Arc::new(AtomicBool::new(false)),
                cancel: Mutex::new(Arc::new(AtomicBool::new(true))),
                task: Mutex::new(None),
            }),
        }
    }

    /// Snapshot the checklist in wire shape.
    pub fn status(&self) -> Vec<SectionStatus> {
        self.inner.state.borrow().status()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Spawn a checklist run. Fails with [`Error::RunInProgress`] while one
    /// is live.
    pub fn start(&self) -> Result<()> {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::RunInProgress);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        *lock(&self.inner.cancel) = cancel.clone();

        // Released on drop, so a panicking run cannot wedge the engine.
        let guard = RunGuard(self.inner.running.clone());
        let speaker = self.inner.speaker.clone();
        let listener = self.inner.listener.clone();
        let state = self.inner.state.clone();
        let policy = self.inner.policy.clone();

        info!("checklist run starting");
        let handle = tokio::spawn(async move {
            let _guard = guard;
            let report = run_checklist(speaker, listener, state, cancel, policy).await;
            info!(
                outcome = ?report.outcome,
                answered = report.answered,
                skipped = report.skipped.len(),
                "run finished"
            );
            report
        });
        *lock(&self.inner.task) = Some(handle);

        Ok(())
    }

    /// Ask the live run to stop at its next question boundary. With no run
    /// live this is an acknowledged no-op.
    pub fn cancel(&self) {
        lock(&self.inner.cancel).store(true, Ordering::Relaxed);
        info!("cancel requested");
    }

    /// Wait for the most recent run to finish and take its report. `None`
    /// when no run was started or its report was already taken.
    pub async fn wait(&self) -> Option<RunReport> {
        let handle = lock(&self.inner.task).take()?;
        match handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "run task failed");
                None
            }
        }
    }
}

struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
