//! Serialized background saves
//!
//! A single worker thread owns the gateway. Each submission is stamped with a
//! monotonic version; when several are pending the worker writes only the
//! newest, so a stale layout can never land after a newer one.
//!
//! Reports wait in a bounded backlog. A host that never drains it only loses
//! reports, never saves.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{LayoutWriter, PersistenceGateway};
use crate::constants::storage;
use crate::error::StoreError;
use crate::types::SavedLayout;

enum Job {
    Save { version: u64, layout: SavedLayout },
    Shutdown,
}

/// Outcome of one executed save
#[derive(Debug)]
pub struct SaveReport {
    pub version: u64,
    /// Submissions folded into this write because a newer one superseded them
    pub superseded: u64,
    pub result: Result<(), StoreError>,
}

pub struct SaveQueue {
    jobs: Sender<Job>,
    reports: Receiver<SaveReport>,
    next_version: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

impl SaveQueue {
    /// Spawn the save worker
    pub fn spawn(gateway: Arc<PersistenceGateway>) -> Self {
        Self::with_report_backlog(gateway, storage::REPORT_BACKLOG)
    }

    /// Spawn the save worker, keeping at most `backlog` undrained reports
    pub fn with_report_backlog(gateway: Arc<PersistenceGateway>, backlog: usize) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel();
        let (reports_tx, reports_rx) = mpsc::sync_channel(backlog.max(1));

        let worker = thread::Builder::new()
            .name("dashgrid-save".to_string())
            .spawn(move || run_worker(&gateway, &jobs_rx, &reports_tx))
            .inspect_err(|e| error!(error = ?e, "Failed to spawn save worker"))
            .ok();

        Self {
            jobs: jobs_tx,
            reports: reports_rx,
            next_version: AtomicU64::new(1),
            worker,
        }
    }

    /// Queue a save, returning the version stamped on it
    pub fn enqueue(&self, layout: SavedLayout) -> Result<u64, StoreError> {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        self.jobs
            .send(Job::Save { version, layout })
            .map_err(|_| StoreError::WorkerGone)?;
        debug!(version, "Queued layout save");
        Ok(version)
    }

    /// Reports for saves finished since the last call, without blocking
    pub fn try_reports(&self) -> Vec<SaveReport> {
        self.reports.try_iter().collect()
    }

    /// Block up to `timeout` for the next report
    pub fn wait_report(&self, timeout: Duration) -> Option<SaveReport> {
        match self.reports.recv_timeout(timeout) {
            Ok(report) => Some(report),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Finish pending saves and stop the worker
    pub fn shutdown(mut self) -> Vec<SaveReport> {
        self.stop();
        self.try_reports()
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = self.jobs.send(Job::Shutdown);
        if worker.join().is_err() {
            error!("Save worker panicked");
        }
    }
}

impl LayoutWriter for SaveQueue {
    fn submit(&self, layout: &SavedLayout) {
        if let Err(e) = self.enqueue(layout.clone()) {
            warn!(error = %e, "Dropping layout save");
        }
    }
}

impl Drop for SaveQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(gateway: &PersistenceGateway, jobs: &Receiver<Job>, reports: &SyncSender<SaveReport>) {
    info!("Save worker started");

    while let Ok(job) = jobs.recv() {
        let (mut version, mut layout) = match job {
            Job::Save { version, layout } => (version, layout),
            Job::Shutdown => break,
        };

        // Coalesce whatever queued up while the previous save was in flight
        let mut superseded = 0;
        let mut shutdown = false;
        for pending in jobs.try_iter() {
            match pending {
                Job::Save {
                    version: newer,
                    layout: newer_layout,
                } => {
                    debug!(stale = version, newer, "Superseding queued layout save");
                    version = newer;
                    layout = newer_layout;
                    superseded += 1;
                }
                Job::Shutdown => {
                    shutdown = true;
                    break;
                }
            }
        }

        let result = gateway.save(&layout);
        match reports.try_send(SaveReport {
            version,
            superseded,
            result,
        }) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(report)) => {
                debug!(version = report.version, "Report backlog full, dropping save report");
            }
        }

        if shutdown {
            break;
        }
    }

    info!("Save worker stopped");
}
