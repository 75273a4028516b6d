use crate::application::ports::{ConnectivityProbe, RemoteApi};
use crate::application::services::sync_service::SyncError;
use crate::domain::entities::AutoReleaseReport;
use crate::infrastructure::messaging::{ForegroundChannel, ForegroundEvent};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sweeps claimed sites whose confirmation deadline has lapsed and hands
/// them back to the dispatch pool. Runs under the same single-flight
/// discipline as a drain pass.
pub struct AutoReleaseService {
    remote: Arc<dyn RemoteApi>,
    connectivity: Arc<dyn ConnectivityProbe>,
    events: Arc<ForegroundChannel>,
    running: AtomicBool,
}

impl AutoReleaseService {
    pub fn new(
        remote: Arc<dyn RemoteApi>,
        connectivity: Arc<dyn ConnectivityProbe>,
        events: Arc<ForegroundChannel>,
    ) -> Self {
        Self {
            remote,
            connectivity,
            events,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn sweep(&self) -> Result<AutoReleaseReport, SyncError> {
        if !self.connectivity.is_online().await {
            return Err(SyncError::Offline);
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadyRunning);
        }

        let report = self.run_sweep().await;
        self.running.store(false, Ordering::SeqCst);
        Ok(report)
    }

    async fn run_sweep(&self) -> AutoReleaseReport {
        let mut report = AutoReleaseReport::default();

        let candidates = match self.remote.release_candidates(Utc::now()).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(target: "fieldsync::auto_release", "failed to list candidates: {err}");
                report.errors = 1;
                return report;
            }
        };

        for site in candidates {
            report.processed += 1;
            match self.remote.release_claim(&site.site_id).await {
                Ok(()) => {
                    report.released += 1;
                    tracing::info!(
                        target: "fieldsync::auto_release",
                        site_id = %site.site_id,
                        former_assignee = %site.assigned_to,
                        "claim auto-released"
                    );
                    self.events.emit(ForegroundEvent::ClaimAutoReleased {
                        site_id: site.site_id,
                        former_assignee: site.assigned_to,
                    });
                }
                Err(err) => {
                    report.errors += 1;
                    tracing::warn!(
                        target: "fieldsync::auto_release",
                        site_id = %site.site_id,
                        "release failed: {err}"
                    );
                }
            }
        }

        report
    }
}
