use crate::application::ports::remote_api::CostSubmission;
use crate::application::ports::{ConnectivityProbe, OfflineStore, RemoteApi};
use crate::domain::entities::{
    CostSubmissionPayload, LocationUpdatePayload, PendingMutation, PhotoUploadPayload,
    SiteVisitRecord, SyncPhase, SyncProgress, SyncReport, VisitCompletePayload, VisitStartPayload,
};
use crate::domain::entities::site_visit::VisitStatus;
use crate::domain::value_objects::mutation::MutationKind;
use crate::domain::value_objects::GeoPoint;
use crate::infrastructure::messaging::{ForegroundChannel, ForegroundEvent};
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Routine reasons a drain pass does not run. These are values, not
/// exceptions: callers branch on them.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no network connectivity")]
    Offline,
    #[error("sync already in progress")]
    AlreadyRunning,
    #[error("offline store failure: {0}")]
    Store(#[from] AppError),
}

/// The exclusive authority draining the offline store into the remote
/// system. Constructed once at process start and handed around as an
/// `Arc`; the atomic flag guarantees at most one concurrent drain pass.
pub struct SyncOrchestrator {
    store: Arc<dyn OfflineStore>,
    remote: Arc<dyn RemoteApi>,
    connectivity: Arc<dyn ConnectivityProbe>,
    events: Arc<ForegroundChannel>,
    user_id: String,
    config: SyncConfig,
    running: AtomicBool,
    progress: RwLock<SyncProgress>,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn OfflineStore>,
        remote: Arc<dyn RemoteApi>,
        connectivity: Arc<dyn ConnectivityProbe>,
        events: Arc<ForegroundChannel>,
        user_id: String,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            events,
            user_id,
            config,
            running: AtomicBool::new(false),
            progress: RwLock::new(SyncProgress::default()),
        }
    }

    pub async fn progress(&self) -> SyncProgress {
        self.progress.read().await.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One complete drain pass: site visits, then locations, then the
    /// mutation queue. Rejected outright when offline or when a pass is
    /// already running; never queued.
    pub async fn drain(&self) -> Result<SyncReport, SyncError> {
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

        let outcome = self.run_pass().await;
        self.running.store(false, Ordering::SeqCst);

        {
            let mut progress = self.progress.write().await;
            progress.running = false;
            progress.current = None;
            match &outcome {
                Ok(_) => {
                    progress.phase = SyncPhase::Complete;
                    progress.last_sync_at = Some(Utc::now());
                }
                Err(_) => progress.phase = SyncPhase::Idle,
            }
        }

        if let Ok(report) = &outcome {
            tracing::info!(
                target: "fieldsync::sync",
                synced = report.synced,
                failed = report.failed,
                duration_ms = report.duration_ms,
                "drain pass complete"
            );
            self.events.emit(ForegroundEvent::SyncCompleted {
                synced: report.synced,
                failed: report.failed,
                errors: report.errors.clone(),
            });
        }

        outcome
    }

    async fn run_pass(&self) -> Result<SyncReport, SyncError> {
        let started = std::time::Instant::now();

        let visits = self.store.unsynced_site_visits().await?;
        let samples = self.store.unsynced_locations(&self.user_id).await?;
        let due = self.store.due_mutations().await?;
        let runnable = due
            .iter()
            .filter(|m| !m.at_retry_ceiling(self.config.max_retries))
            .count();

        let total = (visits.len() + samples.len() + runnable) as u32;
        {
            let mut progress = self.progress.write().await;
            let last_sync_at = progress.last_sync_at;
            *progress = SyncProgress {
                total,
                completed: 0,
                failed: 0,
                current: Some("Preparing sync".to_string()),
                running: true,
                phase: SyncPhase::Preparing,
                last_sync_at,
            };
        }

        let mut synced = 0u32;
        let mut failed = 0u32;
        let mut errors: Vec<String> = Vec::new();

        if total > 0 {
            self.set_phase(SyncPhase::SiteVisits).await;
            for visit in &visits {
                self.set_current(format!("Syncing visit {}", visit.site_name))
                    .await;
                match self.push_visit(visit).await {
                    Ok(()) => match self.store.mark_site_visit_synced(&visit.id, Utc::now()).await {
                        Ok(()) => {
                            synced += 1;
                            self.bump_completed().await;
                        }
                        Err(err) => {
                            failed += 1;
                            self.bump_failed().await;
                            errors.push(format!(
                                "Failed to record sync of visit {}: {err}",
                                visit.site_name
                            ));
                        }
                    },
                    Err(err) => {
                        failed += 1;
                        self.bump_failed().await;
                        errors.push(format!("Failed to sync visit {}: {err}", visit.site_name));
                    }
                }
            }

            self.set_phase(SyncPhase::Locations).await;
            if let Some(latest) = samples.iter().max_by_key(|s| s.recorded_at) {
                self.set_current("Syncing location data".to_string()).await;
                match self
                    .remote
                    .update_current_location(&self.user_id, &latest.point, latest.recorded_at)
                    .await
                {
                    Ok(()) => {
                        let ids: Vec<String> = samples.iter().map(|s| s.id.clone()).collect();
                        match self.store.mark_locations_synced(&ids).await {
                            Ok(()) => {
                                synced += samples.len() as u32;
                                self.bump_completed_by(samples.len() as u32).await;
                            }
                            Err(err) => {
                                failed += samples.len() as u32;
                                self.bump_failed_by(samples.len() as u32).await;
                                errors.push(format!("Failed to mark locations synced: {err}"));
                            }
                        }
                    }
                    Err(err) => {
                        failed += samples.len() as u32;
                        self.bump_failed_by(samples.len() as u32).await;
                        errors.push(format!("Failed to sync locations: {err}"));
                    }
                }
            }

            self.set_phase(SyncPhase::MutationQueue).await;
            for mutation in &due {
                if mutation.at_retry_ceiling(self.config.max_retries) {
                    tracing::warn!(
                        target: "fieldsync::sync",
                        id = %mutation.id,
                        kind = %mutation.kind,
                        retries = mutation.retry_count,
                        "mutation frozen at retry ceiling, awaiting manual requeue"
                    );
                    continue;
                }

                self.set_current(format!("Replaying {}", mutation.kind)).await;

                if let Err(err) = self.store.mark_mutation_syncing(&mutation.id).await {
                    failed += 1;
                    self.bump_failed().await;
                    errors.push(format!("Failed to lease {}: {err}", mutation.kind));
                    continue;
                }

                if mutation.retry_count > 0 {
                    tokio::time::sleep(self.retry_delay(mutation.retry_count)).await;
                }

                match self.apply_mutation(mutation).await {
                    Ok(()) => match self.store.remove_mutation(&mutation.id).await {
                        Ok(()) => {
                            synced += 1;
                            self.bump_completed().await;
                        }
                        Err(err) => {
                            failed += 1;
                            self.bump_failed().await;
                            errors.push(format!(
                                "Applied {} but failed to dequeue it: {err}",
                                mutation.kind
                            ));
                        }
                    },
                    Err(err) => {
                        failed += 1;
                        self.bump_failed().await;
                        errors.push(format!("Failed to sync {}: {err}", mutation.kind));
                        if let Err(store_err) = self
                            .store
                            .mark_mutation_failed(&mutation.id, &err.to_string())
                            .await
                        {
                            errors.push(format!(
                                "Failed to record failure of {}: {store_err}",
                                mutation.kind
                            ));
                        }
                    }
                }
            }
        }

        Ok(SyncReport {
            synced,
            failed,
            errors,
            duration_ms: started.elapsed().as_millis() as i64,
            finished_at: Utc::now(),
        })
    }

    /// Replay one local snapshot against the remote entry, skipping writes
    /// the remote has already moved past.
    async fn push_visit(&self, visit: &SiteVisitRecord) -> Result<(), AppError> {
        if let Some(status) = self.remote.visit_remote_status(&visit.site_entry_id).await? {
            if is_terminal_or_advanced(&status, visit.status) {
                tracing::info!(
                    target: "fieldsync::sync",
                    site_entry_id = %visit.site_entry_id,
                    remote_status = %status,
                    "remote already ahead, marking local snapshot synced"
                );
                return Ok(());
            }
        }

        match visit.status {
            VisitStatus::Started => {
                self.remote
                    .start_visit(
                        &visit.site_entry_id,
                        visit.started_at,
                        visit.start_location.as_ref(),
                    )
                    .await
            }
            VisitStatus::Completed => {
                self.remote
                    .complete_visit(
                        &visit.site_entry_id,
                        visit.completed_at.unwrap_or(visit.started_at),
                        visit.end_location.as_ref(),
                        visit.notes.as_deref(),
                    )
                    .await
            }
        }
    }

    async fn apply_mutation(&self, mutation: &PendingMutation) -> Result<(), AppError> {
        match mutation.kind {
            MutationKind::VisitStart => {
                let payload: VisitStartPayload = parse_payload(mutation)?;
                self.remote
                    .start_visit(
                        &payload.site_entry_id,
                        payload.started_at,
                        payload.location.as_ref(),
                    )
                    .await
            }
            MutationKind::VisitComplete => {
                let payload: VisitCompletePayload = parse_payload(mutation)?;
                self.remote
                    .complete_visit(
                        &payload.site_entry_id,
                        payload.completed_at,
                        payload.location.as_ref(),
                        payload.notes.as_deref(),
                    )
                    .await?;
                self.credit_completed_visit(&payload).await
            }
            MutationKind::LocationUpdate => {
                let payload: LocationUpdatePayload = parse_payload(mutation)?;
                let point = GeoPoint::new(payload.lat, payload.lng, payload.accuracy);
                self.remote
                    .update_current_location(&payload.user_id, &point, payload.recorded_at)
                    .await
            }
            MutationKind::CostSubmission => {
                let payload: CostSubmissionPayload = parse_payload(mutation)?;
                self.remote
                    .submit_cost(&CostSubmission {
                        user_id: payload.user_id,
                        site_visit_id: payload.site_visit_id,
                        transport_cost: payload.transport_cost,
                        other_costs: payload.other_costs,
                        notes: payload.notes,
                    })
                    .await
            }
            MutationKind::PhotoUpload => {
                let payload: PhotoUploadPayload = parse_payload(mutation)?;
                let content = BASE64.decode(&payload.content_base64).map_err(|err| {
                    AppError::DeserializationError(format!("photo payload: {err}"))
                })?;
                self.remote
                    .upload_photo(&payload.site_entry_id, &payload.file_name, &content)
                    .await
            }
        }
    }

    /// Fee settlement for a completed visit: the ledger insert and wallet
    /// total increment ride in one `credit_wallet` call. The record-sync /
    /// credit crash window is a documented gap, not handled here.
    async fn credit_completed_visit(
        &self,
        payload: &VisitCompletePayload,
    ) -> Result<(), AppError> {
        let fees = self.remote.visit_fees(&payload.site_entry_id).await?;
        let fee = fees.total();
        if fee > 0 {
            self.remote
                .credit_wallet(&payload.user_id, fee, &payload.site_entry_id)
                .await?;
            tracing::info!(
                target: "fieldsync::sync",
                site_entry_id = %payload.site_entry_id,
                fee,
                "wallet credited for completed visit"
            );
        }
        Ok(())
    }

    fn retry_delay(&self, retry_count: u32) -> std::time::Duration {
        let exp = self
            .config
            .base_retry_delay_ms
            .saturating_mul(1u64 << retry_count.min(16));
        std::time::Duration::from_millis(exp.min(self.config.max_retry_delay_ms))
    }

    async fn set_phase(&self, phase: SyncPhase) {
        self.progress.write().await.phase = phase;
    }

    async fn set_current(&self, current: String) {
        self.progress.write().await.current = Some(current);
    }

    async fn bump_completed(&self) {
        self.bump_completed_by(1).await;
    }

    async fn bump_completed_by(&self, count: u32) {
        self.progress.write().await.completed += count;
    }

    async fn bump_failed(&self) {
        self.bump_failed_by(1).await;
    }

    async fn bump_failed_by(&self, count: u32) {
        self.progress.write().await.failed += count;
    }
}

fn parse_payload<T: DeserializeOwned>(mutation: &PendingMutation) -> Result<T, AppError> {
    serde_json::from_value(mutation.payload.clone()).map_err(|err| {
        AppError::DeserializationError(format!("{} payload: {err}", mutation.kind))
    })
}

/// Remote statuses that mean a replayed local write would regress the
/// entry. Formats vary across the fleet; normalize before comparing.
fn is_terminal_or_advanced(status: &str, attempted: VisitStatus) -> bool {
    let normalized: String = status
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    const TERMINAL: [&str; 7] = [
        "completed",
        "cancelled",
        "canceled",
        "rejected",
        "declined",
        "closed",
        "archived",
    ];
    if TERMINAL.contains(&normalized.as_str()) {
        return true;
    }

    match attempted {
        VisitStatus::Started => normalized == "inprogress",
        VisitStatus::Completed => false,
    }
}
