use crate::application::ports::offline_store::OfflineStore;
use crate::domain::entities::{
    CachedResponse, LocationDraft, LocationSample, MutationDraft, OfflineStats, PendingMutation,
    SiteVisitDraft, SiteVisitRecord,
};
use crate::domain::value_objects::{CacheKey, MutationId, MutationStatus};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::mappers::{
    cached_response_from_row, headers_to_json, location_from_row, mutation_from_row,
    seconds_to_datetime, site_visit_from_row,
};
use super::rows::{CachedResponseRow, LocationSampleRow, PendingMutationRow, SiteVisitRow};

pub struct SqliteOfflineStore {
    pool: SqlitePool,
}

impl SqliteOfflineStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfflineStore for SqliteOfflineStore {
    async fn enqueue_mutation(&self, draft: MutationDraft) -> Result<PendingMutation, AppError> {
        let id = MutationId::generate();
        let payload = serde_json::to_string(&draft.payload)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;
        let created_at = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO pending_mutations (id, kind, payload, status, retry_count, created_at)
            VALUES (?1, ?2, ?3, 'pending', 0, ?4)
            "#,
        )
        .bind(id.as_str())
        .bind(draft.kind.as_str())
        .bind(&payload)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(PendingMutation {
            id,
            kind: draft.kind,
            payload: draft.payload,
            status: MutationStatus::Pending,
            retry_count: 0,
            created_at: seconds_to_datetime(created_at),
            error_message: None,
        })
    }

    async fn due_mutations(&self) -> Result<Vec<PendingMutation>, AppError> {
        let rows = sqlx::query_as::<_, PendingMutationRow>(
            r#"
            SELECT * FROM pending_mutations
            WHERE status IN ('pending', 'failed')
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(mutation_from_row).collect()
    }

    async fn failed_mutations(&self) -> Result<Vec<PendingMutation>, AppError> {
        let rows = sqlx::query_as::<_, PendingMutationRow>(
            r#"
            SELECT * FROM pending_mutations
            WHERE status = 'failed'
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(mutation_from_row).collect()
    }

    async fn get_mutation(&self, id: &MutationId) -> Result<Option<PendingMutation>, AppError> {
        let row = sqlx::query_as::<_, PendingMutationRow>(
            "SELECT * FROM pending_mutations WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(mutation_from_row).transpose()
    }

    async fn mark_mutation_syncing(&self, id: &MutationId) -> Result<(), AppError> {
        sqlx::query("UPDATE pending_mutations SET status = 'syncing' WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_mutation_failed(&self, id: &MutationId, error: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE pending_mutations
            SET status = 'failed', retry_count = retry_count + 1, error_message = ?1
            WHERE id = ?2
            "#,
        )
        .bind(error)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_mutation(&self, id: &MutationId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM pending_mutations WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn requeue_failed_mutations(&self) -> Result<u32, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE pending_mutations
            SET status = 'pending', retry_count = 0, error_message = NULL
            WHERE status = 'failed'
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() as u32)
    }

    async fn save_site_visit(&self, draft: SiteVisitDraft) -> Result<SiteVisitRecord, AppError> {
        let id = Uuid::new_v4().to_string();
        let start_location = draft
            .start_location
            .map(|p| serde_json::to_string(&p))
            .transpose()
            .map_err(|err| AppError::SerializationError(err.to_string()))?;
        let end_location = draft
            .end_location
            .map(|p| serde_json::to_string(&p))
            .transpose()
            .map_err(|err| AppError::SerializationError(err.to_string()))?;

        // A fresh snapshot supersedes any unsynced one for the same entry;
        // the replacement and insert commit together.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM site_visits WHERE site_entry_id = ?1 AND is_synced = 0")
            .bind(&draft.site_entry_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO site_visits (
                id, site_entry_id, site_name, status, started_at, completed_at,
                start_location, end_location, notes, enumerator_fee, transport_fee,
                is_synced
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)
            "#,
        )
        .bind(&id)
        .bind(&draft.site_entry_id)
        .bind(&draft.site_name)
        .bind(draft.status.as_str())
        .bind(draft.started_at.timestamp())
        .bind(draft.completed_at.map(|ts| ts.timestamp()))
        .bind(&start_location)
        .bind(&end_location)
        .bind(&draft.notes)
        .bind(draft.enumerator_fee)
        .bind(draft.transport_fee)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SiteVisitRecord {
            id,
            site_entry_id: draft.site_entry_id,
            site_name: draft.site_name,
            status: draft.status,
            started_at: seconds_to_datetime(draft.started_at.timestamp()),
            completed_at: draft.completed_at.map(|ts| seconds_to_datetime(ts.timestamp())),
            start_location: draft.start_location,
            end_location: draft.end_location,
            notes: draft.notes,
            enumerator_fee: draft.enumerator_fee,
            transport_fee: draft.transport_fee,
            synced: false,
            synced_at: None,
        })
    }

    async fn unsynced_site_visits(&self) -> Result<Vec<SiteVisitRecord>, AppError> {
        let rows = sqlx::query_as::<_, SiteVisitRow>(
            "SELECT * FROM site_visits WHERE is_synced = 0 ORDER BY started_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(site_visit_from_row).collect()
    }

    async fn site_visit_for_entry(
        &self,
        site_entry_id: &str,
    ) -> Result<Option<SiteVisitRecord>, AppError> {
        // Prefer the unsynced snapshot; fall back to the latest synced one.
        let row = sqlx::query_as::<_, SiteVisitRow>(
            r#"
            SELECT * FROM site_visits
            WHERE site_entry_id = ?1
            ORDER BY is_synced ASC, started_at DESC
            LIMIT 1
            "#,
        )
        .bind(site_entry_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(site_visit_from_row).transpose()
    }

    async fn mark_site_visit_synced(
        &self,
        id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE site_visits SET is_synced = 1, synced_at = ?1 WHERE id = ?2")
            .bind(synced_at.timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_location_sample(&self, draft: LocationDraft) -> Result<LocationSample, AppError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO location_samples (id, user_id, lat, lng, accuracy, recorded_at, is_synced)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
            "#,
        )
        .bind(&id)
        .bind(&draft.user_id)
        .bind(draft.point.lat)
        .bind(draft.point.lng)
        .bind(draft.point.accuracy)
        .bind(draft.recorded_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(LocationSample {
            id,
            user_id: draft.user_id,
            point: draft.point,
            recorded_at: seconds_to_datetime(draft.recorded_at.timestamp()),
            synced: false,
        })
    }

    async fn unsynced_locations(&self, user_id: &str) -> Result<Vec<LocationSample>, AppError> {
        let rows = sqlx::query_as::<_, LocationSampleRow>(
            r#"
            SELECT * FROM location_samples
            WHERE user_id = ?1 AND is_synced = 0
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(location_from_row).collect())
    }

    async fn mark_locations_synced(&self, ids: &[String]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for id in ids {
            sqlx::query("UPDATE location_samples SET is_synced = 1 WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn put_cached_response(&self, entry: &CachedResponse) -> Result<(), AppError> {
        let headers = headers_to_json(&entry.headers)?;

        sqlx::query(
            r#"
            INSERT INTO cached_responses (
                cache_key, tier, url, status, headers, body, cached_at, expires_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(cache_key) DO UPDATE SET
                tier = excluded.tier,
                url = excluded.url,
                status = excluded.status,
                headers = excluded.headers,
                body = excluded.body,
                cached_at = excluded.cached_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(entry.key.as_str())
        .bind(entry.tier.as_str())
        .bind(&entry.url)
        .bind(entry.status as i64)
        .bind(&headers)
        .bind(entry.body.as_ref())
        .bind(entry.cached_at.timestamp_millis())
        .bind(entry.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_cached_response(
        &self,
        key: &CacheKey,
    ) -> Result<Option<CachedResponse>, AppError> {
        let row = sqlx::query_as::<_, CachedResponseRow>(
            "SELECT * FROM cached_responses WHERE cache_key = ?1",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let entry = cached_response_from_row(row)?;
        if entry.is_expired(Utc::now()) {
            sqlx::query("DELETE FROM cached_responses WHERE cache_key = ?1")
                .bind(key.as_str())
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        Ok(Some(entry))
    }

    async fn invalidate_response(&self, key: &CacheKey) -> Result<(), AppError> {
        sqlx::query("DELETE FROM cached_responses WHERE cache_key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn invalidate_url_prefix(&self, prefix: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM cached_responses WHERE url LIKE ?1 || '%'")
            .bind(prefix)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn evict_cached_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM cached_responses WHERE cached_at <= ?1")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_app_state(&self, key: &str, value: serde_json::Value) -> Result<(), AppError> {
        let serialized = serde_json::to_string(&value)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO app_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&serialized)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_app_state(&self, key: &str) -> Result<Option<serde_json::Value>, AppError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM app_state WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(value,)| {
            serde_json::from_str(&value)
                .map_err(|err| AppError::DeserializationError(err.to_string()))
        })
        .transpose()
    }

    async fn stats(&self) -> Result<OfflineStats, AppError> {
        let (pending,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM pending_mutations WHERE status IN ('pending', 'syncing')",
        )
        .fetch_one(&self.pool)
        .await?;

        let (failed,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM pending_mutations WHERE status = 'failed'")
                .fetch_one(&self.pool)
                .await?;

        let (visits,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM site_visits WHERE is_synced = 0")
                .fetch_one(&self.pool)
                .await?;

        let (locations,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM location_samples WHERE is_synced = 0")
                .fetch_one(&self.pool)
                .await?;

        let (cached,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cached_responses")
            .fetch_one(&self.pool)
            .await?;

        Ok(OfflineStats {
            pending_mutations: pending.max(0) as u64,
            failed_mutations: failed.max(0) as u64,
            unsynced_visits: visits.max(0) as u64,
            unsynced_locations: locations.max(0) as u64,
            cached_responses: cached.max(0) as u64,
        })
    }

    async fn clear_all(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for table in [
            "pending_mutations",
            "site_visits",
            "location_samples",
            "cached_responses",
            "app_state",
        ] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
