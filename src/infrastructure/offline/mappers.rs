use crate::domain::entities::{CachedResponse, LocationSample, PendingMutation, SiteVisitRecord};
use crate::domain::entities::site_visit::VisitStatus;
use crate::domain::value_objects::{CacheKey, CacheTier, GeoPoint, MutationId, MutationStatus};
use crate::domain::value_objects::mutation::MutationKind;
use crate::shared::error::AppError;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::rows::{CachedResponseRow, LocationSampleRow, PendingMutationRow, SiteVisitRow};

pub fn mutation_from_row(row: PendingMutationRow) -> Result<PendingMutation, AppError> {
    let id = MutationId::new(row.id).map_err(AppError::ValidationError)?;
    let kind = MutationKind::parse(&row.kind).map_err(AppError::ValidationError)?;
    let status = MutationStatus::parse(&row.status).map_err(AppError::ValidationError)?;
    let payload = serde_json::from_str(&row.payload)
        .map_err(|err| AppError::DeserializationError(err.to_string()))?;

    Ok(PendingMutation {
        id,
        kind,
        payload,
        status,
        retry_count: u32::try_from(row.retry_count.max(0)).unwrap_or(u32::MAX),
        created_at: seconds_to_datetime(row.created_at),
        error_message: row.error_message,
    })
}

pub fn site_visit_from_row(row: SiteVisitRow) -> Result<SiteVisitRecord, AppError> {
    let status = VisitStatus::parse(&row.status).map_err(AppError::ValidationError)?;

    Ok(SiteVisitRecord {
        id: row.id,
        site_entry_id: row.site_entry_id,
        site_name: row.site_name,
        status,
        started_at: seconds_to_datetime(row.started_at),
        completed_at: row.completed_at.map(seconds_to_datetime),
        start_location: parse_point(row.start_location)?,
        end_location: parse_point(row.end_location)?,
        notes: row.notes,
        enumerator_fee: row.enumerator_fee,
        transport_fee: row.transport_fee,
        synced: row.is_synced,
        synced_at: row.synced_at.map(seconds_to_datetime),
    })
}

pub fn location_from_row(row: LocationSampleRow) -> LocationSample {
    LocationSample {
        id: row.id,
        user_id: row.user_id,
        point: GeoPoint::new(row.lat, row.lng, row.accuracy),
        recorded_at: seconds_to_datetime(row.recorded_at),
        synced: row.is_synced,
    }
}

pub fn cached_response_from_row(row: CachedResponseRow) -> Result<CachedResponse, AppError> {
    let key = CacheKey::new(row.cache_key).map_err(AppError::ValidationError)?;
    let tier = CacheTier::parse(&row.tier).map_err(AppError::ValidationError)?;
    let headers: Vec<(String, String)> = serde_json::from_str(&row.headers)
        .map_err(|err| AppError::DeserializationError(err.to_string()))?;
    let status =
        u16::try_from(row.status).map_err(|_| AppError::ValidationError("HTTP status out of range".to_string()))?;

    Ok(CachedResponse {
        key,
        tier,
        url: row.url,
        status,
        headers,
        body: Bytes::from(row.body),
        cached_at: millis_to_datetime(row.cached_at),
        expires_at: millis_to_datetime(row.expires_at),
    })
}

pub fn headers_to_json(headers: &[(String, String)]) -> Result<String, AppError> {
    serde_json::to_string(headers).map_err(|err| AppError::SerializationError(err.to_string()))
}

pub fn seconds_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

pub fn millis_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or_else(Utc::now)
}

fn parse_point(value: Option<String>) -> Result<Option<GeoPoint>, AppError> {
    value
        .map(|json| {
            serde_json::from_str(&json)
                .map_err(|err| AppError::DeserializationError(err.to_string()))
        })
        .transpose()
}
