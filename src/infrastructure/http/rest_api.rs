use crate::application::ports::remote_api::{CostSubmission, ReleaseCandidate, RemoteApi, VisitFees};
use crate::domain::value_objects::GeoPoint;
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::time::Duration;

/// REST client against the hosted database. Row filters follow the
/// `?column=eq.value` convention of the remote's REST facade.
pub struct RestRemoteApi {
    client: reqwest::Client,
    base_url: String,
}

impl RestRemoteApi {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn rest(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Network(format!(
            "remote rejected ({}): {}",
            status.as_u16(),
            body
        )))
    }

    async fn patch(&self, url: String, body: Value) -> Result<(), AppError> {
        let response = self.client.patch(url).json(&body).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_rows(&self, url: String) -> Result<Vec<Value>, AppError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        let rows = response.json::<Vec<Value>>().await?;
        Ok(rows)
    }
}

#[async_trait]
impl RemoteApi for RestRemoteApi {
    async fn start_visit(
        &self,
        site_entry_id: &str,
        started_at: DateTime<Utc>,
        location: Option<&GeoPoint>,
    ) -> Result<(), AppError> {
        self.patch(
            self.rest(&format!("site_visits?id=eq.{site_entry_id}")),
            json!({
                "status": "in_progress",
                "visit_started_at": started_at.to_rfc3339(),
                "start_location": location,
            }),
        )
        .await
    }

    async fn complete_visit(
        &self,
        site_entry_id: &str,
        completed_at: DateTime<Utc>,
        location: Option<&GeoPoint>,
        notes: Option<&str>,
    ) -> Result<(), AppError> {
        self.patch(
            self.rest(&format!("site_visits?id=eq.{site_entry_id}")),
            json!({
                "status": "completed",
                "visit_completed_at": completed_at.to_rfc3339(),
                "end_location": location,
                "notes": notes,
            }),
        )
        .await
    }

    async fn visit_remote_status(
        &self,
        site_entry_id: &str,
    ) -> Result<Option<String>, AppError> {
        let rows = self
            .fetch_rows(self.rest(&format!("site_visits?id=eq.{site_entry_id}&select=status")))
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row.get("status"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn visit_fees(&self, site_entry_id: &str) -> Result<VisitFees, AppError> {
        let rows = self
            .fetch_rows(self.rest(&format!(
                "site_visits?id=eq.{site_entry_id}&select=enumerator_fee,transport_fee"
            )))
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("site visit {site_entry_id}")))?;

        Ok(VisitFees {
            enumerator_fee: row.get("enumerator_fee").and_then(Value::as_i64).unwrap_or(0),
            transport_fee: row.get("transport_fee").and_then(Value::as_i64).unwrap_or(0),
        })
    }

    async fn update_current_location(
        &self,
        user_id: &str,
        point: &GeoPoint,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.patch(
            self.rest(&format!("profiles?id=eq.{user_id}")),
            json!({
                "location": {
                    "lat": point.lat,
                    "lng": point.lng,
                    "accuracy": point.accuracy,
                    "last_updated": recorded_at.to_rfc3339(),
                },
            }),
        )
        .await
    }

    async fn submit_cost(&self, submission: &CostSubmission) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.rest("cost_submissions"))
            .json(&json!({
                "user_id": submission.user_id,
                "site_visit_id": submission.site_visit_id,
                "transport_cost": submission.transport_cost,
                "other_costs": submission.other_costs,
                "notes": submission.notes,
                "status": "pending",
            }))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn upload_photo(
        &self,
        site_entry_id: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/storage/v1/object/site-photos/{}/{}",
            self.base_url, site_entry_id, file_name
        );
        let response = self
            .client
            .post(url)
            .header("content-type", "image/jpeg")
            .body(content.to_vec())
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn credit_wallet(
        &self,
        user_id: &str,
        amount: i64,
        reference_id: &str,
    ) -> Result<(), AppError> {
        let rows = self
            .fetch_rows(self.rest(&format!("wallets?user_id=eq.{user_id}&select=id,total_earned")))
            .await?;
        let wallet = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("wallet for user {user_id}")))?;

        let wallet_id = wallet
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::DeserializationError("wallet id missing".to_string()))?
            .to_string();
        let total_earned = wallet.get("total_earned").and_then(Value::as_i64).unwrap_or(0);

        let response = self
            .client
            .post(self.rest("wallet_transactions"))
            .json(&json!({
                "wallet_id": wallet_id,
                "user_id": user_id,
                "type": "earning",
                "amount": amount,
                "description": "Site visit completion (offline sync)",
                "reference_id": reference_id,
                "reference_type": "site_visit",
            }))
            .send()
            .await?;
        Self::ensure_success(response).await?;

        self.patch(
            self.rest(&format!("wallets?id=eq.{wallet_id}")),
            json!({ "total_earned": total_earned + amount }),
        )
        .await
    }

    async fn release_candidates(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReleaseCandidate>, AppError> {
        let rows = self
            .fetch_rows(self.rest(
                "site_visits?select=id,site_name,assigned_to,confirmation_status,confirmation_deadline\
                 &assigned_to=not.is.null&confirmation_status=eq.pending&limit=500",
            ))
            .await?;

        let candidates = rows
            .into_iter()
            .filter_map(|row| {
                let deadline = row
                    .get("confirmation_deadline")
                    .and_then(Value::as_str)
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                    .map(|ts| ts.with_timezone(&Utc))?;
                if deadline > now {
                    return None;
                }
                Some(ReleaseCandidate {
                    site_id: row.get("id").and_then(Value::as_str)?.to_string(),
                    site_name: row
                        .get("site_name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    assigned_to: row.get("assigned_to").and_then(Value::as_str)?.to_string(),
                    deadline,
                })
            })
            .collect();

        Ok(candidates)
    }

    async fn release_claim(&self, site_id: &str) -> Result<(), AppError> {
        self.patch(
            self.rest(&format!("site_visits?id=eq.{site_id}")),
            json!({
                "status": "dispatched",
                "assigned_to": null,
                "assigned_at": null,
                "confirmation_status": "auto_released",
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_endpoint_tolerates_trailing_slash() {
        let api = RestRemoteApi::new(&RemoteConfig {
            base_url: "https://remote.example.org/".to_string(),
            request_timeout: 5,
        })
        .unwrap();

        assert_eq!(
            api.rest("site_visits?id=eq.abc"),
            "https://remote.example.org/rest/v1/site_visits?id=eq.abc"
        );
    }
}
