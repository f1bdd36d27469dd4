//! Community API client.
//!
//! Residents and guards authenticate against the same backend; a 10-digit
//! identifier is a guard phone number, anything else a resident email.
//! All authenticated calls carry the session token as a bearer header.

use caseta_core::{
    GuardWorker, SessionData, VerificationRecord, Visit, VisitDraft, WorkerDraft, WorkerVisit,
};
use chrono::NaiveDateTime;
use serde_json::json;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not logged in")]
    NotAuthenticated,
}

/// Client for the community backend.
pub struct CommunityApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CommunityApi {
    /// Create a client for the given base URL.
    ///
    /// `base_url` should be like `http://192.168.0.40:8080` (no trailing
    /// slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Resume an already-authenticated session.
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn token(&self) -> Result<&str, ApiError> {
        self.token.as_deref().ok_or(ApiError::NotAuthenticated)
    }

    /// Log in, routing by identifier shape, and keep the returned token
    /// for subsequent calls.
    pub async fn login(
        &mut self,
        identifier: &str,
        password: &str,
    ) -> Result<SessionData, ApiError> {
        let route = login_route(identifier);
        let body = if is_phone(identifier) {
            json!({ "phone": identifier, "password": password })
        } else {
            json!({ "email": identifier, "password": password })
        };

        let url = self.url(route);
        info!(url = %url, "logging in");
        let resp = self.client.post(&url).json(&body).send().await?;
        let resp = ok_or_server_error(resp).await?;

        let session: SessionData = resp.json().await?;
        info!(user = %session.username, role = %session.role, "login accepted");
        self.token = Some(session.token.clone());
        Ok(session)
    }

    // ── Resident: visits ──

    pub async fn list_visits(&self) -> Result<Vec<Visit>, ApiError> {
        let url = self.url("/resident/visits");
        info!(url = %url, "fetching visits");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let resp = ok_or_server_error(resp).await?;
        let visits: Vec<Visit> = resp.json().await?;
        info!(count = visits.len(), "fetched visits");
        Ok(visits)
    }

    pub async fn create_visit(&self, draft: &VisitDraft) -> Result<Visit, ApiError> {
        let url = self.url("/resident/visits");
        info!(url = %url, visitor = %draft.visitor_name, "creating visit");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .json(draft)
            .send()
            .await?;
        let resp = ok_or_server_error(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn update_visit(&self, id: i64, draft: &VisitDraft) -> Result<(), ApiError> {
        let url = self.url(&format!("/resident/visit/{id}"));
        info!(url = %url, "updating visit");
        let resp = self
            .client
            .put(&url)
            .bearer_auth(self.token()?)
            .json(draft)
            .send()
            .await?;
        ok_or_server_error(resp).await?;
        Ok(())
    }

    pub async fn delete_visit(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("/resident/visit/{id}"));
        info!(url = %url, "deleting visit");
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        ok_or_server_error(resp).await?;
        Ok(())
    }

    // ── Resident: workers ──

    pub async fn list_workers(&self) -> Result<Vec<WorkerVisit>, ApiError> {
        let url = self.url("/resident/workerVisits");
        info!(url = %url, "fetching workers");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let resp = ok_or_server_error(resp).await?;
        let workers: Vec<WorkerVisit> = resp.json().await?;
        info!(count = workers.len(), "fetched workers");
        Ok(workers)
    }

    /// Register a worker visit. The ID-document photo travels as the
    /// `inePhoto` multipart part, as the backend expects.
    pub async fn register_worker(
        &self,
        draft: &WorkerDraft,
        photo_name: &str,
        photo_bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        let url = self.url("/resident/workerVisits");
        info!(url = %url, worker = %draft.worker_name, "registering worker");

        let photo = reqwest::multipart::Part::bytes(photo_bytes)
            .file_name(photo_name.to_string())
            .mime_str("image/jpeg")?;
        let form = reqwest::multipart::Form::new()
            .text("workerName", draft.worker_name.clone())
            .text("age", draft.age.to_string())
            .text("address", draft.address.clone())
            .text("dateTime", wire_datetime(draft.date_time))
            .part("inePhoto", photo);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .multipart(form)
            .send()
            .await?;
        ok_or_server_error(resp).await?;
        Ok(())
    }

    pub async fn delete_worker(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("/resident/workerVisits/{id}"));
        info!(url = %url, "deleting worker");
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        ok_or_server_error(resp).await?;
        Ok(())
    }

    // ── Guard ──

    pub async fn guard_roster(&self) -> Result<Vec<GuardWorker>, ApiError> {
        let url = self.url("/admin/guards");
        info!(url = %url, "fetching guard roster");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let resp = ok_or_server_error(resp).await?;
        let roster: Vec<GuardWorker> = resp.json().await?;
        info!(count = roster.len(), "fetched roster");
        Ok(roster)
    }

    /// Submit a finished verification record.
    pub async fn submit_verification(
        &self,
        record: &VerificationRecord,
    ) -> Result<(), ApiError> {
        let url = self.url("/guard/verifications");
        info!(
            url = %url,
            visitor = %record.payload.visitor_name,
            status = record.status.as_str(),
            "submitting verification"
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .json(record)
            .send()
            .await?;
        ok_or_server_error(resp).await?;
        Ok(())
    }
}

/// Guards log in with their 10-digit phone number, residents with email.
fn is_phone(identifier: &str) -> bool {
    identifier.len() == 10 && identifier.bytes().all(|b| b.is_ascii_digit())
}

fn login_route(identifier: &str) -> &'static str {
    if is_phone(identifier) {
        "/auth/guard/login"
    } else {
        "/auth/resident/login"
    }
}

/// The backend speaks zone-less local timestamps without fractional seconds.
fn wire_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

async fn ok_or_server_error(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Server {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn client_trims_trailing_slash() {
        let api = CommunityApi::new("http://localhost:8080/".into());
        assert_eq!(api.base_url, "http://localhost:8080");
    }

    #[test]
    fn phone_identifiers_route_to_guard_login() {
        assert_eq!(login_route("5512345678"), "/auth/guard/login");
        assert_eq!(login_route("ana@example.com"), "/auth/resident/login");
        // Nine digits, eleven digits, or mixed text are not phone numbers.
        assert_eq!(login_route("551234567"), "/auth/resident/login");
        assert_eq!(login_route("55123456789"), "/auth/resident/login");
        assert_eq!(login_route("55-1234-678"), "/auth/resident/login");
    }

    #[test]
    fn calls_without_token_fail_before_the_network() {
        let api = CommunityApi::new("http://localhost:8080".into());
        assert!(matches!(api.token(), Err(ApiError::NotAuthenticated)));
        let api = api.with_token("abc".into());
        assert_eq!(api.token().unwrap(), "abc");
    }

    #[test]
    fn wire_datetime_has_no_zone_or_millis() {
        let dt = NaiveDate::from_ymd_opt(2026, 6, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(wire_datetime(dt), "2026-06-03T10:00:00");
    }

    #[test]
    fn visit_array_json_parses() {
        let json = r#"[
            {"id": 1, "visitorName": "Ana", "dateTime": "2026-06-03T10:00:00",
             "numPeople": 2, "vehiclePlate": null, "description": null, "qrCode": null},
            {"id": 2, "visitorName": "Luis", "dateTime": "2026-06-04T16:30:00",
             "qrCode": "data:image/png;base64,iVBORw0KGgo="}
        ]"#;
        let visits: Vec<Visit> = serde_json::from_str(json).unwrap();
        assert_eq!(visits.len(), 2);
        assert!(!visits[0].has_qr());
        assert!(visits[1].has_qr());
    }
}
